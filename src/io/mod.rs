//! I/O module
//!
//! Reads compressed log files and writes report tables.
//!
//! # Components
//!
//! - `line_source` - Recursive `.gz` discovery, decoding and severity filtering
//! - `async_source` - The same source read concurrently with `tokio::fs`
//! - `csv_format` - Table row types and CSV serialization
//! - `sink` - Synchronous table files
//! - `async_sink` - Asynchronous table files via `csv-async`

pub mod async_sink;
pub mod async_source;
pub mod csv_format;
pub mod line_source;
pub mod sink;

pub use async_sink::AsyncTableSink;
pub use async_source::AsyncLineSource;
pub use csv_format::{write_table, ReportTables, Table, TableRow};
pub use line_source::{decode_lines, LineSource, SourceBatch};
pub use sink::TableSink;
