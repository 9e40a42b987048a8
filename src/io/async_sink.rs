//! Asynchronous file sink for report tables
//!
//! Produces the same files as [`TableSink`](crate::io::TableSink) using
//! `csv-async` over `tokio::fs` files. All tables are written concurrently.

use crate::core::pipeline::PipelineReport;
use crate::io::csv_format::{ReportTables, Table, TableRow};
use crate::io::sink::log_written;
use crate::types::AnalyzerError;
use csv_async::AsyncWriterBuilder;
use futures::io::AsyncWrite;
use std::path::PathBuf;
use tokio_util::compat::TokioAsyncWriteCompatExt;

/// Write one table to an async writer
///
/// # Errors
///
/// Returns [`AnalyzerError::CsvError`] or [`AnalyzerError::IoError`] if a row
/// cannot be serialized or the writer fails.
pub async fn write_table_async<R, W>(rows: &[R], output: W) -> Result<(), AnalyzerError>
where
    R: TableRow,
    W: AsyncWrite + Unpin,
{
    let mut serializer = AsyncWriterBuilder::new()
        .has_headers(false)
        .create_serializer(output);

    serializer.serialize(R::HEADERS).await?;
    for row in rows {
        serializer.serialize(row).await?;
    }
    serializer.flush().await?;

    Ok(())
}

/// Async table sink
#[derive(Debug, Clone)]
pub struct AsyncTableSink {
    output_dir: PathBuf,
    prefix: String,
}

impl AsyncTableSink {
    pub fn new(output_dir: impl Into<PathBuf>, prefix: &str) -> Self {
        Self {
            output_dir: output_dir.into(),
            prefix: prefix.to_string(),
        }
    }

    async fn write_one<R: TableRow>(
        &self,
        table: Table,
        rows: &[R],
    ) -> Result<PathBuf, AnalyzerError> {
        let path = self.output_dir.join(table.file_name(&self.prefix));
        let file = tokio::fs::File::create(&path).await?;
        write_table_async(rows, file.compat_write()).await?;
        log::debug!("Wrote {} rows to {}", rows.len(), path.display());
        Ok(path)
    }

    /// Write every table of the report
    ///
    /// # Returns
    ///
    /// The written file paths, in [`Table::ALL`] order.
    ///
    /// # Errors
    ///
    /// Returns the first error among the table writes.
    pub async fn write_report(
        &self,
        report: &PipelineReport,
    ) -> Result<Vec<PathBuf>, AnalyzerError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let tables = ReportTables::from_report(report);

        let (
            transactions,
            user_analysis,
            category_stats,
            overdrafts,
            at_risk,
            extraction_failures,
            summary,
        ) = futures::try_join!(
            self.write_one(Table::Transactions, &tables.transactions),
            self.write_one(Table::UserAnalysis, &tables.user_analysis),
            self.write_one(Table::CategoryStats, &tables.category_stats),
            self.write_one(Table::Overdrafts, &tables.overdrafts),
            self.write_one(Table::AtRisk, &tables.at_risk),
            self.write_one(Table::ExtractionFailures, &tables.extraction_failures),
            self.write_one(Table::Summary, &tables.summary),
        )?;

        let written = vec![
            transactions,
            user_analysis,
            category_stats,
            overdrafts,
            at_risk,
            extraction_failures,
            summary,
        ];
        log_written(&self.output_dir, &written);
        Ok(written)
    }
}
