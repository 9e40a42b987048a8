//! File sink for report tables
//!
//! Writes every table of a [`PipelineReport`] as `{prefix}_{table}.csv` into an
//! output directory, creating the directory when it does not exist.

use crate::core::pipeline::PipelineReport;
use crate::io::csv_format::{write_table, ReportTables, Table, TableRow};
use crate::types::AnalyzerError;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Synchronous table sink
#[derive(Debug, Clone)]
pub struct TableSink {
    output_dir: PathBuf,
    prefix: String,
}

impl TableSink {
    pub fn new(output_dir: impl Into<PathBuf>, prefix: &str) -> Self {
        Self {
            output_dir: output_dir.into(),
            prefix: prefix.to_string(),
        }
    }

    /// Path of one table's file
    pub fn table_path(&self, table: Table) -> PathBuf {
        self.output_dir.join(table.file_name(&self.prefix))
    }

    fn write_one<R: TableRow>(&self, table: Table, rows: &[R]) -> Result<PathBuf, AnalyzerError> {
        let path = self.table_path(table);
        let mut writer = BufWriter::new(File::create(&path)?);
        write_table(rows, &mut writer)?;
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
    /// Returns an error if the directory cannot be created or a table cannot be
    /// written.
    pub fn write_report(&self, report: &PipelineReport) -> Result<Vec<PathBuf>, AnalyzerError> {
        fs::create_dir_all(&self.output_dir)?;
        let tables = ReportTables::from_report(report);

        let written = vec![
            self.write_one(Table::Transactions, &tables.transactions)?,
            self.write_one(Table::UserAnalysis, &tables.user_analysis)?,
            self.write_one(Table::CategoryStats, &tables.category_stats)?,
            self.write_one(Table::Overdrafts, &tables.overdrafts)?,
            self.write_one(Table::AtRisk, &tables.at_risk)?,
            self.write_one(Table::ExtractionFailures, &tables.extraction_failures)?,
            self.write_one(Table::Summary, &tables.summary)?,
        ];

        log_written(&self.output_dir, &written);
        Ok(written)
    }
}

/// Log where the tables went
pub(crate) fn log_written(output_dir: &Path, written: &[PathBuf]) {
    log::info!("Wrote {} tables to {}", written.len(), output_dir.display());
    for path in written {
        log::info!("   {}", path.display());
    }
}
