//! CSV format handler
//!
//! Reads all records of a comma-separated file, copies them into a
//! [`TabularDataset`], renders each record for inspection and writes the
//! records unchanged to the output file.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::HandlerError;
use crate::parser::{Dialect, Record, TabularDataset};
use crate::process::{Format, FormatHandler, Saved};

/// Default output file name for tabular data
pub const DEFAULT_OUTPUT: &str = "output.csv";

/// Handler for delimiter-separated records
#[derive(Debug, Clone)]
pub struct TabularHandler {
    dialect: Dialect,
    output: PathBuf,
    dataset: Option<TabularDataset>,
    rendered: Vec<String>,
}

impl Default for TabularHandler {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT)
    }
}

impl TabularHandler {
    /// Handler writing to `output` with the default dialect
    #[must_use]
    pub fn new(output: impl Into<PathBuf>) -> Self {
        TabularHandler {
            dialect: Dialect::default(),
            output: output.into(),
            dataset: None,
            rendered: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Records copied in by the parse stage
    #[must_use]
    pub fn dataset(&self) -> Option<&TabularDataset> {
        self.dataset.as_ref()
    }

    /// One line per record, produced by the process stage
    #[must_use]
    pub fn rendered_records(&self) -> &[String] {
        &self.rendered
    }
}

impl FormatHandler for TabularHandler {
    type Raw = Vec<csv::StringRecord>;

    fn format(&self) -> Format {
        Format::Tabular
    }

    fn output(&self) -> &Path {
        &self.output
    }

    fn read_data(&mut self, path: &Path) -> Result<Self::Raw, HandlerError> {
        let raw = self.dialect.read_path(path)?;
        debug!(input = %path.display(), records = raw.len(), "read CSV records");
        Ok(raw)
    }

    fn parse_data(&mut self, raw: Self::Raw) -> Result<(), HandlerError> {
        let dataset: TabularDataset = raw.iter().map(Record::from).collect();
        debug!(records = dataset.len(), "parsed CSV records");
        self.dataset = Some(dataset);
        Ok(())
    }

    fn process_parsed_data(&mut self) -> Result<(), HandlerError> {
        let dataset = self.dataset.as_ref().ok_or(HandlerError::MissingDataset)?;
        self.rendered = dataset
            .records()
            .iter()
            .map(|record| {
                let line = record.to_string();
                info!("CSV record: {line}");
                line
            })
            .collect();
        Ok(())
    }

    fn save_data(&mut self) -> Result<Saved, HandlerError> {
        let dataset = self.dataset.as_ref().ok_or(HandlerError::MissingDataset)?;
        self.dialect.write_path(&self.output, dataset.records())?;
        debug!(output = %self.output.display(), records = dataset.len(), "wrote CSV records");
        Ok(Saved {
            path: self.output.clone(),
            items: dataset.len(),
        })
    }
}
