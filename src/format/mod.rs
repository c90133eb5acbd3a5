//! Format handlers plugged into the processing pipeline.
//!
//! - [`tabular`]: [`TabularHandler`] for comma-separated records
//! - [`hierarchical`]: [`HierarchicalHandler`] for XML trees
//!
//! Both implement [`crate::process::FormatHandler`]; [`run_format`] builds a
//! fresh handler from configuration for callers that pick the format at runtime.

pub mod hierarchical;
pub mod tabular;

use std::path::Path;

pub use hierarchical::HierarchicalHandler;
pub use tabular::TabularHandler;

use crate::config::Config;
use crate::error::PipelineError;
use crate::process::{process_data, Format, PipelineReport};

/// Run the pipeline for `input` with a new handler for `format`, writing to `output`
pub fn run_format(
    format: Format,
    config: &Config,
    input: &Path,
    output: &Path,
) -> Result<PipelineReport, PipelineError> {
    match format {
        Format::Tabular => {
            let handler = TabularHandler::new(output).with_dialect(config.dialect());
            process_data(handler, input)
        }
        Format::Hierarchical => {
            let handler = HierarchicalHandler::new(output).with_indent(config.xml_indent);
            process_data(handler, input)
        }
    }
}
