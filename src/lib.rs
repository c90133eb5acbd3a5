//! docpipe - Template-method pipeline for CSV and XML files
//!
//! Every input runs through the same four stages (read, parse, process,
//! save); a format handler supplies the stages for its format.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod parser;
pub mod process;

// Re-export commonly used types
pub use cli::{build_cli, parse_args, parse_args_from, CliArgs};
pub use config::Config;
pub use error::{HandlerError, PipelineError, Result};
pub use format::{run_format, HierarchicalHandler, TabularHandler};
pub use process::{process_data, Format, FormatHandler, PipelineReport, Stage};
