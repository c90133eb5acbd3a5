//! Template-method processing pipeline.
//!
//! A file goes through four fixed stages:
//!
//! 1. **Read** - load the source file
//! 2. **Parse** - turn the raw input into handler state
//! 3. **Process** - operate on the parsed state
//! 4. **Save** - write the result to the handler's destination
//!
//! [`process_data`] owns the ordering; a [`FormatHandler`] supplies the stages.
//! The handlers for CSV and XML live in [`crate::format`].

pub mod pipeline;

pub use pipeline::{process_data, same_file, Format, FormatHandler, PipelineReport, Saved, Stage};
