//! XML format handler
//!
//! The tree is built while reading, so `read_data` hands nothing on to
//! `parse_data`; the parse stage renders the stored tree for inspection
//! instead. The process stage is an empty hook.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::HandlerError;
use crate::parser::markup::{self, Element};
use crate::process::{Format, FormatHandler, Saved};

/// Default output file name for markup
pub const DEFAULT_OUTPUT: &str = "output.xml";

/// Default pretty-print indentation (spaces per level)
pub const DEFAULT_INDENT: usize = 2;

/// Handler for tree-structured markup
#[derive(Debug, Clone)]
pub struct HierarchicalHandler {
    indent: usize,
    output: PathBuf,
    root: Option<Element>,
    rendered: Option<String>,
}

impl Default for HierarchicalHandler {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT)
    }
}

impl HierarchicalHandler {
    #[must_use]
    pub fn new(output: impl Into<PathBuf>) -> Self {
        HierarchicalHandler {
            indent: DEFAULT_INDENT,
            output: output.into(),
            root: None,
            rendered: None,
        }
    }

    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Root element stored by the read stage
    #[must_use]
    pub fn root(&self) -> Option<&Element> {
        self.root.as_ref()
    }

    /// Pretty-printed markup produced by the parse stage
    #[must_use]
    pub fn rendered(&self) -> Option<&str> {
        self.rendered.as_deref()
    }
}

impl FormatHandler for HierarchicalHandler {
    type Raw = ();

    fn format(&self) -> Format {
        Format::Hierarchical
    }

    fn output(&self) -> &Path {
        &self.output
    }

    fn read_data(&mut self, path: &Path) -> Result<(), HandlerError> {
        self.root = None;
        let root = markup::parse_path(path)?;
        debug!(input = %path.display(), root = %root.name, "read XML tree");
        self.root = Some(root);
        Ok(())
    }

    fn parse_data(&mut self, (): ()) -> Result<(), HandlerError> {
        let Some(root) = self.root.as_ref() else {
            warn!("no XML tree loaded, nothing to render");
            return Ok(());
        };
        let text = markup::to_pretty_string(root, self.indent);
        info!("XML data:\n{text}");
        self.rendered = Some(text);
        Ok(())
    }

    /// Extension point: the tree is saved as read.
    fn process_parsed_data(&mut self) -> Result<(), HandlerError> {
        Ok(())
    }

    fn save_data(&mut self) -> Result<Saved, HandlerError> {
        let root = self.root.as_ref().ok_or(HandlerError::MissingDocument)?;
        let file = File::create(&self.output).map_err(|e| HandlerError::io(&self.output, e))?;
        markup::write_pretty(BufWriter::new(file), root, self.indent)
            .map_err(|e| HandlerError::io(&self.output, e))?;
        let items = root.element_count();
        debug!(output = %self.output.display(), elements = items, "wrote XML tree");
        Ok(Saved {
            path: self.output.clone(),
            items,
        })
    }
}
