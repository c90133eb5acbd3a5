//! Four-stage processing pipeline
//!
//! Every format runs the same fixed sequence:
//! - Stage 1: Read the source file
//! - Stage 2: Parse the raw data into handler state
//! - Stage 3: Process the parsed data
//! - Stage 4: Save the result
//!
//! The sequence lives in [`process_data`]; formats only supply the stages.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::error::{HandlerError, PipelineError};

/// Pipeline stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Read,
    Parse,
    Process,
    Save,
}

impl Stage {
    /// All stages, in the order [`process_data`] runs them
    pub const ALL: [Stage; 4] = [Stage::Read, Stage::Parse, Stage::Process, Stage::Save];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Read => "read",
            Stage::Parse => "parse",
            Stage::Process => "process",
            Stage::Save => "save",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data formats with a handler implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Delimiter-separated records (CSV)
    Tabular,
    /// Tree-structured markup (XML)
    Hierarchical,
}

impl Format {
    /// Conventional file extension for the format
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Format::Tabular => "csv",
            Format::Hierarchical => "xml",
        }
    }

    /// Map a file extension to a format (case-insensitive)
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Format::Tabular),
            "xml" => Some(Format::Hierarchical),
            _ => None,
        }
    }

    /// Format for a path, judged by its extension
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Tabular => f.write_str("CSV"),
            Format::Hierarchical => f.write_str("XML"),
        }
    }
}

/// Where a handler wrote its result and how much it wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Saved {
    pub path: PathBuf,
    /// Records for tabular data, elements for markup
    pub items: usize,
}

/// The four stages a format supplies to the pipeline.
///
/// A handler carries state from one stage to the next and is consumed by
/// [`process_data`], so one instance never sees more than one file.
pub trait FormatHandler {
    /// Value handed from `read_data` to `parse_data`
    type Raw;

    /// Format this handler implements
    fn format(&self) -> Format;

    /// File the save stage writes to
    fn output(&self) -> &Path;

    /// Load the source file
    fn read_data(&mut self, path: &Path) -> Result<Self::Raw, HandlerError>;

    /// Turn the raw value into handler state
    fn parse_data(&mut self, raw: Self::Raw) -> Result<(), HandlerError>;

    /// Operate on the parsed state
    fn process_parsed_data(&mut self) -> Result<(), HandlerError>;

    /// Write the processed state to the handler's destination
    fn save_data(&mut self) -> Result<Saved, HandlerError>;
}

/// Summary of one successful pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub format: Format,
    pub input: PathBuf,
    pub output: PathBuf,
    pub items: usize,
    /// Stages that ran, in order
    pub stages: Vec<Stage>,
}

/// True when `a` and `b` name the same existing file
#[must_use]
pub fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Run the four stages of `handler` against `path`.
///
/// The first failing stage stops the run; its error is logged and returned
/// together with the stage name. Later stages are not called.
///
/// A handler whose output is `path` itself is refused before any stage runs;
/// the error is reported against the save stage.
pub fn process_data<H: FormatHandler>(
    mut handler: H,
    path: &Path,
) -> Result<PipelineReport, PipelineError> {
    let format = handler.format();
    let mut stages = Vec::with_capacity(Stage::ALL.len());
    info!(%format, input = %path.display(), "processing data");

    let fail = |stage: Stage, source: HandlerError| {
        error!(%format, %stage, input = %path.display(), error = %source, "stage failed");
        PipelineError {
            stage,
            format,
            input: path.to_path_buf(),
            source,
        }
    };

    if same_file(path, handler.output()) {
        return Err(fail(Stage::Save, HandlerError::output_is_input(path)));
    }

    info!(%format, stage = %Stage::Read, input = %path.display(), "reading data");
    let raw = handler
        .read_data(path)
        .map_err(|e| fail(Stage::Read, e))?;
    stages.push(Stage::Read);

    info!(%format, stage = %Stage::Parse, "parsing data");
    handler.parse_data(raw).map_err(|e| fail(Stage::Parse, e))?;
    stages.push(Stage::Parse);

    info!(%format, stage = %Stage::Process, "processing parsed data");
    handler
        .process_parsed_data()
        .map_err(|e| fail(Stage::Process, e))?;
    stages.push(Stage::Process);

    info!(%format, stage = %Stage::Save, "saving processed data");
    let saved = handler.save_data().map_err(|e| fail(Stage::Save, e))?;
    stages.push(Stage::Save);

    debug!(%format, output = %saved.path.display(), items = saved.items, "pipeline complete");

    Ok(PipelineReport {
        format,
        input: path.to_path_buf(),
        output: saved.path,
        items: saved.items,
        stages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records every stage call and fails at a chosen stage
    struct Recorder {
        calls: Rc<RefCell<Vec<Stage>>>,
        fail_at: Option<Stage>,
        output: PathBuf,
    }

    impl Recorder {
        fn new(fail_at: Option<Stage>) -> (Self, Rc<RefCell<Vec<Stage>>>) {
            let calls = Rc::new(RefCell::new(Vec::new()));
            (
                Recorder {
                    calls: Rc::clone(&calls),
                    fail_at,
                    output: PathBuf::from("out"),
                },
                calls,
            )
        }

        fn visit(&self, stage: Stage) -> Result<(), HandlerError> {
            self.calls.borrow_mut().push(stage);
            if self.fail_at == Some(stage) {
                return Err(HandlerError::MissingDataset);
            }
            Ok(())
        }
    }

    impl FormatHandler for Recorder {
        type Raw = u32;

        fn format(&self) -> Format {
            Format::Tabular
        }

        fn output(&self) -> &Path {
            &self.output
        }

        fn read_data(&mut self, _path: &Path) -> Result<u32, HandlerError> {
            self.visit(Stage::Read)?;
            Ok(7)
        }

        fn parse_data(&mut self, raw: u32) -> Result<(), HandlerError> {
            assert_eq!(raw, 7);
            self.visit(Stage::Parse)
        }

        fn process_parsed_data(&mut self) -> Result<(), HandlerError> {
            self.visit(Stage::Process)
        }

        fn save_data(&mut self) -> Result<Saved, HandlerError> {
            self.visit(Stage::Save)?;
            Ok(Saved {
                path: self.output.clone(),
                items: 3,
            })
        }
    }

    #[test]
    fn test_stages_run_in_order() {
        let (handler, calls) = Recorder::new(None);
        let report = process_data(handler, Path::new("in")).unwrap();

        assert_eq!(*calls.borrow(), Stage::ALL.to_vec());
        assert_eq!(report.stages, Stage::ALL.to_vec());
        assert_eq!(report.output, PathBuf::from("out"));
        assert_eq!(report.items, 3);
        assert_eq!(report.input, PathBuf::from("in"));
    }

    #[test]
    fn test_failure_aborts_remaining_stages() {
        for (idx, stage) in Stage::ALL.iter().enumerate() {
            let (handler, calls) = Recorder::new(Some(*stage));
            let err = process_data(handler, Path::new("in")).unwrap_err();

            assert_eq!(err.stage, *stage);
            assert_eq!(err.format, Format::Tabular);
            assert_eq!(*calls.borrow(), Stage::ALL[..=idx].to_vec());
        }
    }

    #[test]
    fn test_output_same_as_input_is_refused() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().join("data.csv");
        std::fs::write(&input, "a\n").unwrap();

        let (mut handler, calls) = Recorder::new(None);
        // Same file reached through a different spelling
        handler.output = dir.path().join(".").join("data.csv");
        let err = process_data(handler, &input).unwrap_err();

        assert_eq!(err.stage, Stage::Save);
        assert!(matches!(err.source, HandlerError::OutputIsInput { .. }));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_same_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let a = dir.path().join("a.xml");
        std::fs::write(&a, "<a/>").unwrap();

        assert!(same_file(&a, &dir.path().join(".").join("a.xml")));
        assert!(!same_file(&a, &dir.path().join("b.xml")));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(Format::from_extension("csv"), Some(Format::Tabular));
        assert_eq!(Format::from_extension("CSV"), Some(Format::Tabular));
        assert_eq!(Format::from_extension("xml"), Some(Format::Hierarchical));
        assert_eq!(Format::from_extension("json"), None);
        assert_eq!(
            Format::from_path(Path::new("dir/data.Xml")),
            Some(Format::Hierarchical)
        );
        assert_eq!(Format::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_stage_names() {
        let names: Vec<String> = Stage::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["read", "parse", "process", "save"]);
    }
}
