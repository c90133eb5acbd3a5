//! Command-line interface for docpipe.
//!
//! Defines CLI arguments using clap builder API

use std::path::PathBuf;

use clap::{Arg, ArgAction, Command};

use crate::process::Format;

/// CLI arguments parsed from command line
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Files or directories to process
    pub inputs: Vec<PathBuf>,

    /// Handler forced for every input (otherwise chosen by extension)
    pub format: Option<Format>,

    /// Output file, only valid with a single input
    pub output: Option<PathBuf>,

    /// Directory for output files
    pub output_dir: Option<PathBuf>,

    /// Tabular field delimiter
    pub delimiter: Option<char>,

    /// Pretty-print indentation for markup
    pub xml_indent: Option<usize>,

    /// Config file path
    pub config: Option<PathBuf>,

    /// Recursive directory processing
    pub recursive: bool,

    /// Exclude patterns for files/directories (glob patterns)
    pub exclude: Vec<String>,

    /// Enable debug output
    pub debug: bool,

    /// Silent mode (errors only)
    pub silent: bool,
}

fn parse_format(value: &str) -> Result<Format, String> {
    match value.to_ascii_lowercase().as_str() {
        "csv" | "tabular" => Ok(Format::Tabular),
        "xml" | "hierarchical" => Ok(Format::Hierarchical),
        other => Err(format!("unknown format '{other}' (expected csv or xml)")),
    }
}

fn parse_delimiter(value: &str) -> Result<char, String> {
    if value == "\\t" {
        return Ok('\t');
    }
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(format!("delimiter must be a single character, got '{value}'")),
    }
}

/// Build the clap Command for parsing CLI arguments
#[must_use]
pub fn build_cli() -> Command {
    Command::new("docpipe")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Read, parse, process and save CSV and XML files")
        .arg(
            Arg::new("inputs")
                .help("Files or directories to process")
                .value_name("FILE")
                .num_args(1..)
                .required(false)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("format")
                .short('t')
                .long("format")
                .help("Handler for all inputs: csv or xml [default: by file extension]")
                .value_name("FORMAT")
                .value_parser(parse_format),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Output file (single input only)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("output-dir")
                .short('O')
                .long("output-dir")
                .help("Directory for output files")
                .value_name("DIR")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("delimiter")
                .short('d')
                .long("delimiter")
                .help("Tabular field delimiter, '\\t' for tab [default: ,]")
                .value_name("CHAR")
                .value_parser(parse_delimiter),
        )
        .arg(
            Arg::new("xml-indent")
                .long("xml-indent")
                .help("Spaces per level in XML output [default: 2]")
                .value_name("NUM")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("recursive")
                .short('r')
                .long("recursive")
                .help("Process directories recursively")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("exclude")
                .short('e')
                .long("exclude")
                .help("Exclude files/directories matching glob pattern (can be repeated)")
                .value_name("PATTERN")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Config file path (overrides auto-discovery)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("debug")
                .short('D')
                .long("debug")
                .help("Enable debug output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("silent")
                .short('S')
                .long("silent")
                .help("Only report errors")
                .action(ArgAction::SetTrue)
                .conflicts_with("debug"),
        )
}

/// Parse CLI arguments from command line
#[must_use]
pub fn parse_args() -> CliArgs {
    args_from_matches(&build_cli().get_matches())
}

/// Parse CLI arguments from an iterator (for testing)
#[must_use]
pub fn parse_args_from<I, T>(args: I) -> CliArgs
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    args_from_matches(&build_cli().get_matches_from(args))
}

/// Convert clap `ArgMatches` to `CliArgs`
fn args_from_matches(matches: &clap::ArgMatches) -> CliArgs {
    CliArgs {
        inputs: matches
            .get_many::<PathBuf>("inputs")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default(),
        format: matches.get_one::<Format>("format").copied(),
        output: matches.get_one::<PathBuf>("output").cloned(),
        output_dir: matches.get_one::<PathBuf>("output-dir").cloned(),
        delimiter: matches.get_one::<char>("delimiter").copied(),
        xml_indent: matches.get_one::<usize>("xml-indent").copied(),
        config: matches.get_one::<PathBuf>("config").cloned(),
        recursive: matches.get_flag("recursive"),
        exclude: matches
            .get_many::<String>("exclude")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default(),
        debug: matches.get_flag("debug"),
        silent: matches.get_flag("silent"),
    }
}
