//! docpipe - run CSV and XML files through the four-stage pipeline

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use docpipe::logging::{init_logging, level_for};
use docpipe::{parse_args, run_format, CliArgs, Config, Format, Result};
use glob::Pattern;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

fn main() -> Result<()> {
    let args = parse_args();
    init_logging(level_for(args.debug, args.silent))?;

    if args.inputs.is_empty() {
        print_usage();
        return Ok(());
    }

    // Collected up front, so results written by this run are never picked up as inputs
    let files = collect_files(&args);
    if files.is_empty() {
        warn!("no CSV or XML files found to process");
        return Ok(());
    }

    if args.output.is_some() && files.len() != 1 {
        anyhow::bail!(
            "--output needs exactly one input file, got {}",
            files.len()
        );
    }

    let summary = process_files(&args, &files)?;
    finish(&summary)
}

/// Outcome counts of one run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct RunSummary {
    success: usize,
    failed: usize,
    skipped: usize,
}

/// Run every file through its pipeline, in order
fn process_files(args: &CliArgs, files: &[PathBuf]) -> Result<RunSummary> {
    // An explicit config file applies to every input; otherwise each input
    // discovers its own
    let base_config = match &args.config {
        Some(_) => Some(build_config(args, None)?),
        None => None,
    };

    let inputs: HashSet<PathBuf> = files
        .iter()
        .filter_map(|path| path.canonicalize().ok())
        .collect();
    let mut used_outputs = HashSet::new();
    let mut summary = RunSummary::default();

    for path in files {
        let config = match &base_config {
            Some(config) => config.clone(),
            None => build_config(args, Some(path))?,
        };

        let Some(format) = args.format.or_else(|| Format::from_path(path)) else {
            warn!("skipping {}: unknown format, use --format", path.display());
            summary.skipped += 1;
            continue;
        };

        let output = resolve_output(args, &config, path, format, files.len());
        if output
            .canonicalize()
            .is_ok_and(|resolved| inputs.contains(&resolved))
        {
            error!(
                "refusing to process {}: output {} is one of the inputs",
                path.display(),
                output.display()
            );
            summary.failed += 1;
            continue;
        }
        if !used_outputs.insert(output.clone()) {
            warn!(
                "{} overwrites an earlier result in {}",
                path.display(),
                output.display()
            );
        }

        match run_format(format, &config, path, &output) {
            Ok(report) => {
                summary.success += 1;
                info!(
                    "{} -> {} ({} {})",
                    report.input.display(),
                    report.output.display(),
                    report.items,
                    match report.format {
                        Format::Tabular => "records",
                        Format::Hierarchical => "elements",
                    }
                );
            }
            // Already logged by the pipeline
            Err(_) => summary.failed += 1,
        }
    }

    Ok(summary)
}

/// Log the totals; any failed input makes the run fail
fn finish(summary: &RunSummary) -> Result<()> {
    let RunSummary {
        success,
        failed,
        skipped,
    } = *summary;
    if skipped > 0 {
        warn!("skipped {skipped} files");
    }
    if failed == 0 {
        info!("processed {success} files successfully");
        Ok(())
    } else {
        error!("processed {success} files, {failed} errors");
        anyhow::bail!("{failed} of {} inputs failed", success + failed)
    }
}

/// Build configuration from CLI args and optional config file
///
/// If `for_path` is provided and no explicit config file is specified,
/// uses auto-discovery to find config files in parent directories.
fn build_config(args: &CliArgs, for_path: Option<&Path>) -> Result<Config> {
    let mut config = if let Some(config_path) = &args.config {
        debug!("using explicit config file: {}", config_path.display());
        Config::from_toml_file(config_path)?
    } else {
        let start = match for_path {
            Some(path) => path.to_path_buf(),
            None => std::env::current_dir().unwrap_or_default(),
        };
        let discovered = Config::discover_config_files(&start);
        if discovered.is_empty() {
            debug!("no config files discovered for {}", start.display());
        }
        for f in &discovered {
            debug!("discovered config file: {}", f.display());
        }
        Config::from_discovered_files(&start)
    };

    // Override with CLI arguments
    if let Some(dir) = &args.output_dir {
        config.output_dir = Some(dir.clone());
    }
    if let Some(delimiter) = args.delimiter {
        config.delimiter = delimiter;
    }
    if let Some(indent) = args.xml_indent {
        config.xml_indent = indent;
    }

    debug!("configuration: {config:?}");

    if let Some(error) = config.validate() {
        anyhow::bail!("Invalid configuration: {error}");
    }

    Ok(config)
}

/// Where the result for `input` goes
///
/// `--output` wins; several inputs sharing an output directory get one file
/// per input stem; otherwise the configured fixed name is used.
fn resolve_output(
    args: &CliArgs,
    config: &Config,
    input: &Path,
    format: Format,
    input_count: usize,
) -> PathBuf {
    if let Some(output) = &args.output {
        return output.clone();
    }
    if config.output_dir.is_some() && input_count > 1 {
        if let Some(stem) = input.file_stem() {
            let mut name = stem.to_os_string();
            name.push(".");
            name.push(format.extension());
            return config.output_path(name);
        }
    }
    config.output_path(config.output_name(format))
}

/// Collect all files to process, handling directories and recursive flag
fn collect_files(args: &CliArgs) -> Vec<PathBuf> {
    let exclude_patterns: Vec<Pattern> = args
        .exclude
        .iter()
        .filter_map(|p| match Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!("ignoring invalid exclude pattern {p:?}: {e}");
                None
            }
        })
        .collect();

    let wanted = |path: &Path| {
        path.is_file() && is_data_file(path, args.format) && !is_excluded(path, &exclude_patterns)
    };

    let mut files = Vec::new();

    for input in &args.inputs {
        if input.is_dir() {
            if args.recursive {
                // max_depth prevents runaway traversal in pathological directory structures
                for entry in WalkDir::new(input)
                    .follow_links(true)
                    .max_depth(256)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(std::result::Result::ok)
                {
                    if wanted(entry.path()) {
                        files.push(entry.path().to_path_buf());
                    }
                }
            } else if let Ok(entries) = std::fs::read_dir(input) {
                let mut children: Vec<PathBuf> = entries
                    .filter_map(std::result::Result::ok)
                    .map(|entry| entry.path())
                    .filter(|path| wanted(path.as_path()))
                    .collect();
                children.sort();
                files.extend(children);
            }
        } else if !is_excluded(input, &exclude_patterns) {
            // Explicit files are taken as given; a missing one fails at the read stage
            files.push(input.clone());
        }
    }

    files
}

/// Directory entries are picked up by extension, limited to the forced format if any
fn is_data_file(path: &Path, forced: Option<Format>) -> bool {
    match Format::from_path(path) {
        Some(format) => forced.map_or(true, |f| f == format),
        None => false,
    }
}

/// Check if a path matches any exclusion pattern
fn is_excluded(path: &Path, patterns: &[Pattern]) -> bool {
    if patterns.is_empty() {
        return false;
    }

    let path_str = path.to_string_lossy();

    for pattern in patterns {
        // Match against full path
        if pattern.matches(&path_str) {
            return true;
        }

        // Match against each path component (for directory patterns)
        for component in path.components() {
            if let std::path::Component::Normal(c) = component {
                if pattern.matches(&c.to_string_lossy()) {
                    return true;
                }
            }
        }
    }

    false
}

fn print_usage() {
    println!(
        "docpipe v{} - CSV and XML processing pipeline",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("Usage:");
    println!("  docpipe [OPTIONS] <FILE|DIR>...");
    println!();
    println!("Examples:");
    println!("  docpipe data.csv                  # Writes output.csv");
    println!("  docpipe doc.xml                   # Writes output.xml");
    println!("  docpipe -o clean.csv data.csv     # Choose the output file");
    println!("  docpipe -r -O out/ inputs/        # One output per input in out/");
    println!("  docpipe -t xml feed.rss           # Force the XML handler");
    println!();
    println!("Run `docpipe --help` for all options.");
}
