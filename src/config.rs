//! Configuration management for docpipe.
//!
//! This module provides the [`Config`] struct which controls where results are
//! written and how the two formats are read and written.
//! Configuration can be loaded from:
//! - TOML files (`docpipe.toml`)
//! - CLI arguments (which override file settings)
//!
//! Config files are auto-discovered by searching parent directories from the file
//! being processed up to the filesystem root, plus the user's home directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::format::{hierarchical, tabular};
use crate::parser::Dialect;
use crate::process::Format;

/// Config file names to search for (in order of priority, later overrides earlier)
const CONFIG_FILE_NAMES: &[&str] = &["docpipe.toml"];

/// Get the user's home directory
fn dirs_home() -> Option<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home));
    }
    // Fallback for Windows
    if let Ok(userprofile) = std::env::var("USERPROFILE") {
        return Some(PathBuf::from(userprofile));
    }
    None
}

// Serde default functions
fn default_csv_output() -> String {
    tabular::DEFAULT_OUTPUT.to_string()
}
fn default_xml_output() -> String {
    hierarchical::DEFAULT_OUTPUT.to_string()
}
fn default_delimiter() -> char {
    ','
}
fn default_xml_indent() -> usize {
    hierarchical::DEFAULT_INDENT
}

/// Main configuration struct for docpipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory output files are written to (default: current directory)
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// File name for tabular output (default: output.csv)
    #[serde(default = "default_csv_output")]
    pub csv_output: String,

    /// File name for markup output (default: output.xml)
    #[serde(default = "default_xml_output")]
    pub xml_output: String,

    /// Field delimiter for tabular input and output (default: ',')
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Spaces per level when pretty-printing markup (default: 2)
    #[serde(default = "default_xml_indent")]
    pub xml_indent: usize,
}

/// Partial configuration for TOML parsing
///
/// All fields are `Option<T>` so we can distinguish between
/// "explicitly set" and "not specified" when merging configs.
#[derive(Debug, Clone, Default, Deserialize)]
struct PartialConfig {
    pub output_dir: Option<PathBuf>,
    pub csv_output: Option<String>,
    pub xml_output: Option<String>,
    pub delimiter: Option<char>,
    pub xml_indent: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            output_dir: None,
            csv_output: default_csv_output(),
            xml_output: default_xml_output(),
            delimiter: default_delimiter(),
            xml_indent: default_xml_indent(),
        }
    }
}

impl Config {
    /// Maximum pretty-print indentation
    const MAX_XML_INDENT: usize = 16;

    /// Validate configuration values
    ///
    /// Returns an error message if validation fails, None if valid.
    #[must_use]
    pub fn validate(&self) -> Option<String> {
        if !self.delimiter.is_ascii() || matches!(self.delimiter, '"' | '\r' | '\n') {
            return Some(format!(
                "delimiter {:?} must be a single ASCII character other than a quote or line break",
                self.delimiter
            ));
        }
        for (key, name) in [("csv_output", &self.csv_output), ("xml_output", &self.xml_output)] {
            if name.is_empty() {
                return Some(format!("{key} must not be empty"));
            }
            if name.contains(['/', '\\']) {
                return Some(format!(
                    "{key} {name:?} must be a file name, use output_dir for the directory"
                ));
            }
        }
        if self.xml_indent > Self::MAX_XML_INDENT {
            return Some(format!(
                "xml_indent {} exceeds maximum of {}",
                self.xml_indent,
                Self::MAX_XML_INDENT
            ));
        }
        None
    }

    /// Tabular dialect built from the configured delimiter
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        // validate() restricts the delimiter to ASCII
        let delimiter = u8::try_from(self.delimiter).unwrap_or(b',');
        Dialect {
            delimiter,
            ..Dialect::default()
        }
    }

    /// Configured output file name for `format`
    #[must_use]
    pub fn output_name(&self, format: Format) -> &str {
        match format {
            Format::Tabular => &self.csv_output,
            Format::Hierarchical => &self.xml_output,
        }
    }

    /// Resolve `name` against the output directory
    #[must_use]
    pub fn output_path(&self, name: impl AsRef<Path>) -> PathBuf {
        match &self.output_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name.as_ref()),
        }
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let partial: PartialConfig = toml::from_str(&contents)?;
        let mut config = Self::default();
        config.apply_partial(&partial);
        Ok(config)
    }

    /// Apply a partial config, only overriding fields that are explicitly set
    fn apply_partial(&mut self, partial: &PartialConfig) {
        if let Some(v) = &partial.output_dir {
            self.output_dir = Some(v.clone());
        }
        if let Some(v) = &partial.csv_output {
            self.csv_output.clone_from(v);
        }
        if let Some(v) = &partial.xml_output {
            self.xml_output.clone_from(v);
        }
        if let Some(v) = partial.delimiter {
            self.delimiter = v;
        }
        if let Some(v) = partial.xml_indent {
            self.xml_indent = v;
        }
    }

    /// Discover config files from the home directory and parent directories
    ///
    /// Returns paths ordered from least to most specific.
    #[must_use]
    pub fn discover_config_files(start_path: &Path) -> Vec<PathBuf> {
        let mut config_files = Vec::new();

        // Home directory config first (lowest priority)
        if let Some(home) = dirs_home() {
            for config_name in CONFIG_FILE_NAMES {
                let home_config = home.join(config_name);
                if home_config.is_file() {
                    config_files.push(home_config);
                }
            }
        }

        let start_dir = if start_path.is_file() {
            start_path.parent().map(Path::to_path_buf)
        } else if start_path.is_dir() {
            Some(start_path.to_path_buf())
        } else {
            std::env::current_dir().ok()
        };

        if let Some(dir) = start_dir {
            let mut ancestors: Vec<PathBuf> = dir.ancestors().map(Path::to_path_buf).collect();
            // Root first, so closer configs override
            ancestors.reverse();

            for ancestor in ancestors {
                for config_name in CONFIG_FILE_NAMES {
                    let config_path = ancestor.join(config_name);
                    if config_path.is_file() && !config_files.contains(&config_path) {
                        config_files.push(config_path);
                    }
                }
            }
        }

        config_files
    }

    /// Load and merge configuration from discovered config files
    ///
    /// Later files override earlier ones (only explicitly set values).
    /// Unreadable or invalid files are skipped with a warning.
    #[must_use]
    pub fn from_discovered_files(start_path: &Path) -> Self {
        let mut config = Self::default();
        for path in Self::discover_config_files(start_path) {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<PartialConfig>(&contents) {
                    Ok(partial) => config.apply_partial(&partial),
                    Err(e) => warn!("failed to parse {}: {e}", path.display()),
                },
                Err(e) => warn!("failed to read {}: {e}", path.display()),
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.csv_output, "output.csv");
        assert_eq!(config.xml_output, "output.xml");
        assert_eq!(config.delimiter, ',');
        assert_eq!(config.xml_indent, 2);
        assert!(config.output_dir.is_none());
    }

    #[test]
    fn test_output_paths() {
        let mut config = Config::default();
        assert_eq!(
            config.output_path(config.output_name(Format::Tabular)),
            PathBuf::from("output.csv")
        );

        config.output_dir = Some(PathBuf::from("out"));
        assert_eq!(
            config.output_path(config.output_name(Format::Hierarchical)),
            PathBuf::from("out").join("output.xml")
        );
    }

    #[test]
    fn test_dialect_from_delimiter() {
        let config = Config {
            delimiter: ';',
            ..Default::default()
        };
        assert_eq!(config.dialect().delimiter, b';');
        assert_eq!(config.dialect().quote, b'"');
    }

    #[test]
    fn test_config_apply_partial() {
        let mut base = Config::default();

        let partial = PartialConfig {
            delimiter: Some('\t'),
            xml_indent: Some(4),
            ..Default::default()
        };

        base.apply_partial(&partial);
        assert_eq!(base.delimiter, '\t');
        assert_eq!(base.xml_indent, 4);
        // Other fields should remain at defaults
        assert_eq!(base.csv_output, "output.csv");
        assert!(base.output_dir.is_none());
    }

    #[test]
    fn test_config_apply_partial_preserves_unset() {
        let mut base = Config {
            csv_output: "records.csv".to_string(),
            ..Default::default()
        };

        let partial = PartialConfig {
            xml_output: Some("tree.xml".to_string()),
            ..Default::default()
        };

        base.apply_partial(&partial);
        assert_eq!(base.csv_output, "records.csv");
        assert_eq!(base.xml_output, "tree.xml");
    }

    #[test]
    fn test_from_toml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("docpipe.toml");
        std::fs::write(
            &path,
            "output_dir = \"results\"\ndelimiter = \"|\"\nxml_indent = 3\n",
        )
        .unwrap();

        let config = Config::from_toml_file(&path).unwrap();
        assert_eq!(config.output_dir, Some(PathBuf::from("results")));
        assert_eq!(config.delimiter, '|');
        assert_eq!(config.xml_indent, 3);
        assert_eq!(config.xml_output, "output.xml");
    }

    #[test]
    fn test_from_toml_file_rejects_bad_types() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("docpipe.toml");
        std::fs::write(&path, "xml_indent = \"wide\"\n").unwrap();
        assert!(Config::from_toml_file(&path).is_err());
    }

    #[test]
    fn test_discovered_files_merge_closest_last() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            dir.path().join("docpipe.toml"),
            "delimiter = \";\"\nxml_indent = 4\n",
        )
        .unwrap();
        std::fs::write(nested.join("docpipe.toml"), "xml_indent = 8\n").unwrap();
        let input = nested.join("data.csv");
        std::fs::write(&input, "x\n").unwrap();

        let found = Config::discover_config_files(&input);
        let outer = found
            .iter()
            .position(|p| p == &dir.path().join("docpipe.toml"))
            .unwrap();
        let inner = found
            .iter()
            .position(|p| p == &nested.join("docpipe.toml"))
            .unwrap();
        assert!(outer < inner);

        let config = Config::from_discovered_files(&input);
        assert_eq!(config.delimiter, ';');
        assert_eq!(config.xml_indent, 8);
    }

    #[test]
    fn test_validate_default_config() {
        assert!(
            Config::default().validate().is_none(),
            "Default config should be valid"
        );
    }

    #[test]
    fn test_validate_delimiter() {
        for delimiter in ['"', '\n', 'é'] {
            let config = Config {
                delimiter,
                ..Default::default()
            };
            assert!(config.validate().unwrap().contains("delimiter"));
        }
        let tab = Config {
            delimiter: '\t',
            ..Default::default()
        };
        assert!(tab.validate().is_none());
    }

    #[test]
    fn test_validate_output_names() {
        let config = Config {
            csv_output: String::new(),
            ..Default::default()
        };
        assert!(config.validate().unwrap().contains("csv_output"));

        let config = Config {
            xml_output: "dir/out.xml".to_string(),
            ..Default::default()
        };
        assert!(config.validate().unwrap().contains("xml_output"));
    }

    #[test]
    fn test_validate_xml_indent() {
        let config = Config {
            xml_indent: 40,
            ..Default::default()
        };
        assert!(config.validate().unwrap().contains("xml_indent"));
    }
}
