//! Configuration types for site spec loading.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from a
//! TOML file; every section is optional and falls back to its default.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining parser and output settings.
//! - [`ParserConfig`] - Controls how strictly non-fatal findings are treated.
//! - [`OutputConfig`] - Controls the format of the IR dump.
//!
//! # Example
//!
//! ```
//! # use sitespec::config::{AppConfig, OutputFormat};
//! let config = AppConfig::default();
//! assert!(!config.parser().strict());
//! assert_eq!(config.output().format(), OutputFormat::Text);
//! ```

use std::{fmt, str::FromStr};

use serde::Deserialize;

use sitespec_parser::BuildConfig;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Parser configuration section.
    #[serde(default)]
    parser: ParserConfig,

    /// Output configuration section.
    #[serde(default)]
    output: OutputConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the specified sections.
    pub fn new(parser: ParserConfig, output: OutputConfig) -> Self {
        Self { parser, output }
    }

    /// Returns the parser configuration.
    pub fn parser(&self) -> &ParserConfig {
        &self.parser
    }

    /// Returns the output configuration.
    pub fn output(&self) -> &OutputConfig {
        &self.output
    }

    /// Returns a copy with the output format replaced.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.output.format = format;
        self
    }
}

/// Parser settings.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ParserConfig {
    /// Promote every warning to an error.
    #[serde(default)]
    strict: bool,
}

impl ParserConfig {
    /// Creates a new [`ParserConfig`].
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    /// Returns `true` if warnings fail the build.
    pub fn strict(&self) -> bool {
        self.strict
    }

    /// The configuration handed to the parser.
    pub fn build_config(&self) -> BuildConfig {
        BuildConfig::new(self.strict)
    }
}

/// Output settings.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    format: OutputFormat,
}

impl OutputConfig {
    /// Creates a new [`OutputConfig`].
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Returns the dump format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

/// Format of the IR dump.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Indented human-readable tree.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "unknown output format `{other}`, expected `text` or `json`"
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
