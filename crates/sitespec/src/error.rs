//! Error types for site spec loading.
//!
//! This module provides the main error type [`SiteSpecError`] which wraps
//! the error conditions that can occur between reading a root file and
//! writing the IR dump.

use std::io;

use thiserror::Error;

use sitespec_parser::ParseError;

/// The main error type for site spec operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant carries the resolved source text alongside the
/// diagnostics, so their spans can be rendered as source snippets.
#[derive(Debug, Error)]
pub enum SiteSpecError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

impl SiteSpecError {
    /// Create a new `Parse` error with the associated source text.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
