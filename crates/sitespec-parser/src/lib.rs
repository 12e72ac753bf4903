//! # Sitespec Parser
//!
//! Parser for the site spec language. This crate provides the pipeline from
//! a root `.api` file to the [`SiteSpec`] IR consumed by code generators.
//!
//! ## Usage
//!
//! ```
//! # use sitespec_parser::{parse, BuildConfig, ParseError, Source};
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = Source::inline("site", r#"
//! type LoginRequest {
//!     Email string `form:"email"`
//! }
//!
//! @server (
//!     prefix: /auth
//! )
//! service web {
//!     @handler login
//!     post /login (LoginRequest)
//! }
//! "#);
//!
//!     let spec = parse(&source, BuildConfig::default())?;
//!     assert_eq!(spec.methods().count(), 1);
//!     Ok(())
//! }
//! ```

mod elaborate;
pub mod error;
mod lexer;
mod parser;
#[cfg(test)]
mod parser_tests;
pub mod parser_types;
mod signature;
mod source;
mod span;
mod tokens;

pub use elaborate::BuildConfig;
pub use error::ParseError;
pub use source::{Location, Source};
pub use span::Span;

use std::path::Path;

use log::{info, warn};

use sitespec_core::semantic::SiteSpec;

use elaborate::Builder;
use error::{Diagnostic, DiagnosticCollector};
use parser_types::SiteAst;

/// Parse a source into its syntax tree without lowering it.
///
/// Non-fatal findings are logged as warnings, or fail the parse when
/// `config.strict` is set.
///
/// # Errors
///
/// Returns a [`ParseError`] whose diagnostics carry the originating file and
/// line of each problem.
pub fn parse_ast(source: &Source, config: BuildConfig) -> Result<SiteAst, ParseError> {
    let mut collector = DiagnosticCollector::new();
    let ast = parser::build_site(source.text(), &mut collector)
        .map_err(|diagnostic| source.annotate(diagnostic))?;
    finish(source, collector, config)?;
    Ok(ast)
}

/// Parse a source into the site spec IR.
///
/// This is the main entry point of the crate. It orchestrates the pipeline:
///
/// 1. **Lex** - Classify each resolved line into a token
/// 2. **Parse** - Build the [`SiteAst`] from the tokens
/// 3. **Build** - Resolve types and link menus into a [`SiteSpec`]
///
/// # Errors
///
/// Returns a [`ParseError`] on the first syntax error, or with every warning
/// promoted to an error when `config.strict` is set.
pub fn parse(source: &Source, config: BuildConfig) -> Result<SiteSpec, ParseError> {
    info!(name = source.name(), strict = config.strict; "Parsing site spec");

    let mut collector = DiagnosticCollector::new();
    let ast = parser::build_site(source.text(), &mut collector)
        .map_err(|diagnostic| source.annotate(diagnostic))?;
    let spec = Builder::new(&mut collector).build(source.name(), &ast);
    finish(source, collector, config)?;
    Ok(spec)
}

/// Resolve the imports of the file at `path` and parse the result.
///
/// # Errors
///
/// Returns a [`ParseError`] if the file or one of its imports cannot be
/// read, imports form a cycle, or the resolved text fails to parse.
pub fn parse_file(path: impl AsRef<Path>, config: BuildConfig) -> Result<SiteSpec, ParseError> {
    let source = Source::load(path)?;
    parse(&source, config)
}

fn annotate_error(source: &Source, err: ParseError) -> ParseError {
    ParseError::new(
        err.into_diagnostics()
            .into_iter()
            .map(|diagnostic| source.annotate(diagnostic))
            .collect(),
    )
}

fn finish(
    source: &Source,
    collector: DiagnosticCollector,
    config: BuildConfig,
) -> Result<(), ParseError> {
    let warnings = collector
        .finish(config.strict)
        .map_err(|err| annotate_error(source, err))?;
    for warning in warnings.into_iter().map(|w| source.annotate(w)) {
        log_warning(&warning);
    }
    Ok(())
}

fn log_warning(warning: &Diagnostic) {
    let code = warning.code().map(|code| code.as_str()).unwrap_or_default();
    let location = warning
        .location()
        .map(ToString::to_string)
        .unwrap_or_default();
    warn!(code, location; "{}", warning.message());
}
