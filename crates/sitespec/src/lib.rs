//! Sitespec - load site spec files into the IR consumed by code generators.
//!
//! A site spec describes an application's data types, servers, handlers and
//! navigation menus in a small line-oriented DSL. This crate resolves a root
//! file and its imports, parses it and builds the [`semantic::SiteSpec`].

pub mod config;

mod error;
mod print;

pub use sitespec_core::semantic;
pub use sitespec_parser::parser_types as ast;

pub use error::SiteSpecError;
pub use print::{print_ast, print_spec, to_json};

use std::path::Path;

use log::{debug, info, trace};

use sitespec_parser::Source;

use config::{AppConfig, OutputFormat};

/// Loader for site spec files.
///
/// # Examples
///
/// ```rust,no_run
/// use sitespec::{SpecLoader, config::AppConfig};
///
/// let loader = SpecLoader::new(AppConfig::default());
///
/// // Resolve imports, parse and build the IR
/// let spec = loader.load("site.api")
///     .expect("Failed to load");
///
/// // Dump it in the configured format
/// let dump = loader.render(&spec)
///     .expect("Failed to render");
/// ```
#[derive(Debug, Default)]
pub struct SpecLoader {
    config: AppConfig,
}

impl SpecLoader {
    /// Create a new loader with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// The configuration of this loader.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Load a root file and its imports into the IR.
    ///
    /// # Errors
    ///
    /// Returns `SiteSpecError::Parse` for unreadable imports, import cycles,
    /// syntax errors, and warnings in strict mode.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<semantic::SiteSpec, SiteSpecError> {
        let source = self.resolve(path.as_ref())?;
        self.parse(&source)
    }

    /// Load a root file and its imports into the syntax tree only.
    ///
    /// # Errors
    ///
    /// Same as [`SpecLoader::load`], minus the spec building step.
    pub fn load_ast(&self, path: impl AsRef<Path>) -> Result<ast::SiteAst, SiteSpecError> {
        let source = self.resolve(path.as_ref())?;
        sitespec_parser::parse_ast(&source, self.config.parser().build_config())
            .map_err(|err| SiteSpecError::new_parse_error(err, source.text()))
    }

    /// Parse in-memory text into the IR. Import lines are not resolved.
    ///
    /// # Errors
    ///
    /// Returns `SiteSpecError::Parse` for syntax errors, and warnings in
    /// strict mode.
    pub fn parse_str(&self, name: &str, text: &str) -> Result<semantic::SiteSpec, SiteSpecError> {
        self.parse(&Source::inline(name, text))
    }

    /// Render the IR in the configured output format.
    ///
    /// # Errors
    ///
    /// Returns `SiteSpecError::Output` if JSON serialization fails.
    pub fn render(&self, spec: &semantic::SiteSpec) -> Result<String, SiteSpecError> {
        match self.config.output().format() {
            OutputFormat::Text => Ok(print_spec(spec)),
            OutputFormat::Json => Ok(to_json(spec)?),
        }
    }

    fn resolve(&self, path: &Path) -> Result<Source, SiteSpecError> {
        info!(path = path.display().to_string(); "Loading site spec");
        let source = Source::load(path).map_err(|err| SiteSpecError::new_parse_error(err, ""))?;
        debug!(files = source.files().len(); "Imports resolved");
        Ok(source)
    }

    fn parse(&self, source: &Source) -> Result<semantic::SiteSpec, SiteSpecError> {
        let spec = sitespec_parser::parse(source, self.config.parser().build_config())
            .map_err(|err| SiteSpecError::new_parse_error(err, source.text()))?;

        debug!("Site spec parsed successfully");
        trace!(spec:?; "Parsed site spec");

        Ok(spec)
    }
}
