//! Collector for accumulating diagnostics during a build.
//!
//! Fatal syntax errors abort parsing immediately; everything non-fatal is
//! emitted here and inspected once the build is done.

use crate::error::{Diagnostic, ParseError};

/// A collector for accumulating diagnostics during a build.
///
/// # Example
///
/// ```text
/// let mut collector = DiagnosticCollector::new();
///
/// collector.emit(
///     Diagnostic::warning("duplicate topic `chat`")
///         .with_code(ErrorCode::E200)
///         .with_label(span, "dropped")
/// );
///
/// // Warnings are handed back on success
/// let warnings = collector.finish(false)?;
/// ```
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    has_errors: bool,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a diagnostic to this collector.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity().is_error() {
            self.has_errors = true;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Finish collection.
    ///
    /// - If there are errors, returns `Err(ParseError)` with all diagnostics.
    /// - With `strict` set, warnings are promoted to errors first.
    /// - Otherwise returns the collected warnings.
    pub fn finish(self, strict: bool) -> Result<Vec<Diagnostic>, ParseError> {
        if strict && !self.diagnostics.is_empty() {
            return Err(ParseError::new(
                self.diagnostics
                    .into_iter()
                    .map(Diagnostic::into_error)
                    .collect(),
            ));
        }
        if self.has_errors {
            Err(ParseError::new(self.diagnostics))
        } else {
            Ok(self.diagnostics)
        }
    }
}
