//! Rendering of load failures through miette.
//!
//! A failed load yields a [`SiteSpecError`]. Parse failures carry one or more
//! [`Diagnostic`]s whose labels point into the import-resolved text, so each
//! one is reported on its own against that text and prefixed with the
//! `path:line` it came from in the original files.
//!
//! Some diagnostics have nothing to point at: import cycles and unreadable
//! imports are found before any text is resolved. Those are reported with
//! their location, code and import chain, but without a source snippet.
//!
//! In strict mode the parser promotes warnings to errors before they reach
//! this module; [`Severity`] is still mapped so a warning rendered here shows
//! up as one.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, Severity as MietteSeverity, SourceSpan};

use sitespec::SiteSpecError;
use sitespec_parser::{
    Span,
    error::{Diagnostic, Severity},
};

/// A site spec [`Diagnostic`] paired with the resolved text its spans index.
pub struct DiagnosticAdapter<'a> {
    diag: &'a Diagnostic,
    src: &'a str,
}

impl<'a> DiagnosticAdapter<'a> {
    pub fn new(diag: &'a Diagnostic, src: &'a str) -> Self {
        Self { diag, src }
    }
}

impl fmt::Debug for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticAdapter")
            .field("diag", &self.diag)
            .finish()
    }
}

impl fmt::Display for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = self.diag.location() {
            write!(f, "{location}: ")?;
        }
        f.write_str(self.diag.message())
    }
}

impl std::error::Error for DiagnosticAdapter<'_> {}

impl MietteDiagnostic for DiagnosticAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .code()
            .map(|code| Box::new(code) as Box<dyn fmt::Display>)
    }

    fn severity(&self) -> Option<MietteSeverity> {
        Some(match self.diag.severity() {
            Severity::Error => MietteSeverity::Error,
            Severity::Warning => MietteSeverity::Warning,
        })
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .help()
            .map(|help| Box::new(help) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        if self.diag.labels().is_empty() {
            return None;
        }
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let labels = self.diag.labels();
        if labels.is_empty() {
            return None;
        }

        Some(Box::new(labels.iter().map(|label| {
            let span = to_source_span(label.span());
            let message = Some(label.message().to_string());
            if label.is_primary() {
                LabeledSpan::new_primary_with_span(message, span)
            } else {
                LabeledSpan::new_with_span(message, span)
            }
        })))
    }
}

/// A [`SiteSpecError`] that is not a parse failure: I/O, configuration or
/// output serialization.
pub struct ErrorAdapter<'a>(pub &'a SiteSpecError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            SiteSpecError::Io(_) => "sitespec::io",
            SiteSpecError::Parse { .. } => return None,
            SiteSpecError::Config(_) => "sitespec::config",
            SiteSpecError::Output(_) => "sitespec::output",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match &self.0 {
            SiteSpecError::Config(_) => "check the --config file and the --format flag",
            _ => return None,
        };
        Some(Box::new(help))
    }
}

/// One renderable report.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A parse diagnostic, possibly with labels into the resolved text.
    Diagnostic(DiagnosticAdapter<'a>),
    /// Any other failure.
    Error(ErrorAdapter<'a>),
}

impl Reportable<'_> {
    fn inner(&self) -> &dyn MietteDiagnostic {
        match self {
            Reportable::Diagnostic(d) => d,
            Reportable::Error(e) => e,
        }
    }
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.inner(), f)
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Diagnostic(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.inner().code()
    }

    fn severity(&self) -> Option<MietteSeverity> {
        self.inner().severity()
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.inner().help()
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.inner().source_code()
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        self.inner().labels()
    }
}

fn to_source_span(span: Span) -> SourceSpan {
    SourceSpan::new(span.start().into(), span.len())
}

/// Split an error into one report per diagnostic.
pub fn to_reportables(err: &SiteSpecError) -> Vec<Reportable<'_>> {
    match err {
        SiteSpecError::Parse { err, src } => err
            .diagnostics()
            .iter()
            .map(|diag| Reportable::Diagnostic(DiagnosticAdapter::new(diag, src)))
            .collect(),
        _ => vec![Reportable::Error(ErrorAdapter(err))],
    }
}
