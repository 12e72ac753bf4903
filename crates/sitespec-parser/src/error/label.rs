//! Labeled source spans for diagnostic messages.

use crate::span::Span;

/// A labeled span in the resolved source text.
///
/// - **Primary labels** mark the line the diagnostic is about. Its
///   [`Location`](crate::Location) is derived from the first primary label.
/// - **Secondary labels** provide context, such as "block opened here".
///
/// # Example
///
/// ```text
/// error[E101]: attribute block is never closed
///   --> site.api:14
///    |
/// 12 | @page(
///    | ------ block opened here
/// 14 |
///    | ^ input ends here
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    span: Span,
    message: String,
    is_primary: bool,
}

impl Label {
    /// Create a new primary label.
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: true,
        }
    }

    /// Create a new secondary label.
    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: false,
        }
    }

    /// Get the span this label applies to.
    pub fn span(&self) -> Span {
        self.span
    }

    /// Get the label message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Check if this is a primary label.
    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    /// Check if this is a secondary label.
    pub fn is_secondary(&self) -> bool {
        !self.is_primary
    }
}
