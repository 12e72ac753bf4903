//! Error and diagnostic system for the site spec parser.
//!
//! This module provides an error handling system with:
//! - Error codes for documentation and searchability
//! - Multiple labeled spans for rich error context
//! - Severity levels
//! - Diagnostic collector for accumulating warnings and errors
//!
//! # Overview
//!
//! The error system is built around the [`Diagnostic`] type, which represents
//! a single error or warning message with optional error code, source spans,
//! a resolved file/line [`Location`](crate::Location) and help text. Multiple
//! diagnostics are wrapped in [`ParseError`] for returning from the parsing
//! lifecycle.
//!
//! # Example
//!
//! ```
//! # use sitespec_parser::error::{Diagnostic, ErrorCode};
//! # use sitespec_parser::Span;
//!
//! let span = Span::new(100..120);
//! let opener = Span::new(50..70);
//!
//! let diag = Diagnostic::error("attribute block is never closed")
//!     .with_code(ErrorCode::E101)
//!     .with_label(span, "input ends here")
//!     .with_secondary_label(opener, "block opened here")
//!     .with_help("add a `)` line to close the block");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub(crate) use collector::DiagnosticCollector;
pub(crate) use parse_error::Result;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;
