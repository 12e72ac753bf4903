//! Error codes for the site spec diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Lexer and import resolution errors
//! - `E1xx` - Parser errors
//! - `E2xx` - Warnings raised while parsing or building the spec

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Lexer and Import Errors (E0xx)
    // =========================================================================
    /// Unterminated string literal.
    ///
    /// A line opens a `"` quote that is never closed on the same line.
    E001,

    /// Unreadable import.
    ///
    /// An imported file does not exist or cannot be read.
    E010,

    /// Import cycle.
    ///
    /// A file imports itself, directly or through other files.
    E011,

    // =========================================================================
    // Parser Errors (E1xx)
    // =========================================================================
    /// Unexpected token.
    ///
    /// The parser encountered a line it did not expect at this position.
    E100,

    /// Incomplete input.
    ///
    /// The input ended before a block was closed.
    E101,

    /// Invalid modifier for the HTTP method.
    ///
    /// For example `post static /x`: static routes are GET only.
    E102,

    /// Malformed method signature.
    E103,

    /// Malformed socket topic line.
    E104,

    /// Malformed `sub`/`pub` topic line.
    E105,

    /// Malformed `@menus` block.
    E106,

    /// Malformed `@module` block.
    E107,

    // =========================================================================
    // Warnings (E2xx)
    // =========================================================================
    /// Duplicate socket topic.
    ///
    /// The same topic is declared twice in one direction; the later one is dropped.
    E200,

    /// Orphan menu entry.
    ///
    /// A menu entry names a parent url that no entry in the menu has.
    E201,

    /// Duplicate menu url.
    ///
    /// Two entries of the same menu share a url; the later one wins.
    E202,

    /// Dangling annotation.
    ///
    /// An `@page`, `@doc` or `@menus` block is not followed by a method.
    E203,

    /// Unknown menu attribute.
    E204,

    /// Unresolved import.
    ///
    /// An `import` line in a source that has no file to resolve it against.
    E205,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E010 => "E010",
            ErrorCode::E011 => "E011",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E104 => "E104",
            ErrorCode::E105 => "E105",
            ErrorCode::E106 => "E106",
            ErrorCode::E107 => "E107",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
            ErrorCode::E205 => "E205",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "unterminated string literal",
            ErrorCode::E010 => "unreadable import",
            ErrorCode::E011 => "import cycle",
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "incomplete input",
            ErrorCode::E102 => "invalid method modifier",
            ErrorCode::E103 => "malformed method signature",
            ErrorCode::E104 => "malformed socket topic",
            ErrorCode::E105 => "malformed pub-sub topic",
            ErrorCode::E106 => "malformed menu block",
            ErrorCode::E107 => "malformed module block",
            ErrorCode::E200 => "duplicate socket topic",
            ErrorCode::E201 => "orphan menu entry",
            ErrorCode::E202 => "duplicate menu url",
            ErrorCode::E203 => "dangling annotation",
            ErrorCode::E204 => "unknown menu attribute",
            ErrorCode::E205 => "unresolved import",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
