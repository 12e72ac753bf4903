use std::fmt;

use crate::span::Span;

/// Line tokens of the site spec language.
///
/// Every non-blank, non-comment line of the resolved source is exactly one
/// token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Eof,

    // Structure
    LeftBrace,  // {
    RightBrace, // }
    LeftParen,  // (
    RightParen, // )

    // Keywords
    Import,
    Type,
    Server,  // @server
    Service, // service
    Handler, // @handler
    Page,    // @page
    Doc,     // @doc
    Menus,   // @menus
    Module,  // @module
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Sub,

    // Line shapes
    Attribute,   // key: value
    StructField, // Name type `tags`
    Identifier,
}

impl Token {
    /// The token for a leading keyword, if `word` is one.
    pub fn keyword(word: &str) -> Option<Self> {
        let token = match word {
            "import" => Token::Import,
            "type" => Token::Type,
            "@server" => Token::Server,
            "service" => Token::Service,
            "@handler" => Token::Handler,
            "@page" => Token::Page,
            "@doc" => Token::Doc,
            "@menus" => Token::Menus,
            "@module" => Token::Module,
            "get" => Token::Get,
            "post" => Token::Post,
            "put" => Token::Put,
            "delete" => Token::Delete,
            "patch" => Token::Patch,
            "sub" => Token::Sub,
            _ => return None,
        };
        Some(token)
    }

    /// Returns `true` for the tokens that start a method declaration.
    pub fn is_method(&self) -> bool {
        matches!(
            self,
            Token::Get | Token::Post | Token::Put | Token::Delete | Token::Patch | Token::Sub
        )
    }
}

/// A line token with its text and position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionedToken<'src> {
    pub token: Token,
    /// The line with its leading keyword and one trailing `{` or `(` removed, trimmed.
    pub literal: &'src str,
    /// The full trimmed line.
    pub line: &'src str,
    pub span: Span,
}

impl<'src> PositionedToken<'src> {
    pub fn new(token: Token, literal: &'src str, line: &'src str, span: Span) -> Self {
        Self {
            token,
            literal,
            line,
            span,
        }
    }
}

impl std::ops::Deref for PositionedToken<'_> {
    type Target = Token;

    fn deref(&self) -> &Self::Target {
        &self.token
    }
}

impl fmt::Display for PositionedToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.token {
            Token::Eof => self.token.fmt(f),
            _ => write!(f, "`{}`", self.line),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Eof => write!(f, "end of input"),

            Token::LeftBrace => write!(f, "{{"),
            Token::RightBrace => write!(f, "}}"),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),

            Token::Import => write!(f, "import"),
            Token::Type => write!(f, "type"),
            Token::Server => write!(f, "@server"),
            Token::Service => write!(f, "service"),
            Token::Handler => write!(f, "@handler"),
            Token::Page => write!(f, "@page"),
            Token::Doc => write!(f, "@doc"),
            Token::Menus => write!(f, "@menus"),
            Token::Module => write!(f, "@module"),
            Token::Get => write!(f, "get"),
            Token::Post => write!(f, "post"),
            Token::Put => write!(f, "put"),
            Token::Delete => write!(f, "delete"),
            Token::Patch => write!(f, "patch"),
            Token::Sub => write!(f, "sub"),

            Token::Attribute => write!(f, "attribute"),
            Token::StructField => write!(f, "struct field"),
            Token::Identifier => write!(f, "identifier"),
        }
    }
}
