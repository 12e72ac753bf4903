//! Line lexer for site spec source text.
//!
//! The language is line oriented: each non-blank line is one token. Blank
//! lines and `//` comment lines are skipped. A line is classified in this
//! order:
//!
//! 1. a lone `{`, `}`, `(` or `)`
//! 2. a leading keyword (`type`, `@server`, `get`, ...) followed by the end
//!    of the line, whitespace, `(` or `{`
//! 3. an attribute: contains `:` outside quotes, with no backtick and no `/`
//!    outside quotes
//! 4. a struct field: starts with a word directly followed by `:`
//! 5. anything else is an identifier line
//!
//! Quoted text (`"..."` and `` `...` ``) never influences classification.

use winnow::{
    Parser as _,
    combinator::{alt, eof, peek, terminated},
    token::{one_of, take_while},
};

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    signature::IResult,
    span::Span,
    tokens::{PositionedToken, Token},
};

/// Produces one [`PositionedToken`] per meaningful line.
#[derive(Debug)]
pub(crate) struct Lexer<'src> {
    text: &'src str,
    offset: usize,
}

impl<'src> Lexer<'src> {
    pub(crate) fn new(text: &'src str) -> Self {
        Self { text, offset: 0 }
    }

    /// Return the next token. Once the text is exhausted every call returns
    /// [`Token::Eof`].
    pub(crate) fn next_token(&mut self) -> Result<PositionedToken<'src>> {
        while self.offset < self.text.len() {
            let rest = &self.text[self.offset..];
            let (raw, advance) = match rest.find('\n') {
                Some(end) => (&rest[..end], end + 1),
                None => (rest, rest.len()),
            };
            let line_start = self.offset;
            self.offset += advance;

            let line = raw.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }
            let start = line_start + (raw.len() - raw.trim_start().len());
            return classify(line, Span::new(start..start + line.len()));
        }

        let end = self.text.len();
        Ok(PositionedToken::new(
            Token::Eof,
            "",
            "",
            Span::new(end..end),
        ))
    }
}

fn classify(line: &str, span: Span) -> Result<PositionedToken<'_>> {
    let token = |token| PositionedToken::new(token, line, line, span);

    match line {
        "{" => return Ok(token(Token::LeftBrace)),
        "}" => return Ok(token(Token::RightBrace)),
        "(" => return Ok(token(Token::LeftParen)),
        ")" => return Ok(token(Token::RightParen)),
        _ => {}
    }

    let masked = mask_quoted(line).map_err(|quote_offset| {
        let quote = span.start() + quote_offset;
        Diagnostic::error("unterminated string literal")
            .with_code(ErrorCode::E001)
            .with_label(Span::new(quote..span.end()), "quote is never closed")
            .with_help("strings must be closed on the line they start on")
    })?;

    let mut rest = line;
    if let Ok(keyword) = leading_keyword.parse_next(&mut rest) {
        return Ok(PositionedToken::new(
            keyword,
            clean_literal(rest),
            line,
            span,
        ));
    }

    if masked.contains(':') && !line.contains('`') && !masked.contains('/') {
        return Ok(token(Token::Attribute));
    }

    if is_struct_field(line) {
        return Ok(token(Token::StructField));
    }

    Ok(token(Token::Identifier))
}

fn leading_keyword(input: &mut &str) -> IResult<Token> {
    terminated(
        take_while(1.., |c: char| {
            c.is_alphanumeric() || matches!(c, '@' | '_' | '-')
        })
        .verify_map(Token::keyword),
        peek(alt((eof.void(), one_of([' ', '\t', '(', '{']).void()))),
    )
    .parse_next(input)
}

/// Strip one trailing `{`, then one trailing `(`, then surrounding space.
fn clean_literal(rest: &str) -> &str {
    let rest = rest.strip_suffix('{').unwrap_or(rest);
    let rest = rest.strip_suffix('(').unwrap_or(rest);
    rest.trim()
}

/// `^\w+:`
fn is_struct_field(line: &str) -> bool {
    let word_end = line
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(line.len());
    word_end > 0 && line[word_end..].starts_with(':')
}

/// Replace the contents of `"..."` and `` `...` `` with spaces, keeping the
/// delimiters. Returns the byte offset of an unclosed opening quote as the error.
fn mask_quoted(line: &str) -> std::result::Result<String, usize> {
    let mut masked = String::with_capacity(line.len());
    let mut open: Option<(char, usize)> = None;
    let mut escaped = false;

    for (idx, c) in line.char_indices() {
        match open {
            Some((quote, _)) => {
                if escaped {
                    escaped = false;
                    masked.push(' ');
                } else if c == '\\' && quote == '"' {
                    escaped = true;
                    masked.push(' ');
                } else if c == quote {
                    open = None;
                    masked.push(c);
                } else {
                    masked.push(' ');
                }
            }
            None => {
                if c == '"' || c == '`' {
                    open = Some((c, idx));
                }
                masked.push(c);
            }
        }
    }

    match open {
        Some((_, idx)) => Err(idx),
        None => Ok(masked),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Vec<(Token, String)> {
        let mut lexer = Lexer::new(text);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token().unwrap();
            if token.token == Token::Eof {
                return out;
            }
            out.push((token.token, token.literal.to_string()));
        }
    }

    fn single(line: &str) -> (Token, String) {
        tokens(line).remove(0)
    }

    #[test]
    fn test_structural_lines() {
        assert_eq!(single("{").0, Token::LeftBrace);
        assert_eq!(single("}").0, Token::RightBrace);
        assert_eq!(single("(").0, Token::LeftParen);
        assert_eq!(single(")").0, Token::RightParen);
    }

    #[test]
    fn test_keywords_and_literals() {
        assert_eq!(single("type User {"), (Token::Type, "User".to_string()));
        assert_eq!(single("@server("), (Token::Server, String::new()));
        assert_eq!(single("service api {"), (Token::Service, "api".to_string()));
        assert_eq!(single("@handler Home"), (Token::Handler, "Home".to_string()));
        assert_eq!(single("@page ("), (Token::Page, String::new()));
        assert_eq!(single("@menus("), (Token::Menus, String::new()));
        assert_eq!(single("@module("), (Token::Module, String::new()));
        assert_eq!(
            single("get socket /ws ("),
            (Token::Get, "socket /ws".to_string())
        );
        assert_eq!(
            single("post /login (LoginRequest) returns (LoginResponse)"),
            (
                Token::Post,
                "/login (LoginRequest) returns (LoginResponse)".to_string()
            )
        );
        assert_eq!(single("sub chat (Msg)"), (Token::Sub, "chat (Msg)".to_string()));
        assert_eq!(single(r#"import "x.api""#).0, Token::Import);
    }

    #[test]
    fn test_keywords_need_a_word_boundary() {
        assert_eq!(single("typeName string").0, Token::Identifier);
        assert_eq!(single("getter string").0, Token::Identifier);
        assert_eq!(single("type: checkbox").0, Token::Attribute);
        assert_eq!(single("services []Service").0, Token::Identifier);
    }

    #[test]
    fn test_attribute_and_field_lines() {
        assert_eq!(single("title: Home").0, Token::Attribute);
        assert_eq!(single(r#"url: "/a/b""#).0, Token::Attribute);
        assert_eq!(single("url:/a/b").0, Token::StructField);
        assert_eq!(single("url: /a/b").0, Token::StructField);
        assert_eq!(
            single(r#"Name string `json:"name"`"#).0,
            Token::Identifier
        );
        assert_eq!(single("main (").0, Token::Identifier);
    }

    #[test]
    fn test_quotes_hide_keywords_and_colons() {
        assert_eq!(single(r#""title: x""#).0, Token::Identifier);
        assert_eq!(single(r#"title: "say \"hi\"""#).0, Token::Attribute);
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new("\ntitle: \"Home\n");

        let err = lexer.next_token().unwrap_err();

        assert_eq!(err.code(), Some(ErrorCode::E001));
        assert_eq!(err.primary_span(), Some(Span::new(8..13)));
    }

    #[test]
    fn test_skips_blank_and_comment_lines() {
        let toks = tokens("\n   \n// type Foo {\ntype Bar {\n}\n");

        assert_eq!(
            toks,
            vec![
                (Token::Type, "Bar".to_string()),
                (Token::RightBrace, "}".to_string()),
            ]
        );
    }

    #[test]
    fn test_spans_cover_trimmed_lines() {
        let text = "type A {\n  Name string\n}";
        let mut lexer = Lexer::new(text);

        let first = lexer.next_token().unwrap();
        let second = lexer.next_token().unwrap();
        let third = lexer.next_token().unwrap();

        assert_eq!(first.span, Span::new(0..8));
        assert_eq!(&text[second.span.start()..second.span.end()], "Name string");
        assert_eq!(second.line, "Name string");
        assert_eq!(third.span, Span::new(23..24));
    }

    #[test]
    fn test_eof_repeats() {
        let mut lexer = Lexer::new("}\n");

        assert_eq!(lexer.next_token().unwrap().token, Token::RightBrace);
        assert_eq!(lexer.next_token().unwrap().token, Token::Eof);
        assert_eq!(lexer.next_token().unwrap().token, Token::Eof);
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    const KEYWORDS: &[&str] = &[
        "import", "type", "@server", "service", "@handler", "@page", "@doc", "@menus",
        "@module", "get", "post", "put", "delete", "patch", "sub",
    ];

    // ===================
    // Strategies
    // ===================

    fn keyword_strategy() -> impl Strategy<Value = &'static str> {
        prop::sample::select(KEYWORDS)
    }

    fn suffix_strategy() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_-]{1,8}"
    }

    fn tail_strategy() -> impl Strategy<Value = String> {
        "[a-z ]{0,12}"
    }

    // ===================
    // Property Test Functions
    // ===================

    /// A keyword glued to more word characters is never lexed as that keyword.
    fn check_keyword_needs_boundary(
        keyword: &str,
        suffix: &str,
        tail: &str,
    ) -> std::result::Result<(), TestCaseError> {
        let line = format!("{keyword}{suffix} {tail}");
        let mut lexer = Lexer::new(&line);
        let token = lexer
            .next_token()
            .map_err(|err| TestCaseError::fail(err.message().to_string()))?;

        prop_assert_ne!(Some(token.token), Token::keyword(keyword), "line `{}`", line);
        Ok(())
    }

    /// A keyword followed by a space or an opening bracket is always that keyword.
    fn check_keyword_at_boundary(
        keyword: &str,
        tail: &str,
    ) -> std::result::Result<(), TestCaseError> {
        for separator in [" ", "(", "{"] {
            let line = format!("{keyword}{separator}{tail}");
            let mut lexer = Lexer::new(&line);
            let token = lexer
                .next_token()
                .map_err(|err| TestCaseError::fail(err.message().to_string()))?;

            prop_assert_eq!(Some(token.token), Token::keyword(keyword), "line `{}`", line);
        }
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn keyword_needs_boundary(
            keyword in keyword_strategy(),
            suffix in suffix_strategy(),
            tail in tail_strategy(),
        ) {
            check_keyword_needs_boundary(keyword, &suffix, &tail)?;
        }

        #[test]
        fn keyword_at_boundary(keyword in keyword_strategy(), tail in tail_strategy()) {
            check_keyword_at_boundary(keyword, &tail)?;
        }
    }
}
