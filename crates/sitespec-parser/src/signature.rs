//! Line-level grammars built with winnow.
//!
//! The lexer works a line at a time; the pieces inside a line (method
//! signatures, type expressions, topic declarations) are parsed here.

use winnow::{
    Parser as _,
    ascii::space0,
    combinator::{alt, delimited, eof, preceded, repeat, terminated},
    error::ModalResult,
    token::take_while,
};

use crate::parser_types::TypeExpr;

pub(crate) type IResult<O> = ModalResult<O>;

/// A piece of a method or topic line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Word<'a> {
    /// A run of non-space characters outside parentheses.
    Bare(&'a str),
    /// The trimmed contents of a `( ... )` group.
    Group(&'a str),
}

impl<'a> Word<'a> {
    pub(crate) fn as_bare(&self) -> Option<&'a str> {
        match self {
            Word::Bare(word) => Some(word),
            Word::Group(_) => None,
        }
    }
}

fn group<'a>(input: &mut &'a str) -> IResult<Word<'a>> {
    delimited('(', take_while(0.., |c: char| c != ')' && c != '('), ')')
        .map(|inner: &str| Word::Group(inner.trim()))
        .parse_next(input)
}

fn bare<'a>(input: &mut &'a str) -> IResult<Word<'a>> {
    take_while(1.., |c: char| !c.is_whitespace() && c != '(' && c != ')')
        .map(Word::Bare)
        .parse_next(input)
}

fn words<'a>(input: &mut &'a str) -> IResult<Vec<Word<'a>>> {
    terminated(
        repeat(0.., preceded(space0, alt((group, bare)))),
        (space0, eof),
    )
    .parse_next(input)
}

/// Split a line into bare words and parenthesized groups.
///
/// `/users(Req) returns (Resp)` yields `Bare("/users")`, `Group("Req")`,
/// `Bare("returns")`, `Group("Resp")`. Fails on unbalanced or nested
/// parentheses.
pub(crate) fn split_words(line: &str) -> Result<Vec<Word<'_>>, String> {
    let mut input = line;
    words
        .parse_next(&mut input)
        .map_err(|_| format!("unbalanced parentheses in `{line}`"))
}

fn type_name<'a>(input: &mut &'a str) -> IResult<&'a str> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '_' || c == '.').parse_next(input)
}

fn type_expr(input: &mut &str) -> IResult<TypeExpr> {
    alt((
        preceded("[]", type_expr).map(|value| TypeExpr::Array(Box::new(value))),
        preceded('*', type_expr).map(|inner| TypeExpr::Pointer(Box::new(inner))),
        (
            delimited("map[", take_while(1.., |c: char| c != ']'), ']'),
            type_expr,
        )
            .map(|(key, value): (&str, TypeExpr)| TypeExpr::Map {
                key: key.to_string(),
                value: Box::new(value),
            }),
        "interface{}".map(|name: &str| TypeExpr::Named(name.to_string())),
        type_name.map(|name: &str| TypeExpr::Named(name.to_string())),
    ))
    .parse_next(input)
}

/// Parse a complete type expression: `[]T`, `*T`, `map[K]V` or a name.
pub(crate) fn parse_type(text: &str) -> Result<TypeExpr, String> {
    let mut input = text.trim();
    let expr = terminated(type_expr, eof)
        .parse_next(&mut input)
        .map_err(|_| format!("`{}` is not a valid type", text.trim()))?;
    Ok(expr)
}

/// Parse the contents of a `( ... )` group as an optional type; `()` is none.
pub(crate) fn parse_group_type(text: &str) -> Result<Option<TypeExpr>, String> {
    if text.trim().is_empty() {
        Ok(None)
    } else {
        parse_type(text).map(Some)
    }
}
