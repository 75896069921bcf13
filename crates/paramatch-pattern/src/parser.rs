//! Template scanner.
//!
//! Splits a template into literal text and `{name}` placeholders using winnow.
//!
//! # Syntax
//!
//! ```text
//! /path/{id}/{other}     two placeholders
//! /file/{name}.{ext}     placeholders need not fill a whole segment
//! /set/\{{key}\}         \{ and \} are literal braces
//! ```
//!
//! Names start with an ASCII letter or `_` and may continue with ASCII
//! letters, digits, `_`, `-` and `.`.

use crate::error::{PatternError, Result};
use crate::template::Segment;
use std::sync::Arc;
use winnow::combinator::{alt, delimited, preceded};
use winnow::prelude::*;
use winnow::token::{one_of, take_till, take_while};

#[derive(Debug, Clone, PartialEq)]
enum Token<'a> {
    Text(&'a str),
    Brace(char),
    Placeholder(&'a str),
}

pub fn parse_segments(template: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut input = template;

    while !input.is_empty() {
        let position = template.len() - input.len();

        match token.parse_next(&mut input) {
            Ok(Token::Text(text)) => literal.push_str(text),
            Ok(Token::Brace(brace)) => literal.push(brace),
            Ok(Token::Placeholder(name)) => {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Placeholder(Arc::from(name)));
            }
            Err(_) => {
                return Err(PatternError::InvalidPattern {
                    template: template.to_string(),
                    position,
                    reason: describe_error(&template[position..]),
                });
            }
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    Ok(segments)
}

// ============ Winnow Parsers ============

fn token<'a>(input: &mut &'a str) -> ModalResult<Token<'a>> {
    alt((escaped_brace, placeholder, text)).parse_next(input)
}

fn escaped_brace<'a>(input: &mut &'a str) -> ModalResult<Token<'a>> {
    preceded('\\', one_of(['{', '}']))
        .map(Token::Brace)
        .parse_next(input)
}

fn placeholder<'a>(input: &mut &'a str) -> ModalResult<Token<'a>> {
    delimited('{', identifier, '}')
        .map(Token::Placeholder)
        .parse_next(input)
}

fn identifier<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| {
            c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
        }),
    )
        .take()
        .parse_next(input)
}

// A backslash that does not escape a brace is ordinary text.
fn text<'a>(input: &mut &'a str) -> ModalResult<Token<'a>> {
    alt((take_till(1.., ['{', '}', '\\']), "\\"))
        .map(Token::Text)
        .parse_next(input)
}

fn describe_error(rest: &str) -> String {
    if rest.starts_with('}') {
        return "unmatched '}'".to_string();
    }

    let inner = &rest[1..];
    match inner.find('}') {
        None => "unclosed '{'".to_string(),
        Some(0) => "empty parameter name".to_string(),
        Some(end) if inner[..end].contains('{') => "nested '{'".to_string(),
        Some(end) => format!("invalid parameter name '{}'", &inner[..end]),
    }
}
