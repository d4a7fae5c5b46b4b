//! Tokenizer for iq programs.
//!
//! Scans program text left-to-right into a fully materialized token
//! sequence terminated by an explicit end-of-input token. Tokens keep their
//! literal source text and span, so errors can point at the program and the
//! sequence can be re-stringified into a canonical form.

use crate::error::{IqError, Result};
use crate::parser::span::Span;
use crate::types::Colour;

/// Upper bound on tokens per program; pathological input fails instead of
/// exhausting memory.
pub const MAX_PROGRAM_TOKENS: usize = 4096;

/// A classified lexical unit.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Identifier: layer names, function names, contextual keywords.
    Ident,
    /// Numeric literal (integer or decimal), parsed value.
    Number(f64),
    /// Hex colour literal.
    Colour(Colour),
    Plus,
    Minus,
    Star,
    Slash,
    /// The `**` power operator.
    StarStar,
    LParen,
    RParen,
    Comma,
    Semi,
    /// Explicit end-of-input marker, always the final token.
    Eof,
}

/// One token: kind, literal source text, and source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    /// A short description of the token for error messages.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("'{}'", self.text),
        }
    }
}

/// Tokenize a program into an ordered sequence ending in `Eof`.
///
/// Whitespace is insignificant and skipped. An unrecognized character is a
/// lex error carrying the character and its 0-based byte offset.
pub fn tokens_from_program(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let token = match c {
            '0'..='9' => lex_number(source, &mut chars),
            'a'..='z' | 'A'..='Z' | '_' => lex_ident(source, &mut chars),
            '#' => lex_colour(source, &mut chars)?,
            '+' | '-' | '*' | '/' | '(' | ')' | ',' | ';' => lex_symbol(source, &mut chars),
            _ => {
                return Err(IqError::Lex {
                    character: c,
                    offset,
                })
            }
        };

        tokens.push(token);
        if tokens.len() > MAX_PROGRAM_TOKENS {
            return Err(IqError::ResourceLimit {
                message: format!("program exceeds {} tokens", MAX_PROGRAM_TOKENS),
                help: Some("split the program or reduce its size".to_string()),
            });
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        text: String::new(),
        span: Span::from_offsets(source, source.len(), source.len()),
    });

    Ok(tokens)
}

/// Re-stringify a token sequence into its canonical single-spaced form.
///
/// Tokenizing the canonical form yields the same kinds and texts again.
pub fn canonical(tokens: &[Token]) -> String {
    tokens
        .iter()
        .filter(|t| t.kind != TokenKind::Eof)
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

type CharStream<'a> = std::iter::Peekable<std::str::CharIndices<'a>>;

fn lex_number(source: &str, chars: &mut CharStream) -> Token {
    let start = chars.peek().map(|&(i, _)| i).unwrap_or(0);
    let mut end = start;

    while let Some(&(i, c)) = chars.peek() {
        if c.is_ascii_digit() {
            end = i + c.len_utf8();
            chars.next();
        } else {
            break;
        }
    }

    // A decimal point only belongs to the number if a digit follows it.
    if let Some(&(dot, '.')) = chars.peek() {
        let after_dot = source[dot + 1..].chars().next();
        if after_dot.is_some_and(|c| c.is_ascii_digit()) {
            chars.next();
            while let Some(&(i, c)) = chars.peek() {
                if c.is_ascii_digit() {
                    end = i + c.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
        }
    }

    let text = &source[start..end];
    // Digit-only text with at most one interior dot always parses.
    let value: f64 = text.parse().unwrap_or(0.0);

    Token {
        kind: TokenKind::Number(value),
        text: text.to_string(),
        span: Span::from_offsets(source, start, end),
    }
}

fn lex_ident(source: &str, chars: &mut CharStream) -> Token {
    let start = chars.peek().map(|&(i, _)| i).unwrap_or(0);
    let mut end = start;

    while let Some(&(i, c)) = chars.peek() {
        if c.is_ascii_alphanumeric() || c == '_' {
            end = i + c.len_utf8();
            chars.next();
        } else {
            break;
        }
    }

    Token {
        kind: TokenKind::Ident,
        text: source[start..end].to_string(),
        span: Span::from_offsets(source, start, end),
    }
}

fn lex_colour(source: &str, chars: &mut CharStream) -> Result<Token> {
    let start = chars.peek().map(|&(i, _)| i).unwrap_or(0);
    chars.next(); // '#'
    let mut end = start + 1;

    while let Some(&(i, c)) = chars.peek() {
        if c.is_ascii_hexdigit() {
            end = i + c.len_utf8();
            chars.next();
        } else {
            break;
        }
    }

    let text = &source[start..end];
    let colour = Colour::from_hex(text)?;

    Ok(Token {
        kind: TokenKind::Colour(colour),
        text: text.to_string(),
        span: Span::from_offsets(source, start, end),
    })
}

fn lex_symbol(source: &str, chars: &mut CharStream) -> Token {
    let (start, c) = chars.next().expect("caller peeked a symbol");
    let mut end = start + c.len_utf8();

    let kind = match c {
        '+' => TokenKind::Plus,
        '-' => TokenKind::Minus,
        '*' => {
            if let Some(&(i, '*')) = chars.peek() {
                chars.next();
                end = i + 1;
                TokenKind::StarStar
            } else {
                TokenKind::Star
            }
        }
        '/' => TokenKind::Slash,
        '(' => TokenKind::LParen,
        ')' => TokenKind::RParen,
        ',' => TokenKind::Comma,
        _ => TokenKind::Semi,
    };

    Token {
        kind,
        text: source[start..end].to_string(),
        span: Span::from_offsets(source, start, end),
    }
}
