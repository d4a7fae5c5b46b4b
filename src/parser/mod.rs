//! Tokenizer and parser for iq programs.
//!
//! An iq program is one or more `;`-separated statements; each statement is
//! an expression over the base image (`input`), numbers, and colour
//! literals, followed by optional layer metadata clauses:
//!
//! ```text
//! blend(input, invert(input), 0.5) as soft opacity 0.8 mode screen;
//! grey(input) as mono z -1
//! ```
//!
//! Tokenization materializes the whole token sequence up front (terminated
//! by an explicit end-of-input token), which keeps parser lookahead simple
//! and the sequence restartable.

mod ast;
mod expr;
mod token;
pub mod span;

pub use ast::{BinaryOp, Expr, Program, Statement, UnaryOp};
pub use expr::{ast_from_tokens, MAX_EXPR_DEPTH};
pub use span::{Location, Span};
pub use token::{canonical, tokens_from_program, Token, TokenKind, MAX_PROGRAM_TOKENS};

use crate::error::Result;

/// Tokenize and parse a program in one step.
pub fn parse_program(source: &str) -> Result<Program> {
    let tokens = tokens_from_program(source)?;
    ast_from_tokens(&tokens)
}
