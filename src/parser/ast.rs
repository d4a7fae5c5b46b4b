//! The abstract syntax tree for iq programs.
//!
//! A program is an ordered sequence of statements; each statement is one
//! expression plus optional layer metadata clauses. Expression nodes form a
//! single rooted tree, exclusively owned by their parents. The whole tree
//! serializes to JSON for `--dump-ast`.

use serde::Serialize;

use crate::types::{BlendMode, Colour};

/// A binary operator tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    /// The operator's source symbol, for error messages.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "**",
        }
    }
}

/// A unary operator tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnaryOp {
    /// Scalar negation; channel inversion on images and colours.
    Neg,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
        }
    }
}

/// One expression node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Expr {
    /// A numeric literal.
    Number(f64),
    /// A colour literal.
    Colour(Colour),
    /// A reference: `input` or a previously bound layer name.
    Ref(String),
    /// A unary operation.
    Unary { op: UnaryOp, expr: Box<Expr> },
    /// A binary operation.
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// A function call: `blend(a, b, 0.5)`.
    Call { name: String, args: Vec<Expr> },
}

/// One top-level statement: an expression and its layer metadata.
///
/// Metadata fields are `None` when the clause was not written; defaults are
/// applied by the evaluator (implicit name, opacity 1, normal mode, z =
/// statement index).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub expr: Expr,
    /// Explicit layer name from an `as <name>` clause.
    pub name: Option<String>,
    /// Opacity in [0, 1] from an `opacity <n>` clause.
    pub opacity: Option<f64>,
    /// Blend mode from a `mode <name>` clause.
    pub mode: Option<BlendMode>,
    /// Z-order from a `z <n>` clause.
    pub z: Option<i32>,
}

impl Statement {
    /// A bare statement with no metadata clauses.
    pub fn bare(expr: Expr) -> Self {
        Self {
            expr,
            name: None,
            opacity: None,
            mode: None,
            z: None,
        }
    }

    /// Whether any metadata clause was written.
    pub fn has_metadata(&self) -> bool {
        self.name.is_some() || self.opacity.is_some() || self.mode.is_some() || self.z.is_some()
    }
}

/// A parsed program: ordered statements.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    pub statements: Vec<Statement>,
}
