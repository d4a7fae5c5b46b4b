use miette::Diagnostic;
use thiserror::Error;

/// Main error type for iq operations
#[derive(Error, Diagnostic, Debug)]
pub enum IqError {
    #[error("IO error: {0}")]
    #[diagnostic(code(iq::io))]
    IoError(#[from] std::io::Error),

    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(iq::io))]
    Io {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Lex error: unrecognized character {character:?} at offset {offset}")]
    #[diagnostic(code(iq::lex))]
    Lex { character: char, offset: usize },

    #[error("Parse error: {message}")]
    #[diagnostic(code(iq::parse))]
    Parse {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Type mismatch: operator '{operator}' is not defined for {operands}")]
    #[diagnostic(code(iq::type_mismatch))]
    TypeMismatch {
        operator: String,
        operands: String,
        #[help]
        help: Option<String>,
    },

    #[error("Evaluation error: {message}")]
    #[diagnostic(code(iq::eval))]
    Eval {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Dimension mismatch: {width}x{height} combined with {other_width}x{other_height}")]
    #[diagnostic(code(iq::dims))]
    DimensionMismatch {
        width: usize,
        height: usize,
        other_width: usize,
        other_height: usize,
        #[help]
        help: Option<String>,
    },

    #[error("Resource limit exceeded: {message}")]
    #[diagnostic(code(iq::limit))]
    ResourceLimit {
        message: String,
        #[help]
        help: Option<String>,
    },
}

pub type Result<T> = std::result::Result<T, IqError>;
