//! The four-stage pipeline: tokenize, parse, evaluate, composite.
//!
//! Each `process` call is independent and reentrant; no state survives the
//! call. Stages run sequentially and fail fast, surfacing the first error.

use crate::error::Result;
use crate::eval::evaluate;
use crate::parser::{ast_from_tokens, tokens_from_program};
use crate::render::combine_layers;
use crate::types::PixelBuffer;

/// Injectable diagnostic sink.
///
/// The pipeline emits a single trace of the received program text at the
/// start of processing; callers decide where it goes (the CLI routes it to
/// the terminal printer, the library default discards it).
pub trait TraceSink {
    fn trace(&self, message: &str);
}

/// A sink that discards all diagnostics.
pub struct NullTrace;

impl TraceSink for NullTrace {
    fn trace(&self, _message: &str) {}
}

/// Run a program against an image, producing the composited buffer.
pub fn process(image: &PixelBuffer, program: &str) -> Result<PixelBuffer> {
    process_with_trace(image, program, &NullTrace)
}

/// Like [`process`], with diagnostics routed to the given sink.
pub fn process_with_trace(
    image: &PixelBuffer,
    program: &str,
    sink: &dyn TraceSink,
) -> Result<PixelBuffer> {
    sink.trace(&format!("{:?}", program));

    let tokens = tokens_from_program(program)?;
    let ast = ast_from_tokens(&tokens)?;
    let layers = evaluate(image, &ast)?;
    combine_layers(&layers)
}
