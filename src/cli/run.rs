//! The iq command implementation.
//!
//! Reads the input image, runs the pipeline, and writes the result. The
//! `--check` and `--dump-ast` flags stop after parsing.

use crate::cli::Cli;
use crate::error::{IqError, Result};
use crate::output::{display_path, Printer};
use crate::parser::parse_program;
use crate::pipeline::{process_with_trace, TraceSink};
use crate::render::{read_image, write_png};

/// Routes pipeline diagnostics to the terminal printer.
struct StatusTrace<'a>(&'a Printer);

impl TraceSink for StatusTrace<'_> {
    fn trace(&self, message: &str) {
        self.0.status("Running", message);
    }
}

pub fn run(args: Cli) -> Result<()> {
    let printer = Printer::new();

    if args.dump_ast || args.check {
        let program = parse_program(&args.program)?;

        if args.dump_ast {
            let json = serde_json::to_string_pretty(&program).map_err(|e| IqError::Io {
                path: "<stdout>".into(),
                message: format!("Failed to serialize AST: {}", e),
            })?;
            println!("{}", json);
        } else {
            let n = program.statements.len();
            let noun = if n == 1 { "statement" } else { "statements" };
            printer.success("Checked", &format!("{} {}", n, noun));
        }
        return Ok(());
    }

    // clap guarantees the path is present outside --check/--dump-ast.
    let file = args.file.as_deref().ok_or_else(|| IqError::Eval {
        message: "no input image given".to_string(),
        help: None,
    })?;

    let image = read_image(file)?;
    let output = process_with_trace(&image, &args.program, &StatusTrace(&printer))?;
    write_png(&output, &args.output)?;

    printer.success(
        "Finished",
        &format!(
            "{}x{} image to {}",
            output.width(),
            output.height(),
            display_path(&args.output)
        ),
    );

    Ok(())
}
