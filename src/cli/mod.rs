pub mod run;

use std::path::PathBuf;

use clap::Parser;

/// iq - transform images with a small layer-expression language
#[derive(Parser, Debug)]
#[command(name = "iq")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// The iq program to run, e.g. 'blend(input, invert(input), 0.5)'
    pub program: String,

    /// Input image path (any format the image crate decodes)
    #[arg(required_unless_present_any = ["check", "dump_ast"])]
    pub file: Option<PathBuf>,

    /// Output image path
    #[arg(long, short, default_value = "out.png")]
    pub output: PathBuf,

    /// Parse the program and exit without touching an image
    #[arg(long)]
    pub check: bool,

    /// Print the parsed AST as JSON on stdout and exit
    #[arg(long)]
    pub dump_ast: bool,
}
