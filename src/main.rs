use clap::Parser;
use iq::cli::Cli;
use miette::Result;

fn main() -> Result<()> {
    let cli = Cli::parse();

    iq::cli::run::run(cli)?;

    Ok(())
}
