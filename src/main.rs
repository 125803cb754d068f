use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use dockyard::cli::{self, CliArgs, Command};
use dockyard::config::LayoutConfig;

fn main() -> Result<ExitCode> {
    dockyard::tracing::init();

    let args = CliArgs::parse();
    let config = LayoutConfig::load();

    match args.command {
        Command::Validate { file } => {
            let file = cli::resolve_file(file)?;
            let document = cli::load_document(&file)?;
            let problems = cli::validate(&document, &config);
            if problems.is_empty() {
                println!("{}: ok", file.display());
                return Ok(ExitCode::SUCCESS);
            }
            for problem in &problems {
                eprintln!("{}: {}", file.display(), problem);
            }
            Ok(ExitCode::FAILURE)
        }
        Command::Inspect { file } => {
            let file = cli::resolve_file(file)?;
            let document = cli::load_document(&file)?;
            print!("{}", cli::inspect(&document));
            Ok(ExitCode::SUCCESS)
        }
    }
}
