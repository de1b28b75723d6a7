//! cmake-bridge CLI - Convert CMake subprojects into build statements

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cmake_bridge::util::diagnostic::{emit, Diagnostic};

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color && std::io::stderr().is_terminal();

    if let Err(e) = run(cli) {
        emit(&Diagnostic::from_error(&e), color);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("cmake_bridge=debug")
    } else {
        EnvFilter::new("cmake_bridge=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    // Execute command
    match cli.command {
        Commands::Convert(args) => commands::convert::execute(args),
        Commands::Translate(args) => commands::translate::execute(args),
        Commands::Codemodel(args) => commands::codemodel::execute(args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
