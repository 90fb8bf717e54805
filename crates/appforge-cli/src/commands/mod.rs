//! CLI command definitions and dispatch.

pub mod generate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// appforge — generate deployable application pipelines from code and images.
#[derive(Parser, Debug)]
#[command(name = appforge_common::constants::BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding the image catalogs (streams.json, registry.json,
    /// images.json).
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate build and deployment objects from source code, images, or both.
    Generate(generate::GenerateArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Generate(args) => generate::execute(args, cli.data_dir),
    }
}
