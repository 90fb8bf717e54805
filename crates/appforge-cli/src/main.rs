//! # appforge — application pipeline generator CLI
//!
//! Turns source locations, image names, and environment assignments into
//! a deployable object list, printed as YAML or JSON.

mod catalog;
mod commands;
mod output;

use clap::Parser;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
        )
        .init();

    let cli = Cli::parse();
    commands::execute(cli)
}
