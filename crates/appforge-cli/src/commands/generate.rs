//! `appforge generate` — Generate build and deployment objects.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, CommandFactory};

use appforge_common::constants;
use appforge_generate::{AppGenerator, BuildMode, SignalFileDetector};

use crate::catalog::FileCatalog;
use crate::output::{self, OutputFormat};

/// Arguments for the `generate` command.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Source code locations, image names, or KEY=VALUE assignments,
    /// classified automatically.
    pub tokens: Vec<String>,

    /// Source code location to build (directory or repository URL).
    #[arg(long)]
    pub code: Vec<String>,

    /// Image stream to deploy or build on.
    #[arg(short, long)]
    pub image: Vec<String>,

    /// Registry image to deploy or build on.
    #[arg(long)]
    pub registry_image: Vec<String>,

    /// Components to deploy together, joined with '+' (e.g. web+db).
    #[arg(long)]
    pub group: Vec<String>,

    /// Environment variable passed to each deployed component.
    #[arg(short, long)]
    pub env: Vec<String>,

    /// Force the build strategy: docker or source.
    #[arg(long)]
    pub build: Option<BuildMode>,

    /// Output format for the generated object list.
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub output: OutputFormat,
}

/// Executes the `generate` command.
///
/// # Errors
///
/// Returns an error when tokens cannot be classified, resolution or
/// pipeline assembly fails, or the result cannot be serialized.
#[allow(clippy::print_stdout)]
pub fn execute(args: GenerateArgs, data_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let (streams, registry, local) = match data_dir {
        Some(dir) => (
            dir.join(constants::STREAM_CATALOG_FILE),
            dir.join(constants::REGISTRY_CATALOG_FILE),
            dir.join(constants::LOCAL_CATALOG_FILE),
        ),
        None => (
            constants::default_stream_catalog(),
            constants::default_registry_catalog(),
            constants::default_local_catalog(),
        ),
    };
    tracing::debug!(registry = %registry.display(), "loading image catalogs");

    let registry = FileCatalog::open(registry);
    let mut generator = AppGenerator::new(
        Arc::new(FileCatalog::open(streams)),
        Arc::new(registry.clone()),
        Arc::new(FileCatalog::open(local)),
        Box::new(registry),
        Box::new(SignalFileDetector),
    );

    generator.source_repositories = args.code;
    generator.image_streams = args.image;
    generator.registry_images = args.registry_image;
    generator.groups = args.group;
    generator.environment = args.env;
    generator.build_mode = args.build;

    let unknown = generator.add_arguments(&args.tokens);
    if !unknown.is_empty() {
        bail!("unable to classify arguments: {}", unknown.join(", "));
    }

    let list = generator.run(|| {
        let _ = crate::commands::Cli::command().print_help();
    })?;

    if let Some(list) = list {
        let rendered =
            output::render(&list, args.output).context("serializing the object list")?;
        println!("{rendered}");
    }
    Ok(())
}
