//! slo-builder - Build Prometheus SLO rule groups from declarative SLO templates.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use slo_builder::cli::{Cli, Command, LogFormat};
use slo_builder::{Pipeline, TemplateRegistry, load_definitions, registry};

/// Initialize the tracing subscriber with the specified log format.
///
/// Logs always go to stderr; stdout carries the generated rule file.
fn init_logging(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    match format {
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(filter)
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .flatten_event(true)
                .with_env_filter(filter)
                .init();
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    if let Err(e) = run(cli.command) {
        error!(error = %format!("{:#}", e), "slo-builder failed");
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    let registry = registry::initialize().context("failed to register templates")?;

    match command {
        Command::ListTemplates => {
            for name in registry.names() {
                println!("{}", name);
            }
            Ok(())
        }
        Command::Build {
            name,
            output,
            definitions,
        } => build(registry, &name, output.as_deref(), &definitions),
    }
}

fn build(
    registry: &TemplateRegistry,
    name: &str,
    output: Option<&Path>,
    definitions: &[PathBuf],
) -> Result<()> {
    let slos = load_definitions(definitions, registry)
        .context("failed to load slos from definition files")?;

    let mut pipeline = Pipeline::new(name);
    pipeline.register_all(&slos)?;

    let groups_yaml = pipeline
        .build(registry)
        .to_yaml()
        .context("failed to generate groups YAML")?;

    match output {
        Some(path) => {
            std::fs::write(path, &groups_yaml)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(output = %path.display(), slos = slos.len(), "Wrote rule group");
        }
        None => print!("{}", groups_yaml),
    }
    Ok(())
}
