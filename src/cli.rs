//! Command-line interface for slo-builder using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::pipeline::DEFAULT_GROUP_NAME;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format (default).
    #[default]
    Text,
    /// Structured JSON format for log aggregation.
    Json,
}

/// Build Prometheus SLO pipelines from SLO templates.
#[derive(Parser, Debug)]
#[command(name = "slo-builder")]
#[command(version)]
#[command(about = "Build Prometheus SLO pipelines from SLO templates")]
pub struct Cli {
    /// Log format: text or json.
    #[arg(
        long = "log-format",
        value_enum,
        default_value_t = LogFormat::Text,
        env = "LOG_FORMAT",
        global = true
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Lists available SLO templates.
    ListTemplates,
    /// Builds the Prometheus rule group from the given SLO definitions.
    Build {
        /// Name of the generated Prometheus rule group.
        #[arg(long = "name", default_value = DEFAULT_GROUP_NAME)]
        name: String,

        /// Write the rule file here instead of stdout.
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,

        /// Files containing lists of SLO template instances.
        #[arg(value_name = "SLO_DEFINITIONS")]
        definitions: Vec<PathBuf>,
    },
}
