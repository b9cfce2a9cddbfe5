//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    list::ListArgs,
    remove::RemoveArgs,
    score::ScoreArgs,
    show::ShowArgs,
    trace::TraceCommands,
    validate::ValidateArgs,
};

#[derive(Parser)]
#[command(name = "dhf")]
#[command(author, version, about = "Pocket DHF - device history file toolkit")]
#[command(
    long_about = "A traceability and risk scoring toolkit for device history files kept as plain-text YAML."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Path to the DHF data file
    #[arg(long, short = 'd', global = true, env = "DHF_DATA_FILE", default_value = "dhf_data.yaml")]
    pub data_file: PathBuf,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate referential and hierarchical integrity of the data file
    Validate(ValidateArgs),

    /// Compute RBM and residual risk scores for every risk
    Score(ScoreArgs),

    /// List entities of a class
    List(ListArgs),

    /// Show a single entity as YAML
    Show(ShowArgs),

    /// Remove an entity and persist the data file (refused while other
    /// records still reference it)
    Remove(RemoveArgs),

    /// Traceability queries
    #[command(subcommand)]
    Trace(TraceCommands),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Markdown-style table
    #[default]
    Table,
    /// JSON (for programming)
    Json,
    /// YAML (full fidelity)
    Yaml,
    /// Just IDs, one per line
    Id,
}
