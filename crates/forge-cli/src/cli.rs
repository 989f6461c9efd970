use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "forge-runner", version, about = "Run feedstock recipes on a configurable bakery")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch a feedstock and bake its recipes
    Bake(BakeArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct BakeArgs {
    /// Feedstock location (git URL or local directory)
    #[arg(long)]
    pub repo: String,

    /// Git ref to check out
    #[arg(long = "ref")]
    pub git_ref: Option<String>,

    /// Config file (.json, .toml, .yaml)
    #[arg(short = 'f', long)]
    pub config: Option<PathBuf>,

    /// Emit JSON lines instead of plain text
    #[arg(long)]
    pub json: bool,

    /// Bake only the first units of each recipe
    #[arg(long)]
    pub prune: bool,

    /// Bake only this recipe
    #[arg(long)]
    pub recipe_id: Option<String>,

    /// Explicit job name
    #[arg(long)]
    pub job_name: Option<String>,
}
