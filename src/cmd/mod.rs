pub mod emit_config;
pub mod run;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Recursive DNS resolver that walks the hierarchy from a configured root
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "/etc/hopward/config.json", env = "CONFIG_PATH")]
    config_path: PathBuf,
    /// Raise the tracing filter to debug
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    inner: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    EmitConfig(emit_config::Command),
    Run(run::Command),
}

impl Args {
    pub async fn run(self) -> i32 {
        crate::init_logs(self.verbose);
        match self.inner {
            Commands::EmitConfig(inner) => inner.run(),
            Commands::Run(inner) => inner.run(&self.config_path).await,
        }
    }
}
