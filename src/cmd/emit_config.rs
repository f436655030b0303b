use clap::Args;
use std::path::PathBuf;

/// Writes a fresh default configuration to a path and exits. Always a
/// freshly constructed `Config`, never the currently loaded one.
#[derive(Args, Debug)]
pub struct Command {
    /// Where to write the default configuration
    path: PathBuf,
}

impl Command {
    pub fn run(&self) -> i32 {
        let config = crate::config::Config::default();
        let json = match serde_json::to_string_pretty(&config) {
            Ok(json) => json,
            Err(error) => {
                tracing::error!(?error, "unable to serialize default config");
                return 1;
            }
        };

        match std::fs::write(&self.path, json) {
            Ok(()) => 0,
            Err(error) => {
                tracing::error!(?error, path = ?self.path, "unable to write config");
                1
            }
        }
    }
}
