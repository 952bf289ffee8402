//! CLI argument definitions for the `mindwell` binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "MINDWELL_CONFIG";

/// Mindwell - browse saved psychology-support chat sessions.
#[derive(Parser, Debug)]
#[command(name = "mindwell", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Directory of saved chat records.
    #[arg(short = 'd', long = "chats-dir", global = true)]
    pub chats_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List every saved chat (the default).
    List,
    /// Show all chats of one user.
    User { user_id: String },
    /// Show one chat by file name, with or without `.json`.
    View { name: String },
    /// Totals across all saved chats.
    Stats,
    /// Write a default configuration file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

impl CliArgs {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::List)
    }

    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > MINDWELL_CONFIG env var > ~/.mindwell/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var(CONFIG_ENV) {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log filter.
    ///
    /// Priority: --log-level flag > RUST_LOG > config file value.
    /// Returns `None` when RUST_LOG should be used as is.
    pub fn resolve_log_filter(&self, config_level: &str) -> Option<String> {
        if let Some(ref level) = self.log_level {
            return Some(level.clone());
        }
        if std::env::var("RUST_LOG").is_ok() {
            return None;
        }
        Some(if config_level.is_empty() {
            "info".to_string()
        } else {
            config_level.to_string()
        })
    }

    /// Resolve the chats directory.
    ///
    /// Priority: --chats-dir flag > config file value.
    pub fn resolve_chats_dir(&self, config_dir: &str) -> PathBuf {
        self.chats_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(config_dir))
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".mindwell").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".mindwell").join("config.toml");
    }
    PathBuf::from("config.toml")
}
