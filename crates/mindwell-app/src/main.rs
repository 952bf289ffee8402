//! Mindwell application binary.
//!
//! 1. Parse CLI arguments
//! 2. Initialize tracing
//! 3. Load configuration from TOML
//! 4. Run the requested archive command against the chats directory

mod cli;
mod render;

use std::path::Path;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mindwell_core::config::{MindwellConfig, StorageBackend};
use mindwell_storage::ChatArchive;

use cli::{CliArgs, Command};

fn init_tracing(filter: Option<String>) {
    let env_filter = match filter {
        Some(directives) => {
            EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("info"))
        }
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

/// The archive reads the JSON chats directory only.
fn archive_covers(backend: StorageBackend) -> bool {
    backend == StorageBackend::Json
}

fn write_default_config(path: &Path, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() && !force {
        println!("Config already exists at {} (use --force to overwrite)", path.display());
        return Ok(());
    }
    MindwellConfig::default().save(path)?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config. Loaded before tracing so the file can set the level.
    let config_file = args.resolve_config_path();
    let mut config = MindwellConfig::load_or_default(&config_file);
    config.apply_env_overrides();

    init_tracing(args.resolve_log_filter(&config.general.log_level));
    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        path = %config_file.display(),
        "Configuration loaded"
    );

    let command = args.command();
    if let Command::Init { force } = command {
        return write_default_config(&config_file, force);
    }

    let chats_dir = args.resolve_chats_dir(&config.storage.chats_dir);
    if !archive_covers(config.storage.backend) {
        tracing::warn!(
            backend = ?config.storage.backend,
            dir = %chats_dir.display(),
            "Configured backend is not the JSON store; only JSON chat files are listed"
        );
    }
    let archive = ChatArchive::new(&chats_dir);
    tracing::debug!(dir = %chats_dir.display(), "Reading chat archive");

    match command {
        Command::List => {
            let entries = archive.entries()?;
            if entries.is_empty() {
                println!("No chats found in {}", chats_dir.display());
            } else {
                print!("{}", render::list(&entries));
            }
        }
        Command::User { user_id } => {
            let entries = archive.for_user(&user_id)?;
            if entries.is_empty() {
                println!("No chats found for user: {}", user_id);
            } else {
                println!("\nFound {} chat(s) for {}:", entries.len(), user_id);
                for entry in &entries {
                    print!("{}", render::chat(&entry.record));
                }
            }
        }
        Command::View { name } => match archive.open(&name)? {
            Some(entry) => print!("{}", render::chat(&entry.record)),
            None => println!("Chat file not found: {}", name),
        },
        Command::Stats => {
            let stats = archive.stats()?;
            if stats.sessions == 0 {
                println!("No chats found");
            } else {
                print!("{}", render::stats(&stats));
            }
        }
        Command::Init { .. } => {}
    }

    Ok(())
}
