//! Mindwell storage crate - local session persistence and the remote mirror.
//!
//! Provides the `SessionStore` keyed-store abstraction with JSON-file,
//! SQLite, and in-memory backends, the HTTP client that mirrors sessions to
//! the remote document-database API, and a read-only archive over the JSON
//! chat directory.

pub mod archive;
pub mod db;
pub mod json_store;
pub mod migrations;
pub mod remote;
pub mod sqlite_store;
pub mod store;

use std::path::Path;
use std::sync::Arc;

use mindwell_core::config::{StorageBackend, StorageConfig};
use mindwell_core::error::Result;

pub use archive::{ArchiveEntry, ArchiveStats, ChatArchive};
pub use db::Database;
pub use json_store::JsonFileStore;
pub use remote::{MirrorReport, MirrorStatus, RemoteMirror};
pub use sqlite_store::SqliteSessionStore;
pub use store::{MemoryStore, SessionStore};

/// Open the backend selected in configuration.
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn SessionStore>> {
    let store: Arc<dyn SessionStore> = match config.backend {
        StorageBackend::Json => Arc::new(JsonFileStore::new(&config.chats_dir)),
        StorageBackend::Sqlite => {
            let db = Database::new(Path::new(&config.sqlite_path))?;
            Arc::new(SqliteSessionStore::new(Arc::new(db)))
        }
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
    };
    tracing::info!(backend = store.backend_name(), "Session store opened");
    Ok(store)
}
