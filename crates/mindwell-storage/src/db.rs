//! Shared SQLite handle for the `sqlite` session backend.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::info;

use mindwell_core::error::MindwellError;

use crate::migrations;

const PRAGMAS: &str = "PRAGMA journal_mode = WAL;
                       PRAGMA synchronous = NORMAL;";

fn sqlite_err(context: &str, e: rusqlite::Error) -> MindwellError {
    MindwellError::Storage(format!("{}: {}", context, e))
}

/// One connection, migrated to the current session schema.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn new(path: &Path) -> Result<Self, MindwellError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(|e| sqlite_err("open session database", e))?;
        conn.execute_batch(PRAGMAS)
            .map_err(|e| sqlite_err("configure session database", e))?;
        let db = Self::migrated(conn)?;
        info!(path = %path.display(), "Session database ready");
        Ok(db)
    }

    pub fn in_memory() -> Result<Self, MindwellError> {
        let conn =
            Connection::open_in_memory().map_err(|e| sqlite_err("open in-memory database", e))?;
        Self::migrated(conn)
    }

    fn migrated(conn: Connection) -> Result<Self, MindwellError> {
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run `f` while holding the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, MindwellError>
    where
        F: FnOnce(&Connection) -> Result<T, MindwellError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| MindwellError::Storage(format!("session database lock poisoned: {}", e)))?;
        f(&conn)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}
