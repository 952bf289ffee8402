//! Versioned schema for the session database.

use rusqlite::{params, Connection};
use tracing::info;

use mindwell_core::error::MindwellError;

/// `(version, name, sql)` in ascending version order.
const MIGRATIONS: &[(i64, &str, &str)] = &[(
    1,
    "chatbot_sessions",
    "CREATE TABLE IF NOT EXISTS chatbot_sessions (
        thread_id       TEXT PRIMARY KEY NOT NULL,
        user_id         TEXT NOT NULL,
        snapshot_at     TEXT NOT NULL,
        message_count   INTEGER NOT NULL DEFAULT 0,
        messages        TEXT NOT NULL DEFAULT '[]',
        diagnosis       TEXT NOT NULL DEFAULT '{}',
        created_at      INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
        updated_at      INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
    );
    CREATE INDEX IF NOT EXISTS idx_chatbot_sessions_user
        ON chatbot_sessions (user_id);
    CREATE INDEX IF NOT EXISTS idx_chatbot_sessions_updated
        ON chatbot_sessions (updated_at DESC);",
)];

fn migration_err(context: &str, e: rusqlite::Error) -> MindwellError {
    MindwellError::Storage(format!("{}: {}", context, e))
}

/// Bring `conn` up to the latest schema version.
pub fn run_migrations(conn: &Connection) -> Result<(), MindwellError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| migration_err("create schema_migrations", e))?;

    let applied: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_migrations", [], |row| {
            row.get(0)
        })
        .map_err(|e| migration_err("read schema version", e))?;

    for &(version, name, sql) in MIGRATIONS.iter().filter(|(v, _, _)| *v > applied) {
        conn.execute_batch(sql)
            .map_err(|e| migration_err(&format!("migration v{}", version), e))?;
        conn.execute(
            "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
            params![version, name],
        )
        .map_err(|e| migration_err(&format!("record migration v{}", version), e))?;
        info!(version, migration = name, "Schema migration applied");
    }
    Ok(())
}
