//! SQLite-backed session store.
//!
//! One `chatbot_sessions` row per thread. History and diagnosis are stored
//! as JSON text columns using the same shapes as the JSON-file records.

use std::sync::Arc;

use chrono::Utc;
use rusqlite::OptionalExtension;
use serde_json::Value;

use mindwell_core::error::{MindwellError, Result};
use mindwell_core::types::{SessionKey, SessionRecord};

use crate::db::Database;
use crate::store::{ensure_key_matches, SessionStore};

/// Session store over a shared `Database`.
#[derive(Debug, Clone)]
pub struct SqliteSessionStore {
    db: Arc<Database>,
}

struct SessionRow {
    user_id: String,
    thread_id: String,
    snapshot_at: String,
    message_count: i64,
    messages: String,
    diagnosis: String,
}

impl SqliteSessionStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Thread ids stored for a user, most recently updated first.
    pub fn threads_for_user(&self, user_id: &str) -> Result<Vec<String>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT thread_id FROM chatbot_sessions
                     WHERE user_id = ?1
                     ORDER BY updated_at DESC, thread_id ASC",
                )
                .map_err(|e| MindwellError::Storage(e.to_string()))?;
            let rows = stmt
                .query_map(rusqlite::params![user_id], |row| row.get::<_, String>(0))
                .map_err(|e| MindwellError::Storage(e.to_string()))?;

            let mut threads = Vec::new();
            for row in rows {
                threads.push(row.map_err(|e| MindwellError::Storage(e.to_string()))?);
            }
            Ok(threads)
        })
    }
}

impl SessionStore for SqliteSessionStore {
    fn get(&self, key: &SessionKey) -> Result<Option<SessionRecord>> {
        let row = self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT user_id, thread_id, snapshot_at, message_count, messages, diagnosis
                 FROM chatbot_sessions WHERE thread_id = ?1 AND user_id = ?2",
                rusqlite::params![key.thread_id, key.user_id],
                |row| {
                    Ok(SessionRow {
                        user_id: row.get(0)?,
                        thread_id: row.get(1)?,
                        snapshot_at: row.get(2)?,
                        message_count: row.get(3)?,
                        messages: row.get(4)?,
                        diagnosis: row.get(5)?,
                    })
                },
            )
            .optional()
            .map_err(|e| MindwellError::Storage(format!("Failed to load session: {}", e)))
        })?;

        row.map(|row| row_to_record(key, row)).transpose()
    }

    fn put(&self, key: &SessionKey, record: &SessionRecord) -> Result<()> {
        ensure_key_matches(key, record)?;
        let value = serde_json::to_value(record)?;
        let messages = value["messages"].to_string();
        let diagnosis = value["diagnosis"].to_string();
        let now = Utc::now().timestamp();

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO chatbot_sessions
                     (thread_id, user_id, snapshot_at, message_count, messages, diagnosis,
                      created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
                 ON CONFLICT(thread_id) DO UPDATE SET
                     user_id = excluded.user_id,
                     snapshot_at = excluded.snapshot_at,
                     message_count = excluded.message_count,
                     messages = excluded.messages,
                     diagnosis = excluded.diagnosis,
                     updated_at = excluded.updated_at",
                rusqlite::params![
                    record.thread_id,
                    record.user_id,
                    record.timestamp,
                    record.message_count as i64,
                    messages,
                    diagnosis,
                    now,
                ],
            )
            .map_err(|e| MindwellError::Storage(format!("Failed to save session: {}", e)))?;
            Ok(())
        })?;

        tracing::info!(
            thread_id = %key.thread_id,
            messages = record.message_count,
            "Session row saved"
        );
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

fn row_to_record(key: &SessionKey, row: SessionRow) -> Result<SessionRecord> {
    let malformed = |reason: String| MindwellError::MalformedRecord {
        key: key.to_string(),
        reason,
    };

    let messages: Value = serde_json::from_str(&row.messages)
        .map_err(|e| malformed(format!("messages column: {}", e)))?;
    let diagnosis: Value = serde_json::from_str(&row.diagnosis)
        .map_err(|e| malformed(format!("diagnosis column: {}", e)))?;

    let value = serde_json::json!({
        "user_id": row.user_id,
        "thread_id": row.thread_id,
        "timestamp": row.snapshot_at,
        "message_count": row.message_count.max(0),
        "messages": messages,
        "diagnosis": diagnosis,
    });
    serde_json::from_value(value).map_err(|e| malformed(e.to_string()))
}
