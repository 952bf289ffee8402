//! Keyed session store abstraction.
//!
//! Every backend exposes the same two operations, `get` and `put`, keyed by
//! `SessionKey`. `put` is a full-snapshot overwrite, never an append.

use std::collections::HashMap;
use std::sync::Mutex;

use mindwell_core::error::{MindwellError, Result};
use mindwell_core::types::{SessionKey, SessionRecord};

/// Durable (or not) home of session snapshots.
pub trait SessionStore: Send + Sync {
    /// Load the record stored under `key`.
    ///
    /// Returns `Ok(None)` when nothing is stored and
    /// `MindwellError::MalformedRecord` when something is stored but unreadable.
    fn get(&self, key: &SessionKey) -> Result<Option<SessionRecord>>;

    /// Replace whatever is stored under `key` with `record`.
    fn put(&self, key: &SessionKey, record: &SessionRecord) -> Result<()>;

    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;
}

/// Reject a record whose identity does not match the key it is written under.
pub(crate) fn ensure_key_matches(key: &SessionKey, record: &SessionRecord) -> Result<()> {
    if record.user_id != key.user_id || record.thread_id != key.thread_id {
        return Err(MindwellError::Storage(format!(
            "record for {}/{} written under key {}",
            record.user_id, record.thread_id, key
        )));
    }
    Ok(())
}

/// Process-local store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<SessionKey, SessionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &SessionKey) -> Result<Option<SessionRecord>> {
        let records = self
            .records
            .lock()
            .map_err(|e| MindwellError::Storage(format!("memory store lock poisoned: {}", e)))?;
        Ok(records.get(key).cloned())
    }

    fn put(&self, key: &SessionKey, record: &SessionRecord) -> Result<()> {
        ensure_key_matches(key, record)?;
        let mut records = self
            .records
            .lock()
            .map_err(|e| MindwellError::Storage(format!("memory store lock poisoned: {}", e)))?;
        records.insert(key.clone(), record.clone());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindwell_core::types::{ChatMessage, Diagnosis};

    fn key() -> SessionKey {
        SessionKey::new("user_0a1b2c3d", "0a1b2c3d-1111-2222-3333-444455556666")
    }

    #[test]
    fn test_get_missing_returns_none() {
        let store = MemoryStore::new();
        assert!(store.get(&key()).unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_put_then_get() {
        let store = MemoryStore::new();
        let record = SessionRecord::snapshot(&key(), &[ChatMessage::user("hello")], None);
        store.put(&key(), &record).unwrap();
        assert_eq!(store.get(&key()).unwrap(), Some(record));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_put_overwrites_previous_snapshot() {
        let store = MemoryStore::new();
        let first = SessionRecord::snapshot(&key(), &[ChatMessage::user("one")], None);
        store.put(&key(), &first).unwrap();

        let diagnosis = Diagnosis::new("3/10", "calm", "No concern");
        let second = SessionRecord::snapshot(
            &key(),
            &[ChatMessage::user("one"), ChatMessage::assistant("two")],
            Some(&diagnosis),
        );
        store.put(&key(), &second).unwrap();

        let loaded = store.get(&key()).unwrap().unwrap();
        assert_eq!(loaded.message_count, 2);
        assert_eq!(loaded.diagnosis, Some(diagnosis));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_put_rejects_mismatched_key() {
        let store = MemoryStore::new();
        let record = SessionRecord::snapshot(&key(), &[], None);
        let other = SessionKey::new("user_ffffffff", "ffffffff-0000");
        let result = store.put(&other, &record);
        assert!(matches!(result, Err(MindwellError::Storage(_))));
        assert!(store.is_empty());
    }
}
