//! One pretty-printed JSON file per session.
//!
//! Records live at `{chats_dir}/{user_id}_{thread_id}.json`. Writes go to a
//! hidden temporary file first and are renamed into place, so a reader sees
//! either the previous snapshot or the new one.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use mindwell_core::error::{MindwellError, Result};
use mindwell_core::types::{SessionKey, SessionRecord};

use crate::store::{ensure_key_matches, SessionStore};

/// File-backed session store.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record for `key`.
    pub fn path_for(&self, key: &SessionKey) -> Result<PathBuf> {
        validate_component(&key.user_id)?;
        validate_component(&key.thread_id)?;
        Ok(self.dir.join(format!("{}.json", key.file_stem())))
    }
}

impl SessionStore for JsonFileStore {
    fn get(&self, key: &SessionKey) -> Result<Option<SessionRecord>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            debug!(path = %path.display(), "No chat history on disk");
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)?;
        let record = parse_record(&content, &path)?;

        if record.user_id != key.user_id || record.thread_id != key.thread_id {
            return Err(MindwellError::MalformedRecord {
                key: key.to_string(),
                reason: format!(
                    "file holds {}/{} instead",
                    record.user_id, record.thread_id
                ),
            });
        }

        info!(path = %path.display(), messages = record.messages.len(), "Chat history loaded");
        Ok(Some(record))
    }

    fn put(&self, key: &SessionKey, record: &SessionRecord) -> Result<()> {
        ensure_key_matches(key, record)?;
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;

        let body = serde_json::to_string_pretty(record)?;
        let tmp = self.dir.join(format!(".{}.json.tmp", key.file_stem()));
        std::fs::write(&tmp, body)?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }

        info!(path = %path.display(), messages = record.message_count, "Chat history saved");
        if let Some(diagnosis) = &record.diagnosis {
            info!(score = %diagnosis.score, "Diagnosis data saved");
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "json"
    }
}

/// Parse a record file, mapping any decode failure to `MalformedRecord`.
pub(crate) fn parse_record(content: &str, path: &Path) -> Result<SessionRecord> {
    let record: SessionRecord =
        serde_json::from_str(content).map_err(|e| MindwellError::MalformedRecord {
            key: path.display().to_string(),
            reason: e.to_string(),
        })?;
    if !record.is_consistent() {
        warn!(
            path = %path.display(),
            message_count = record.message_count,
            messages = record.messages.len(),
            "Stored message_count disagrees with history length"
        );
    }
    Ok(record)
}

/// Key parts become file names, so they must not escape the chats directory.
fn validate_component(part: &str) -> Result<()> {
    if part.is_empty()
        || part == "."
        || part == ".."
        || part.contains(['/', '\\', '\0'])
    {
        return Err(MindwellError::Storage(format!(
            "invalid session key component: {:?}",
            part
        )));
    }
    Ok(())
}
