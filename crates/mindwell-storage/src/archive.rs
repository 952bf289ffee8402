//! Read-only view over a directory of JSON chat records.
//!
//! Backs the `mindwell` viewer commands. A file that cannot be read is
//! logged and skipped so one bad record never hides the rest.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::warn;

use mindwell_core::error::{MindwellError, Result};
use mindwell_core::types::SessionRecord;

use crate::json_store::parse_record;

/// One record file and its contents.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub file_name: String,
    pub record: SessionRecord,
}

/// Aggregate numbers over the whole archive.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveStats {
    pub sessions: usize,
    pub unique_users: usize,
    pub total_messages: usize,
}

impl ArchiveStats {
    /// Mean messages per chat, or `None` for an empty archive.
    pub fn average_messages(&self) -> Option<f64> {
        if self.sessions == 0 {
            None
        } else {
            Some(self.total_messages as f64 / self.sessions as f64)
        }
    }
}

/// Directory of `{user_id}_{thread_id}.json` records.
#[derive(Debug, Clone)]
pub struct ChatArchive {
    dir: PathBuf,
}

impl ChatArchive {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Every readable record, ordered by file name.
    pub fn entries(&self) -> Result<Vec<ArchiveEntry>> {
        let mut paths = self.record_paths()?;
        paths.sort();
        Ok(paths.iter().filter_map(|p| load_entry(p)).collect())
    }

    /// Records whose file name starts with `user_id`.
    pub fn for_user(&self, user_id: &str) -> Result<Vec<ArchiveEntry>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|e| e.file_name.starts_with(user_id))
            .collect())
    }

    /// One record by file stem, with or without the `.json` extension.
    pub fn open(&self, name: &str) -> Result<Option<ArchiveEntry>> {
        let candidates = [self.dir.join(format!("{}.json", name)), self.dir.join(name)];
        for path in candidates {
            if path.is_file() {
                let content = std::fs::read_to_string(&path)?;
                let record = parse_record(&content, &path)?;
                return Ok(Some(ArchiveEntry {
                    file_name: file_name_of(&path),
                    record,
                }));
            }
        }
        Ok(None)
    }

    pub fn stats(&self) -> Result<ArchiveStats> {
        let entries = self.entries()?;
        let users: HashSet<&str> = entries.iter().map(|e| e.record.user_id.as_str()).collect();
        Ok(ArchiveStats {
            sessions: entries.len(),
            unique_users: users.len(),
            total_messages: entries.iter().map(|e| e.record.message_count).sum(),
        })
    }

    fn record_paths(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_json = path.extension().is_some_and(|ext| ext == "json");
            let hidden = file_name_of(&path).starts_with('.');
            if is_json && !hidden && path.is_file() {
                paths.push(path);
            }
        }
        Ok(paths)
    }
}

fn load_entry(path: &Path) -> Option<ArchiveEntry> {
    let loaded = std::fs::read_to_string(path)
        .map_err(MindwellError::from)
        .and_then(|content| parse_record(&content, path));
    match loaded {
        Ok(record) => Some(ArchiveEntry {
            file_name: file_name_of(path),
            record,
        }),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Skipping unreadable chat record");
            None
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
