use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{MindwellError, Result};

/// Environment variable that overrides `remote.base_url`.
pub const BACKEND_URL_ENV: &str = "BACKEND_URL";

/// Top-level configuration for Mindwell.
///
/// Loaded from `~/.mindwell/config.toml` by default. Every section falls
/// back to its defaults when absent from the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MindwellConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl MindwellConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: MindwellConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| MindwellError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Apply environment overrides on top of file values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            if !url.trim().is_empty() {
                self.remote.base_url = url;
            }
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Root data directory.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Which local backend holds session records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// One pretty-printed JSON file per session.
    #[default]
    Json,
    /// A `chatbot_sessions` table in SQLite.
    Sqlite,
    /// Process memory only; lost on exit.
    Memory,
}

/// Local persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory of `{user_id}_{thread_id}.json` records.
    pub chats_dir: String,
    /// SQLite database file, used by the `sqlite` backend.
    pub sqlite_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Json,
            chats_dir: "data/chats".to_string(),
            sqlite_path: "data/mindwell.db".to_string(),
        }
    }
}

/// Remote mirror (document database backend) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Whether the mirror step runs at all.
    pub enabled: bool,
    /// Base URL of the backend API, without trailing slash.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Cookie carrying the remote session token.
    pub cookie_name: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: 10,
            cookie_name: "user_session_id".to_string(),
        }
    }
}

/// Conversational turn settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Maximum user message length in characters.
    pub max_message_length: usize,
    /// Number of snippets the retrieve_context tool asks for.
    pub retrieval_k: usize,
    /// Characters of each snippet handed back to the model.
    pub snippet_chars: usize,
    /// Upper bound on model re-invocations after tool calls within one turn.
    pub max_tool_rounds: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_length: 4000,
            retrieval_k: 2,
            snippet_chars: 500,
            max_tool_rounds: 4,
        }
    }
}

/// Session identity settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Literal tag placed before the thread-id prefix.
    pub user_id_prefix: String,
    /// Number of leading thread-id characters used in the user id.
    pub user_id_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_id_prefix: "user_".to_string(),
            user_id_len: 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = MindwellConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.storage.backend, StorageBackend::Json);
        assert_eq!(config.storage.chats_dir, "data/chats");
        assert_eq!(config.remote.base_url, "http://localhost:5000");
        assert_eq!(config.remote.timeout_secs, 10);
        assert_eq!(config.chat.retrieval_k, 2);
        assert_eq!(config.chat.snippet_chars, 500);
        assert_eq!(config.session.user_id_prefix, "user_");
        assert_eq!(config.session.user_id_len, 8);
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
data_dir = "/srv/mindwell"
log_level = "debug"

[storage]
backend = "sqlite"
sqlite_path = "/srv/mindwell/sessions.db"

[remote]
enabled = false
base_url = "https://backend.example.org"
timeout_secs = 3

[chat]
retrieval_k = 4
"#;
        let file = create_temp_config(content);
        let config = MindwellConfig::load(file.path()).unwrap();
        assert_eq!(config.general.data_dir, "/srv/mindwell");
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.storage.sqlite_path, "/srv/mindwell/sessions.db");
        assert!(!config.remote.enabled);
        assert_eq!(config.remote.timeout_secs, 3);
        assert_eq!(config.chat.retrieval_k, 4);
        // Unset fields keep their defaults.
        assert_eq!(config.chat.snippet_chars, 500);
        assert_eq!(config.storage.chats_dir, "data/chats");
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let file = create_temp_config("[storage]\nbackend = \"mongo\"\n");
        let result = MindwellConfig::load(file.path());
        assert!(matches!(result, Err(MindwellError::Config(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = MindwellConfig::load_or_default(Path::new("/nonexistent/mindwell.toml"));
        assert_eq!(config.storage.chats_dir, "data/chats");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = MindwellConfig::default();
        config.chat.max_tool_rounds = 7;
        config.save(&path).unwrap();

        let reloaded = MindwellConfig::load(&path).unwrap();
        assert_eq!(reloaded.chat.max_tool_rounds, 7);
        assert_eq!(reloaded.remote.cookie_name, config.remote.cookie_name);
    }
}
