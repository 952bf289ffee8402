//! Session & Diagnosis Manager.
//!
//! Loads and saves whole-session snapshots through a `SessionStore` and
//! optionally mirrors them to the remote backend. Storage problems on load
//! never surface to the caller: a missing or unreadable record simply
//! yields a new, empty session.

use std::sync::Arc;

use tokio::sync::OwnedMutexGuard;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use mindwell_core::config::{MindwellConfig, SessionConfig};
use mindwell_core::error::{MindwellError, Result};
use mindwell_core::types::{ChatMessage, Diagnosis, SessionKey, SessionRecord};
use mindwell_storage::{open_store, MirrorReport, RemoteMirror, SessionStore};

use crate::locks::TurnLocks;
use crate::session::Session;

/// Owns session identity, loading, persistence, and the remote mirror.
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    mirror: Option<RemoteMirror>,
    config: SessionConfig,
    locks: TurnLocks,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        mirror: Option<RemoteMirror>,
        config: SessionConfig,
    ) -> Self {
        Self {
            store,
            mirror,
            config,
            locks: TurnLocks::new(),
        }
    }

    /// Build the manager described by `config`: the configured store plus
    /// the remote mirror when it is enabled.
    pub fn from_config(config: &MindwellConfig) -> Result<Self> {
        let store = open_store(&config.storage)?;
        let mirror = if config.remote.enabled {
            Some(RemoteMirror::new(&config.remote)?)
        } else {
            info!("Remote mirror disabled");
            None
        };
        Ok(Self::new(store, mirror, config.session.clone()))
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn mirror_enabled(&self) -> bool {
        self.mirror.is_some()
    }

    /// Allocate a fresh thread id and its derived user id. Nothing is written.
    pub fn begin_session(&self) -> SessionKey {
        let key = SessionKey::derive(Uuid::new_v4().to_string(), &self.config);
        debug!(thread_id = %key.thread_id, user_id = %key.user_id, "Session allocated");
        key
    }

    /// Key for an existing thread id under the derived identity scheme.
    pub fn key_for(&self, thread_id: &str) -> SessionKey {
        SessionKey::derive(thread_id, &self.config)
    }

    /// Load the stored state for `key`, or start empty.
    pub fn resume_or_create(&self, key: &SessionKey) -> Session {
        match self.store.get(key) {
            Ok(Some(record)) => {
                info!(
                    thread_id = %key.thread_id,
                    messages = record.messages.len(),
                    has_diagnosis = record.diagnosis.is_some(),
                    "Resuming session"
                );
                Session::restored(key.clone(), record.messages, record.diagnosis)
            }
            Ok(None) => {
                info!(thread_id = %key.thread_id, "Starting new session");
                Session::new(key.clone())
            }
            Err(e @ MindwellError::MalformedRecord { .. }) => {
                warn!(
                    thread_id = %key.thread_id,
                    error = %e,
                    "Stored session unreadable, starting empty"
                );
                Session::new(key.clone())
            }
            Err(e) => {
                error!(
                    thread_id = %key.thread_id,
                    error = %e,
                    "Failed to load session, starting empty"
                );
                Session::new(key.clone())
            }
        }
    }

    /// Record a new assessment on `session`, replacing any prior one.
    pub fn update_diagnosis(
        &self,
        session: &mut Session,
        score: &str,
        content: &str,
        total_guess: &str,
    ) -> Diagnosis {
        session.update_diagnosis(score, content, total_guess)
    }

    /// The persisted shape of `session` as of now.
    pub fn snapshot(&self, session: &Session) -> SessionRecord {
        SessionRecord::snapshot(session.key(), session.history(), session.diagnosis())
    }

    /// Reload `session` if another handle saved the thread since it last
    /// read or wrote the record. Call with the turn guard held.
    ///
    /// Local turns that were never saved are dropped when the stored record
    /// moved on. A store error keeps the local state.
    pub fn refresh(&self, session: &mut Session) {
        match self.store.get(session.key()) {
            Ok(Some(record)) if record.messages.len() != session.stored_len() => {
                info!(
                    thread_id = %session.thread_id(),
                    stored = record.messages.len(),
                    local = session.history().len(),
                    "Session saved by another turn, reloading"
                );
                session.adopt(record.messages, record.diagnosis);
            }
            Ok(_) => {}
            Err(e) => {
                warn!(
                    thread_id = %session.thread_id(),
                    error = %e,
                    "Could not refresh session, keeping local state"
                );
            }
        }
    }

    /// Overwrite the stored record with the full current state.
    pub fn persist(&self, session: &mut Session) -> Result<SessionRecord> {
        let record = self.snapshot(session);
        self.store.put(session.key(), &record)?;
        session.mark_stored();
        debug!(
            thread_id = %session.thread_id(),
            backend = self.store.backend_name(),
            messages = record.message_count,
            "Session persisted"
        );
        Ok(record)
    }

    /// Forward a session to the remote backend.
    ///
    /// Skipped with a warning when there is no remote session token. Never
    /// fails: the outcome of each request is in the returned report.
    pub async fn mirror_to_remote(
        &self,
        thread_id: &str,
        messages: &[ChatMessage],
        diagnosis: Option<&Diagnosis>,
        token: Option<&str>,
    ) -> MirrorReport {
        let Some(mirror) = &self.mirror else {
            debug!(thread_id, "Remote mirror disabled, skipping");
            return MirrorReport::skipped();
        };
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            warn!(thread_id, "No remote session token, skipping backend save");
            return MirrorReport::skipped();
        };
        mirror.mirror(thread_id, messages, diagnosis, token).await
    }

    /// Serialize turns on one thread. Hold the guard for the whole turn.
    pub async fn acquire_turn(&self, thread_id: &str) -> OwnedMutexGuard<()> {
        self.locks.acquire(thread_id).await
    }
}

// =============================================================================
// Tests
// =============================================================================
