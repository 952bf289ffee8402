//! Application context built once at startup.
//!
//! Holds the configuration, the session manager, and the external model and
//! retriever. Everything that runs a turn receives it explicitly.

use std::sync::Arc;

use mindwell_core::config::MindwellConfig;
use mindwell_core::error::Result;
use mindwell_session::SessionManager;

use crate::model::ConversationalModel;
use crate::retriever::ContextRetriever;

/// Shared, cheaply cloneable handles for one running application.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<MindwellConfig>,
    pub sessions: Arc<SessionManager>,
    pub model: Arc<dyn ConversationalModel>,
    pub retriever: Arc<dyn ContextRetriever>,
}

impl AppContext {
    /// Build the session manager from `config` and wire in the collaborators.
    pub fn new(
        config: MindwellConfig,
        model: Arc<dyn ConversationalModel>,
        retriever: Arc<dyn ContextRetriever>,
    ) -> Result<Self> {
        let sessions = SessionManager::from_config(&config)?;
        tracing::info!(
            model = model.name(),
            backend = sessions.store().backend_name(),
            remote = sessions.mirror_enabled(),
            "Application context ready"
        );
        Ok(Self::with_sessions(config, Arc::new(sessions), model, retriever))
    }

    /// Use an already built session manager.
    pub fn with_sessions(
        config: MindwellConfig,
        sessions: Arc<SessionManager>,
        model: Arc<dyn ConversationalModel>,
        retriever: Arc<dyn ContextRetriever>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            sessions,
            model,
            retriever,
        }
    }
}
