//! HTTP client for the remote chatbot backend.
//!
//! Mirrors a session to `POST /api/chatbot/save-conversation` and
//! `POST /api/chatbot/save-diagnosis`, authenticating with the caller's
//! session cookie. Nothing here returns an error to the caller: every
//! outcome is logged and reported as a `MirrorStatus`.

use std::time::Duration;

use reqwest::header::COOKIE;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info, warn};

use mindwell_core::config::RemoteConfig;
use mindwell_core::error::{MindwellError, Result};
use mindwell_core::types::{ChatMessage, Diagnosis};

pub const SAVE_CONVERSATION_PATH: &str = "/api/chatbot/save-conversation";
pub const SAVE_DIAGNOSIS_PATH: &str = "/api/chatbot/save-diagnosis";

/// Outcome of one mirror request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorStatus {
    /// Not attempted (no token, mirror disabled, or nothing to send).
    Skipped,
    /// Backend answered 200.
    Saved,
    /// Backend answered with another status code.
    Rejected { status: u16 },
    /// Transport failure or timeout.
    Failed(String),
}

/// Outcome of mirroring one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorReport {
    pub conversation: MirrorStatus,
    pub diagnosis: MirrorStatus,
}

impl MirrorReport {
    pub fn skipped() -> Self {
        Self {
            conversation: MirrorStatus::Skipped,
            diagnosis: MirrorStatus::Skipped,
        }
    }
}

#[derive(Serialize)]
struct ConversationPayload<'a> {
    #[serde(rename = "threadID")]
    thread_id: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Serialize)]
struct DiagnosisPayload<'a> {
    #[serde(rename = "threadID")]
    thread_id: &'a str,
    score: &'a str,
    content: &'a str,
    #[serde(rename = "totalGuess")]
    total_guess: &'a str,
}

/// Client for the remote chatbot backend.
#[derive(Debug, Clone)]
pub struct RemoteMirror {
    client: Client,
    base_url: String,
    cookie_name: String,
}

impl RemoteMirror {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| MindwellError::Remote(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cookie_name: config.cookie_name.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send the conversation and, if present, the diagnosis.
    pub async fn mirror(
        &self,
        thread_id: &str,
        messages: &[ChatMessage],
        diagnosis: Option<&Diagnosis>,
        token: &str,
    ) -> MirrorReport {
        let conversation = self.save_conversation(thread_id, messages, token).await;
        let diagnosis = match diagnosis {
            Some(d) => self.save_diagnosis(thread_id, d, token).await,
            None => MirrorStatus::Skipped,
        };
        MirrorReport {
            conversation,
            diagnosis,
        }
    }

    pub async fn save_conversation(
        &self,
        thread_id: &str,
        messages: &[ChatMessage],
        token: &str,
    ) -> MirrorStatus {
        let payload = ConversationPayload {
            thread_id,
            messages,
        };
        let status = self.post(SAVE_CONVERSATION_PATH, &payload, token).await;
        log_status("conversation", thread_id, &status);
        status
    }

    pub async fn save_diagnosis(
        &self,
        thread_id: &str,
        diagnosis: &Diagnosis,
        token: &str,
    ) -> MirrorStatus {
        let payload = DiagnosisPayload {
            thread_id,
            score: &diagnosis.score,
            content: &diagnosis.content,
            total_guess: &diagnosis.total_guess,
        };
        let status = self.post(SAVE_DIAGNOSIS_PATH, &payload, token).await;
        log_status("diagnosis", thread_id, &status);
        status
    }

    async fn post<T: Serialize>(&self, path: &str, body: &T, token: &str) -> MirrorStatus {
        let url = format!("{}{}", self.base_url, path);
        let result = self
            .client
            .post(&url)
            .header(COOKIE, format!("{}={}", self.cookie_name, token))
            .json(body)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().as_u16() == 200 => MirrorStatus::Saved,
            Ok(resp) => {
                let status = resp.status().as_u16();
                let text = resp.text().await.unwrap_or_default();
                warn!(url = %url, status, body = %text, "Backend rejected mirror request");
                MirrorStatus::Rejected { status }
            }
            Err(e) => MirrorStatus::Failed(e.to_string()),
        }
    }
}

fn log_status(what: &str, thread_id: &str, status: &MirrorStatus) {
    match status {
        MirrorStatus::Saved => info!(thread_id, "{} saved to backend", what),
        MirrorStatus::Rejected { status } => {
            warn!(thread_id, status, "Backend did not save {}", what)
        }
        MirrorStatus::Failed(e) => {
            error!(thread_id, error = %e, "Failed to save {} to backend", what)
        }
        MirrorStatus::Skipped => {}
    }
}
