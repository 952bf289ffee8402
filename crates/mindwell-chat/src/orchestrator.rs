//! Turn orchestration.
//!
//! `ChatOrchestrator::handle_message` runs one user turn end to end:
//! validate, take the thread's turn lock, record the user turn, stream the
//! model's reply (executing any tool calls it makes), record the assistant
//! turn, persist, and hand the remote mirror off to a background task.

use std::sync::Arc;

use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use mindwell_core::types::ChatMessage;
use mindwell_session::Session;
use mindwell_storage::MirrorReport;

use crate::context::AppContext;
use crate::error::ChatError;
use crate::model::{ModelEvent, TranscriptEntry, TurnRequest};
use crate::prompt::{SYSTEM_PROMPT, TURN_ERROR_MESSAGE, WELCOME_MESSAGE};
use crate::reply::{ReplyAssembler, ReplySink};
use crate::tools::{self, ToolExecutor};

/// Result of one turn that passed validation.
#[derive(Debug)]
pub enum TurnOutcome {
    Completed {
        /// The assistant text recorded for this turn.
        reply: String,
        /// Whether the local snapshot was written.
        persisted: bool,
        /// Background remote mirror for this turn.
        mirror: JoinHandle<MirrorReport>,
    },
    /// The model failed. The user has been shown a generic message.
    Failed { error: String },
}

impl TurnOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TurnOutcome::Completed { .. })
    }
}

/// Drives conversational turns against the application context.
pub struct ChatOrchestrator {
    ctx: AppContext,
}

impl ChatOrchestrator {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    /// Load `thread_id`, or begin a new thread when none is given.
    pub fn open_session(&self, thread_id: Option<&str>) -> Session {
        let key = match thread_id {
            Some(id) => self.ctx.sessions.key_for(id),
            None => self.ctx.sessions.begin_session(),
        };
        self.ctx.sessions.resume_or_create(&key)
    }

    /// Text to show before the first message of a new conversation.
    pub fn greeting(&self, session: &Session) -> Option<&'static str> {
        session.is_first_turn().then_some(WELCOME_MESSAGE)
    }

    /// Run one user turn on `session`.
    ///
    /// Validation errors are returned before anything changes. Every later
    /// failure is reported through the sink and the returned outcome.
    ///
    /// Other handles on the same thread are serialized by the turn lock, and
    /// `session` is brought up to date with the store once the lock is held.
    pub async fn handle_message(
        &self,
        session: &mut Session,
        content: &str,
        remote_token: Option<&str>,
        sink: ReplySink,
    ) -> Result<TurnOutcome, ChatError> {
        self.validate(content)?;

        let _turn = self.ctx.sessions.acquire_turn(session.thread_id()).await;
        self.ctx.sessions.refresh(session);
        let first_turn = session.is_first_turn();
        if first_turn {
            info!(
                user_id = %session.user_id(),
                thread_id = %session.thread_id(),
                "New conversation"
            );
        }
        session.record_user_turn(content);

        let mut reply = ReplyAssembler::new(sink);
        if let Err(e) = self.run_model(session, first_turn, &mut reply).await {
            error!(thread_id = %session.thread_id(), error = %e, "Turn failed");
            reply.fail(TURN_ERROR_MESSAGE);
            return Ok(TurnOutcome::Failed {
                error: e.to_string(),
            });
        }

        let text = reply.finish();
        if text.is_empty() {
            warn!(thread_id = %session.thread_id(), "Model produced an empty reply");
        }
        session.record_assistant_turn(text.clone());

        let (record, persisted) = match self.ctx.sessions.persist(session) {
            Ok(record) => (record, true),
            Err(e) => {
                error!(
                    thread_id = %session.thread_id(),
                    error = %e,
                    "Failed to save session locally"
                );
                (self.ctx.sessions.snapshot(session), false)
            }
        };

        let sessions = Arc::clone(&self.ctx.sessions);
        let token = remote_token.map(str::to_string);
        let mirror = tokio::spawn(async move {
            sessions
                .mirror_to_remote(
                    &record.thread_id,
                    &record.messages,
                    record.diagnosis.as_ref(),
                    token.as_deref(),
                )
                .await
        });

        info!(
            thread_id = %session.thread_id(),
            messages = session.history().len(),
            persisted,
            "Message processed"
        );
        Ok(TurnOutcome::Completed {
            reply: text,
            persisted,
            mirror,
        })
    }

    fn validate(&self, content: &str) -> Result<(), ChatError> {
        if content.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let max = self.ctx.config.chat.max_message_length;
        if content.chars().count() > max {
            return Err(ChatError::MessageTooLong(max));
        }
        Ok(())
    }

    /// Invoke the model until it answers without calling tools.
    async fn run_model(
        &self,
        session: &mut Session,
        first_turn: bool,
        reply: &mut ReplyAssembler,
    ) -> Result<(), ChatError> {
        let chat = &self.ctx.config.chat;
        let executor = ToolExecutor::new(self.ctx.retriever.as_ref(), chat);
        let mut transcript: Vec<TranscriptEntry> = session
            .history()
            .iter()
            .cloned()
            .map(TranscriptEntry::Message)
            .collect();

        for round in 0..=chat.max_tool_rounds {
            let request = TurnRequest {
                thread_id: session.thread_id().to_string(),
                system_prompt: SYSTEM_PROMPT.to_string(),
                transcript: transcript.clone(),
                tools: tools::definitions(),
                user_id: first_turn.then(|| session.user_id().to_string()),
            };
            let mut stream = self.ctx.model.stream_reply(request).await?;

            let mut round_text = String::new();
            let mut calls = Vec::new();
            while let Some(event) = stream.next().await {
                match event? {
                    ModelEvent::TextDelta(fragment) => {
                        reply.push(&fragment);
                        round_text.push_str(&fragment);
                    }
                    ModelEvent::ToolCall(call) => calls.push(call),
                }
            }

            if calls.is_empty() {
                return Ok(());
            }
            if round == chat.max_tool_rounds {
                break;
            }

            if !round_text.is_empty() {
                transcript.push(TranscriptEntry::Message(ChatMessage::assistant(round_text)));
            }
            for call in calls {
                info!(tool = %call.name, round, "Executing tool call");
                let output = executor.execute(&call, session).await;
                let call_id = call.id.clone();
                transcript.push(TranscriptEntry::ToolCall(call));
                transcript.push(TranscriptEntry::ToolResult {
                    call_id,
                    content: output,
                });
            }
        }

        Err(ChatError::Model(format!(
            "model kept calling tools after {} rounds",
            chat.max_tool_rounds
        )))
    }
}

// =============================================================================
// Tests
// =============================================================================
