//! Conversational model interface.
//!
//! The model itself is an external service. This module fixes what a turn
//! sends to it and what comes back: an ordered stream of text fragments and
//! tool calls, finite and consumed once.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::Serialize;
use serde_json::Value;

use mindwell_core::types::ChatMessage;

use crate::error::ChatError;
use crate::tools::ToolDefinition;

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// One entry of the transcript sent to the model.
///
/// Tool calls and their results exist only within a turn; the stored
/// history holds `Message` entries alone.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptEntry {
    Message(ChatMessage),
    ToolCall(ToolCall),
    ToolResult { call_id: String, content: String },
}

/// Everything the model sees for one invocation.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub thread_id: String,
    pub system_prompt: String,
    pub transcript: Vec<TranscriptEntry>,
    pub tools: Vec<ToolDefinition>,
    /// Set on the first turn of a conversation only.
    pub user_id: Option<String>,
}

/// One item of a streamed reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelEvent {
    TextDelta(String),
    ToolCall(ToolCall),
}

pub type ModelStream = BoxStream<'static, Result<ModelEvent, ChatError>>;

/// A hosted conversational model.
#[async_trait]
pub trait ConversationalModel: Send + Sync {
    /// Short model name for logs.
    fn name(&self) -> &str;

    /// Start a streamed reply to `request`.
    async fn stream_reply(&self, request: TurnRequest) -> Result<ModelStream, ChatError>;
}
