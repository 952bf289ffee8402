//! Mindwell chat crate - drives one conversational turn.
//!
//! Connects a `Session` to the external conversational model and context
//! retriever: streams the reply to the caller, executes the model's tool
//! calls, records the finished turn, and persists it.

pub mod context;
pub mod error;
pub mod mock;
pub mod model;
pub mod orchestrator;
pub mod prompt;
pub mod reply;
pub mod retriever;
pub mod tools;

pub use context::AppContext;
pub use error::ChatError;
pub use model::{
    ConversationalModel, ModelEvent, ModelStream, ToolCall, TranscriptEntry, TurnRequest,
};
pub use orchestrator::{ChatOrchestrator, TurnOutcome};
pub use reply::{ReplyAssembler, ReplyEvent, ReplySink};
pub use retriever::{ContextRetriever, SourceDocument};
pub use tools::{ToolDefinition, ToolExecutor};
