//! Deterministic model and retriever for tests and local runs.
//!
//! `ScriptedModel` replays queued rounds of events in order and records
//! every request it receives. `StaticRetriever` returns a fixed document
//! list (or a fixed error).

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::Value;

use crate::error::ChatError;
use crate::model::{ConversationalModel, ModelEvent, ModelStream, ToolCall, TurnRequest};
use crate::retriever::{ContextRetriever, SourceDocument};

/// A text fragment event.
pub fn text(fragment: impl Into<String>) -> ModelEvent {
    ModelEvent::TextDelta(fragment.into())
}

/// A tool call event.
pub fn tool_call(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> ModelEvent {
    ModelEvent::ToolCall(ToolCall {
        id: id.into(),
        name: name.into(),
        arguments,
    })
}

enum Round {
    Events(Vec<ModelEvent>),
    /// Yields the events, then fails mid-stream.
    BreaksAfter(Vec<ModelEvent>, String),
    /// Fails before streaming anything.
    Refuses(String),
}

/// Model that answers each invocation with the next queued round.
#[derive(Default)]
pub struct ScriptedModel {
    rounds: Mutex<VecDeque<Round>>,
    requests: Mutex<Vec<TurnRequest>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a round that streams `events` and ends normally.
    pub fn push_round(&self, events: Vec<ModelEvent>) {
        self.push(Round::Events(events));
    }

    /// Queue a round that streams `events` and then errors.
    pub fn push_broken_round(&self, events: Vec<ModelEvent>, error: impl Into<String>) {
        self.push(Round::BreaksAfter(events, error.into()));
    }

    /// Queue an invocation that fails outright.
    pub fn push_refusal(&self, error: impl Into<String>) {
        self.push(Round::Refuses(error.into()));
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<TurnRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn remaining_rounds(&self) -> usize {
        self.rounds.lock().map(|r| r.len()).unwrap_or(0)
    }

    fn push(&self, round: Round) {
        self.rounds
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(round);
    }
}

#[async_trait]
impl ConversationalModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn stream_reply(&self, request: TurnRequest) -> Result<ModelStream, ChatError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);
        let round = self
            .rounds
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        let items: Vec<Result<ModelEvent, ChatError>> = match round {
            Some(Round::Events(events)) => events.into_iter().map(Ok).collect(),
            Some(Round::BreaksAfter(events, error)) => events
                .into_iter()
                .map(Ok)
                .chain(std::iter::once(Err(ChatError::Model(error))))
                .collect(),
            Some(Round::Refuses(error)) => return Err(ChatError::Model(error)),
            None => return Err(ChatError::Model("no scripted reply left".to_string())),
        };
        Ok(stream::iter(items).boxed())
    }
}

/// Retriever over a fixed list of documents.
#[derive(Default)]
pub struct StaticRetriever {
    docs: Vec<SourceDocument>,
    failure: Option<String>,
    queries: Mutex<Vec<(String, usize)>>,
}

impl StaticRetriever {
    pub fn new(docs: Vec<SourceDocument>) -> Self {
        Self {
            docs,
            ..Self::default()
        }
    }

    /// A retriever whose every search fails with `error`.
    pub fn failing(error: impl Into<String>) -> Self {
        Self {
            failure: Some(error.into()),
            ..Self::default()
        }
    }

    /// `(query, k)` of every search so far.
    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ContextRetriever for StaticRetriever {
    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<SourceDocument>, ChatError> {
        self.queries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((query.to_string(), k));
        if let Some(error) = &self.failure {
            return Err(ChatError::Retrieval(error.clone()));
        }
        Ok(self.docs.iter().take(k).cloned().collect())
    }
}
