//! Tools offered to the conversational model.
//!
//! - `retrieve_context(query)` searches the reference index and returns
//!   formatted snippets.
//! - `update_diagnosis(score, content, total_guess)` records an assessment
//!   on the live session.
//!
//! Tool failures are reported back to the model as text. They never fail
//! the turn.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use mindwell_core::config::ChatConfig;
use mindwell_session::Session;

use crate::error::ChatError;
use crate::model::ToolCall;
use crate::retriever::{ContextRetriever, SourceDocument};

pub const RETRIEVE_CONTEXT: &str = "retrieve_context";
pub const UPDATE_DIAGNOSIS: &str = "update_diagnosis";

/// Tool description handed to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema of the arguments object.
    pub parameters: Value,
}

/// Definitions of every tool, in a stable order.
pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: RETRIEVE_CONTEXT.to_string(),
            description: "Search the DSM-5 psychology reference for information matching \
                          the query. Use this to find diagnostic criteria, symptoms, or \
                          treatments."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "What to look up."}
                },
                "required": ["query"]
            }),
        },
        ToolDefinition {
            name: UPDATE_DIAGNOSIS.to_string(),
            description: "Update the internal analysis of the user's mental health state. \
                          Use this once enough information has been gathered to form an assessment."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "score": {
                        "type": "string",
                        "description":
                            "Score of the user's mental health (e.g., anxiety level 1-10)."
                    },
                    "content": {
                        "type": "string",
                        "description": "Summary of the user's mental health state."
                    },
                    "total_guess": {
                        "type": "string",
                        "description": "Overall assessment of the user's mental health."
                    }
                },
                "required": ["score", "content", "total_guess"]
            }),
        },
    ]
}

/// Render search hits the way the model expects to read them.
pub fn format_documents(query: &str, docs: &[SourceDocument], snippet_chars: usize) -> String {
    if docs.is_empty() {
        return format!("No relevant information found for: {}", query);
    }
    let snippets: Vec<String> = docs
        .iter()
        .map(|doc| {
            let content: String = doc.content.chars().take(snippet_chars).collect();
            format!("Source: {}\nContent: {}", doc.metadata, content)
        })
        .collect();
    format!("Retrieved relevant information:\n\n{}", snippets.join("\n\n"))
}

/// Arguments of `update_diagnosis`.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosisArgs {
    pub score: String,
    pub content: String,
    pub total_guess: String,
}

impl DiagnosisArgs {
    /// All three fields must be present and must be strings.
    pub fn parse(arguments: &Value) -> Result<Self, ChatError> {
        let field = |name: &str| -> Result<String, ChatError> {
            match arguments.get(name) {
                Some(Value::String(s)) => Ok(s.clone()),
                Some(_) => Err(ChatError::Tool(format!("'{}' must be a string", name))),
                None => Err(ChatError::Tool(format!("missing required argument '{}'", name))),
            }
        };
        Ok(Self {
            score: field("score")?,
            content: field("content")?,
            total_guess: field("total_guess")?,
        })
    }
}

/// Runs tool calls against the retriever and the live session.
pub struct ToolExecutor<'a> {
    retriever: &'a dyn ContextRetriever,
    config: &'a ChatConfig,
}

impl<'a> ToolExecutor<'a> {
    pub fn new(retriever: &'a dyn ContextRetriever, config: &'a ChatConfig) -> Self {
        Self { retriever, config }
    }

    /// Execute one call and return the text the model will see.
    pub async fn execute(&self, call: &ToolCall, session: &mut Session) -> String {
        match call.name.as_str() {
            RETRIEVE_CONTEXT => match call.arguments.get("query").and_then(Value::as_str) {
                Some(query) => self.retrieve_context(query).await,
                None => "Error: missing required argument 'query'".to_string(),
            },
            UPDATE_DIAGNOSIS => update_diagnosis(session, &call.arguments),
            other => {
                warn!(tool = other, thread_id = %session.thread_id(), "Model called unknown tool");
                format!("Error: unknown tool '{}'", other)
            }
        }
    }

    pub async fn retrieve_context(&self, query: &str) -> String {
        info!(query, k = self.config.retrieval_k, "Retrieving context");
        match self
            .retriever
            .similarity_search(query, self.config.retrieval_k)
            .await
        {
            Ok(docs) => {
                if docs.is_empty() {
                    warn!(query, "No documents found");
                } else {
                    info!(found = docs.len(), "Documents retrieved");
                }
                format_documents(query, &docs, self.config.snippet_chars)
            }
            Err(e) => {
                warn!(query, error = %e, "Context retrieval failed");
                format!("Error retrieving information: {}", e)
            }
        }
    }
}

/// Apply `update_diagnosis` to `session`. Invalid arguments leave it untouched.
pub fn update_diagnosis(session: &mut Session, arguments: &Value) -> String {
    match DiagnosisArgs::parse(arguments) {
        Ok(args) => {
            let diagnosis = session.update_diagnosis(args.score, args.content, args.total_guess);
            format!(
                "Diagnosis updated. Score: {}, Analysis: {}",
                diagnosis.score, diagnosis.content
            )
        }
        Err(e) => {
            warn!(thread_id = %session.thread_id(), error = %e, "Rejected diagnosis update");
            format!("Error: {}", e)
        }
    }
}
