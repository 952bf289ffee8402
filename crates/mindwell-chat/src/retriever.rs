//! Similarity search over the indexed reference text.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ChatError;

/// A chunk of indexed text with the loader's metadata (source file, page).
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    pub content: String,
    pub metadata: Value,
}

impl SourceDocument {
    pub fn new(content: impl Into<String>, metadata: Value) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }
}

/// External vector store queried by the `retrieve_context` tool.
#[async_trait]
pub trait ContextRetriever: Send + Sync {
    /// The `k` chunks most similar to `query`, best first.
    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<SourceDocument>, ChatError>;
}
