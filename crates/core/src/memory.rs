//! Knowledge store trait: the documents the assistant can recall.
//!
//! Every conversation turn and every scraped-page analysis is written to a
//! store; before answering, the orchestrator pulls back the documents that
//! share a keyword with the new input and injects them as context.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Default number of documents returned by [`KnowledgeStore::query`].
pub const DEFAULT_QUERY_LIMIT: usize = 3;

/// A single stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Unique ID for this document
    pub id: String,

    /// The stored text
    pub text: String,

    /// Free-form metadata (source URL, document type, ...)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,

    /// Insertion time, milliseconds since the Unix epoch
    pub timestamp: i64,
}

/// The core KnowledgeStore trait.
///
/// Implementations: in-memory keyword store. Documents are never updated
/// or deleted once inserted.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// The backend name (e.g., "in_memory").
    fn name(&self) -> &str;

    /// Append a document and return its id.
    async fn insert(
        &self,
        text: &str,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) -> Result<String, StoreError>;

    /// Return the text of at most `limit` matching documents,
    /// most recently inserted first.
    async fn query(&self, text: &str, limit: usize) -> Result<Vec<String>, StoreError>;

    /// Get a document by ID.
    async fn get(&self, id: &str) -> Result<Option<StoredDocument>, StoreError>;

    /// Total number of stored documents.
    async fn count(&self) -> Result<usize, StoreError>;
}

/// Join query results into the single context string handed to the model.
pub fn join_context(texts: &[String]) -> String {
    texts.join("\n\n")
}
