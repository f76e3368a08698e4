//! In-memory keyword store: volatile, lives as long as its owner.
//!
//! Matching is deliberately naive: the query is lower-cased and split on
//! whitespace, and a document matches when ANY token occurs as a substring
//! of its lower-cased text. Matches are returned newest first. There is no
//! scoring; a linear scan is fine for the handful of documents one chat
//! session produces.

use async_trait::async_trait;
use chrono::Utc;
use datasynth_core::error::StoreError;
use datasynth_core::memory::{KnowledgeStore, StoredDocument};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// A store that keeps documents in a `Vec` in insertion order.
///
/// Cloning shares the underlying list.
#[derive(Clone)]
pub struct InMemoryKnowledgeStore {
    documents: Arc<RwLock<Vec<StoredDocument>>>,
}

impl InMemoryKnowledgeStore {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Snapshot of every stored document, oldest first.
    pub async fn documents(&self) -> Vec<StoredDocument> {
        self.documents.read().await.clone()
    }
}

impl Default for InMemoryKnowledgeStore {
    fn default() -> Self {
        Self::new()
    }
}

fn keywords(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn insert(
        &self,
        text: &str,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) -> Result<String, StoreError> {
        let id = format!("doc_{}", Uuid::new_v4().simple());
        let doc = StoredDocument {
            id: id.clone(),
            text: text.to_string(),
            metadata,
            timestamp: Utc::now().timestamp_millis(),
        };
        self.documents.write().await.push(doc);
        debug!(id = %id, len = text.len(), "Stored document");
        Ok(id)
    }

    async fn query(&self, text: &str, limit: usize) -> Result<Vec<String>, StoreError> {
        let tokens = keywords(text);
        if tokens.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let documents = self.documents.read().await;
        let results: Vec<String> = documents
            .iter()
            .rev()
            .filter(|doc| {
                let lowered = doc.text.to_lowercase();
                tokens.iter().any(|t| lowered.contains(t.as_str()))
            })
            .take(limit)
            .map(|doc| doc.text.clone())
            .collect();

        debug!(tokens = tokens.len(), matches = results.len(), "Keyword query");
        Ok(results)
    }

    async fn get(&self, id: &str) -> Result<Option<StoredDocument>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents.iter().find(|d| d.id == id).cloned())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.documents.read().await.len())
    }
}
