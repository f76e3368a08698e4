//! Turn routing: scrape-then-analyze for URLs, retrieve-then-analyze for
//! everything else.

use std::sync::{Arc, LazyLock};

use chrono::Utc;
use datasynth_config::KnowledgeConfig;
use datasynth_core::fetch::PageFetcher;
use datasynth_core::knowledge::KnowledgeDelta;
use datasynth_core::memory::{DEFAULT_QUERY_LIMIT, KnowledgeStore, join_context};
use datasynth_core::message::ConversationTurn;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::analyzer::Analyzer;

static URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://\S+").expect("invalid url regex"));

pub const URL_FAILURE_MESSAGE: &str = "I had trouble accessing that URL. Could you tell me about your business instead?";
pub const URL_DEFAULT_MESSAGE: &str = "I've analyzed the URL and extracted key business information.";
pub const CONVERSATION_DEFAULT_MESSAGE: &str = "I understand. Could you tell me more?";
pub const CONVERSATION_FAILURE_MESSAGE: &str = "I'm having trouble processing that. Could you rephrase?";

const DEFAULT_URL_EXCERPT_CHARS: usize = 2000;

/// What one turn produced for the Presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    pub message: String,
    pub knowledge_update: Option<KnowledgeDelta>,
}

impl TurnOutcome {
    fn message_only(message: &str) -> Self {
        Self {
            message: message.to_string(),
            knowledge_update: None,
        }
    }
}

/// The first `http://` or `https://` run in `input`, if any.
pub fn find_url(input: &str) -> Option<&str> {
    URL_RE.find(input).map(|m| m.as_str())
}

/// Routes user turns through the fetcher, the store and the analyzer.
pub struct Orchestrator {
    analyzer: Analyzer,
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn KnowledgeStore>,
    query_limit: usize,
    url_excerpt_chars: usize,
}

impl Orchestrator {
    pub fn new(analyzer: Analyzer, fetcher: Arc<dyn PageFetcher>, store: Arc<dyn KnowledgeStore>) -> Self {
        Self {
            analyzer,
            fetcher,
            store,
            query_limit: DEFAULT_QUERY_LIMIT,
            url_excerpt_chars: DEFAULT_URL_EXCERPT_CHARS,
        }
    }

    /// Apply the retrieval limits from the `[knowledge]` config section.
    pub fn with_knowledge_config(mut self, config: &KnowledgeConfig) -> Self {
        self.query_limit = config.query_limit;
        self.url_excerpt_chars = config.url_excerpt_chars;
        self
    }

    pub fn store(&self) -> &Arc<dyn KnowledgeStore> {
        &self.store
    }

    pub fn fetcher(&self) -> &Arc<dyn PageFetcher> {
        &self.fetcher
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    /// Handle one user turn. `history` is the transcript before this turn.
    pub async fn process_user_input(&self, input: &str, history: &[ConversationTurn]) -> TurnOutcome {
        match find_url(input) {
            Some(url) => self.handle_url(url, history).await,
            None => self.handle_conversation(input, history).await,
        }
    }

    async fn handle_url(&self, url: &str, history: &[ConversationTurn]) -> TurnOutcome {
        info!(url, "Scraping URL from user input");

        let page = match self.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(e) => {
                warn!(url, error = %e, "Fetch failed");
                return TurnOutcome::message_only(URL_FAILURE_MESSAGE);
            }
        };

        let excerpt: String = page.content.chars().take(self.url_excerpt_chars).collect();
        let prompt = format!("Extract business-related information from this scraped content: {excerpt}");
        let analysis = self.analyzer.analyze(&prompt, history, "").await;

        match serde_json::to_string(&analysis) {
            Ok(serialized) => {
                let mut metadata = Map::new();
                metadata.insert("source".into(), Value::String(url.to_string()));
                metadata.insert("type".into(), json!("scraped"));
                self.remember(&serialized, metadata).await;
            }
            Err(e) => warn!(error = %e, "Could not serialize analysis for storage"),
        }

        TurnOutcome {
            message: non_empty_or(analysis.response, URL_DEFAULT_MESSAGE),
            knowledge_update: analysis.knowledge_update,
        }
    }

    async fn handle_conversation(&self, input: &str, history: &[ConversationTurn]) -> TurnOutcome {
        let context = match self.store.query(input, self.query_limit).await {
            Ok(matches) => {
                debug!(matches = matches.len(), "Retrieved context");
                join_context(&matches)
            }
            Err(e) => {
                warn!(error = %e, store = self.store.name(), "Context query failed");
                return TurnOutcome::message_only(CONVERSATION_FAILURE_MESSAGE);
            }
        };

        let analysis = self.analyzer.analyze(input, history, &context).await;

        let mut metadata = Map::new();
        metadata.insert("type".into(), json!("conversation"));
        metadata.insert("timestamp".into(), json!(Utc::now().timestamp_millis()));
        self.remember(input, metadata).await;

        TurnOutcome {
            message: non_empty_or(analysis.response, CONVERSATION_DEFAULT_MESSAGE),
            knowledge_update: analysis.knowledge_update,
        }
    }

    /// Store a document; failures are logged and otherwise ignored.
    async fn remember(&self, text: &str, metadata: Map<String, Value>) -> Option<String> {
        match self.store.insert(text, metadata).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(error = %e, store = self.store.name(), "Failed to store document");
                None
            }
        }
    }
}

fn non_empty_or(text: String, default: &str) -> String {
    if text.is_empty() { default.to_string() } else { text }
}
