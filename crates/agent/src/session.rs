//! Chat sessions: transcript plus cumulative knowledge.
//!
//! A [`Session`] is the Presentation layer's unit of state. Turns are
//! serialized by `&mut self`; callers sharing a session across tasks wrap
//! it in a `tokio::sync::Mutex`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use datasynth_config::AppConfig;
use datasynth_core::error::StoreError;
use datasynth_core::fetch::PageFetcher;
use datasynth_core::knowledge::{Completeness, KnowledgeState};
use datasynth_core::memory::KnowledgeStore;
use datasynth_core::message::{ConversationTurn, Role};
use datasynth_core::provider::Provider;
use datasynth_memory::InMemoryKnowledgeStore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, json};
use tracing::{error, info};
use uuid::Uuid;

use crate::analyzer::Analyzer;
use crate::guided::{GUIDED_GREETING, GuidedWorkflow, WorkflowStatus};
use crate::orchestrator::{Orchestrator, TurnOutcome};

/// Shown before the first turn of a chat.
pub const GREETING: &str =
    "Hi there! Tell me about your business. You can paste a URL to scrape business data, or just start chatting.";

/// Substituted for the reply when a turn fails outside the orchestrator's
/// own fallbacks.
pub const GENERIC_FAILURE: &str = "Sorry, something went wrong. Please check your API key and try again.";

/// Number of trailing business insights shown in a [`ProfileSummary`].
const SUMMARY_INSIGHTS: usize = 5;

/// How a session handles user turns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// Every turn goes to the orchestrator.
    #[default]
    Open,
    /// A fixed questionnaire runs first; see [`crate::guided`].
    Guided,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Input is empty")]
    EmptyInput,

    #[error("Failed to store knowledge: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to serialize knowledge: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Serializable view of a session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: String,
    pub mode: SessionMode,
    pub created_at: DateTime<Utc>,
    pub transcript: Vec<ConversationTurn>,
    pub knowledge: KnowledgeState,
    pub completeness: Completeness,
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow: Option<WorkflowStatus>,
}

/// Condensed business profile for review.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    /// What the business sells if known, else the knowledge summary.
    pub business_overview: String,
    /// The latest business-understanding entries.
    pub key_insights: Vec<String>,
    pub main_objectives: Vec<String>,
    pub constraints: Vec<String>,
    pub completeness: Completeness,
    pub complete: bool,
    pub total_conversations: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow: Option<WorkflowStatus>,
}

pub struct Session {
    id: String,
    orchestrator: Arc<Orchestrator>,
    guide: Option<GuidedWorkflow>,
    transcript: Vec<ConversationTurn>,
    knowledge: KnowledgeState,
    completeness_threshold: f32,
    created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            orchestrator,
            guide: None,
            transcript: Vec::new(),
            knowledge: KnowledgeState::new(),
            completeness_threshold: 0.8,
            created_at: Utc::now(),
        }
    }

    pub fn with_completeness_threshold(mut self, threshold: f32) -> Self {
        self.completeness_threshold = threshold;
        self
    }

    pub fn with_mode(mut self, mode: SessionMode) -> Self {
        self.guide = match mode {
            SessionMode::Open => None,
            SessionMode::Guided => Some(GuidedWorkflow::new()),
        };
        self
    }

    pub fn mode(&self) -> SessionMode {
        if self.guide.is_some() {
            SessionMode::Guided
        } else {
            SessionMode::Open
        }
    }

    /// First assistant line to show for this session's mode.
    pub fn greeting(&self) -> &'static str {
        match self.mode() {
            SessionMode::Open => GREETING,
            SessionMode::Guided => GUIDED_GREETING,
        }
    }

    pub fn workflow_status(&self) -> Option<WorkflowStatus> {
        self.guide.as_ref().map(GuidedWorkflow::status)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn transcript(&self) -> &[ConversationTurn] {
        &self.transcript
    }

    pub fn knowledge(&self) -> &KnowledgeState {
        &self.knowledge
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Run one user turn and fold its outcome into the session.
    ///
    /// The turn runs on its own task; if that task dies the turn still
    /// completes with [`GENERIC_FAILURE`] and no knowledge update. Nothing
    /// is recorded until the task finishes, so dropping this future leaves
    /// the session as it was.
    pub async fn submit(&mut self, input: &str) -> Result<TurnOutcome, SessionError> {
        if input.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }

        let history = self.transcript.clone();
        let knowledge = self.knowledge.clone();
        let orchestrator = Arc::clone(&self.orchestrator);
        let guide = self.guide.clone();
        let text = input.to_string();
        let task = tokio::spawn(async move {
            match guide {
                Some(mut guide) => {
                    let outcome = guide.advance(&orchestrator, &text, &history, &knowledge).await;
                    (outcome, Some(guide))
                }
                None => (orchestrator.process_user_input(&text, &history).await, None),
            }
        });

        let outcome = match task.await {
            Ok((outcome, guide)) => {
                if guide.is_some() {
                    self.guide = guide;
                }
                outcome
            }
            Err(e) => {
                error!(session = %self.id, error = %e, "Turn failed");
                TurnOutcome {
                    message: GENERIC_FAILURE.to_string(),
                    knowledge_update: None,
                }
            }
        };

        self.transcript.push(ConversationTurn::user(input));
        self.transcript.push(ConversationTurn::assistant(outcome.message.clone()));
        if let Some(delta) = &outcome.knowledge_update {
            self.knowledge.merge(delta);
        }

        Ok(outcome)
    }

    /// Replace the cumulative knowledge with a user-edited version.
    pub fn edit_knowledge(&mut self, knowledge: KnowledgeState) {
        info!(session = %self.id, "Knowledge edited");
        self.knowledge = knowledge;
    }

    /// Store a snapshot of the current knowledge and return its document id.
    pub async fn save_knowledge(&self) -> Result<String, SessionError> {
        let text = serde_json::to_string(&self.knowledge)?;
        let mut metadata = Map::new();
        metadata.insert("type".into(), json!("knowledge_snapshot"));
        metadata.insert("session".into(), json!(self.id));

        let id = self.orchestrator.store().insert(&text, metadata).await?;
        info!(session = %self.id, document = %id, "Knowledge saved");
        Ok(id)
    }

    pub fn user_turns(&self) -> usize {
        self.transcript.iter().filter(|t| t.role == Role::User).count()
    }

    pub fn completeness(&self) -> Completeness {
        self.knowledge.completeness(self.user_turns())
    }

    pub fn is_complete(&self) -> bool {
        self.completeness().is_complete(self.completeness_threshold)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id.clone(),
            mode: self.mode(),
            created_at: self.created_at,
            transcript: self.transcript.clone(),
            knowledge: self.knowledge.clone(),
            completeness: self.completeness(),
            complete: self.is_complete(),
            workflow: self.workflow_status(),
        }
    }

    pub fn summary(&self) -> ProfileSummary {
        let insights = &self.knowledge.business_understanding;
        let business_overview = self
            .guide
            .as_ref()
            .and_then(GuidedWorkflow::business)
            .map(str::to_string)
            .unwrap_or_else(|| self.knowledge.summary.clone());

        ProfileSummary {
            business_overview,
            key_insights: insights[insights.len().saturating_sub(SUMMARY_INSIGHTS)..].to_vec(),
            main_objectives: self.knowledge.objectives.clone(),
            constraints: self.knowledge.constraints.clone(),
            completeness: self.completeness(),
            complete: self.is_complete(),
            total_conversations: self.user_turns(),
            workflow: self.workflow_status(),
        }
    }
}

/// Builds orchestrators and sessions that share one provider and fetcher.
///
/// Each session gets a fresh in-memory store, so nothing one user says is
/// recalled in another user's session.
pub struct SessionFactory {
    provider: Arc<dyn Provider>,
    fetcher: Arc<dyn PageFetcher>,
    config: AppConfig,
}

impl SessionFactory {
    pub fn new(provider: Arc<dyn Provider>, fetcher: Arc<dyn PageFetcher>, config: AppConfig) -> Self {
        Self {
            provider,
            fetcher,
            config,
        }
    }

    pub fn orchestrator(&self, store: Arc<dyn KnowledgeStore>) -> Orchestrator {
        let analyzer = Analyzer::new(Arc::clone(&self.provider))
            .with_params(self.config.generation.params())
            .with_history_window(self.config.knowledge.history_window);
        Orchestrator::new(analyzer, Arc::clone(&self.fetcher), store).with_knowledge_config(&self.config.knowledge)
    }

    /// A new open session backed by its own empty store.
    pub fn create(&self) -> Session {
        self.create_with_mode(SessionMode::Open)
    }

    pub fn create_with_mode(&self, mode: SessionMode) -> Session {
        let store: Arc<dyn KnowledgeStore> = Arc::new(InMemoryKnowledgeStore::new());
        Session::new(Arc::new(self.orchestrator(store)))
            .with_completeness_threshold(self.config.knowledge.completeness_threshold)
            .with_mode(mode)
    }
}
