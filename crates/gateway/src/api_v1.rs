//! HTTP API v1: chat turns and per-session knowledge.
//!
//! Endpoints:
//!
//! - `POST   /v1/chat`: One stateless turn
//! - `POST   /v1/sessions`: Create a session (`?mode=guided` for the questionnaire)
//! - `GET    /v1/sessions/{id}`: Transcript, knowledge, completeness
//! - `GET    /v1/sessions/{id}/summary`: Condensed business profile
//! - `DELETE /v1/sessions/{id}`: Drop a session
//! - `POST   /v1/sessions/{id}/messages`: Submit a turn to a session
//! - `PUT    /v1/sessions/{id}/knowledge`: Replace the session's knowledge
//! - `POST   /v1/sessions/{id}/knowledge/save`: Snapshot knowledge into the store

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info};

use datasynth_agent::{
    Orchestrator, ProfileSummary, Session, SessionError, SessionFactory, SessionMode, SessionSnapshot, TurnOutcome,
};
use datasynth_core::knowledge::{Completeness, KnowledgeDelta, KnowledgeState};
use datasynth_core::memory::KnowledgeStore;
use datasynth_core::message::ConversationTurn;
use datasynth_memory::InMemoryKnowledgeStore;

// ── State ─────────────────────────────────────────────────────────────────

/// Maximum number of live sessions before the oldest is evicted.
const MAX_SESSIONS: usize = 1_000;

pub struct SessionEntry {
    pub created_at: DateTime<Utc>,
    pub session: Arc<Mutex<Session>>,
}

/// Shared state for the v1 API.
pub struct ApiV1State {
    pub factory: SessionFactory,
    /// Orchestrator behind the stateless `/v1/chat` endpoint, with its own
    /// shared store.
    pub chat: Orchestrator,
    pub sessions: RwLock<HashMap<String, SessionEntry>>,
    pub start_time: DateTime<Utc>,
}

impl ApiV1State {
    pub fn new(factory: SessionFactory) -> Self {
        let store: Arc<dyn KnowledgeStore> = Arc::new(InMemoryKnowledgeStore::new());
        let chat = factory.orchestrator(store);
        Self {
            factory,
            chat,
            sessions: RwLock::new(HashMap::new()),
            start_time: Utc::now(),
        }
    }

    async fn session(&self, id: &str) -> Option<Arc<Mutex<Session>>> {
        self.sessions.read().await.get(id).map(|e| Arc::clone(&e.session))
    }
}

pub type SharedApiState = Arc<ApiV1State>;

// ── Router ────────────────────────────────────────────────────────────────

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedApiState) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/sessions", post(create_session_handler))
        .route("/sessions/{id}", get(get_session_handler).delete(delete_session_handler))
        .route("/sessions/{id}/summary", get(session_summary_handler))
        .route("/sessions/{id}/messages", post(post_message_handler))
        .route("/sessions/{id}/knowledge", put(edit_knowledge_handler))
        .route("/sessions/{id}/knowledge/save", post(save_knowledge_handler))
        .with_state(state)
}

// ── DTOs ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ChatRequest {
    pub input: String,
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
}

#[derive(Deserialize, Default)]
pub struct CreateSessionParams {
    #[serde(default)]
    pub mode: SessionMode,
}

#[derive(Deserialize)]
pub struct MessageRequest {
    pub input: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message: String,
    pub knowledge_update: Option<KnowledgeDelta>,
    pub knowledge: KnowledgeState,
    pub completeness: Completeness,
    pub complete: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub id: String,
    pub mode: SessionMode,
    pub greeting: String,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct SavedResponse {
    pub id: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse { error: message.into() }))
}

fn session_not_found(id: &str) -> ApiError {
    api_error(StatusCode::NOT_FOUND, format!("Session '{id}' not found"))
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn chat_handler(
    State(state): State<SharedApiState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<TurnOutcome>, ApiError> {
    if payload.input.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Input is empty"));
    }
    info!(input_len = payload.input.len(), history = payload.history.len(), "v1/chat request");

    let outcome = state.chat.process_user_input(&payload.input, &payload.history).await;
    Ok(Json(outcome))
}

async fn create_session_handler(
    State(state): State<SharedApiState>,
    Query(params): Query<CreateSessionParams>,
) -> (StatusCode, Json<CreateSessionResponse>) {
    let session = state.factory.create_with_mode(params.mode);
    let id = session.id().to_string();
    let created_at = session.created_at();
    let greeting = session.greeting().to_string();

    let mut sessions = state.sessions.write().await;

    if sessions.len() >= MAX_SESSIONS {
        if let Some(oldest) = sessions
            .iter()
            .min_by_key(|(_, e)| e.created_at)
            .map(|(k, _)| k.clone())
        {
            info!(session = %oldest, "Evicting oldest session");
            sessions.remove(&oldest);
        }
    }

    sessions.insert(
        id.clone(),
        SessionEntry {
            created_at,
            session: Arc::new(Mutex::new(session)),
        },
    );
    info!(session = %id, mode = ?params.mode, "Session created");

    (
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            id,
            mode: params.mode,
            greeting,
            created_at: created_at.to_rfc3339(),
        }),
    )
}

async fn get_session_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let session = state.session(&id).await.ok_or_else(|| session_not_found(&id))?;
    let snapshot = session.lock().await.snapshot();
    Ok(Json(snapshot))
}

async fn session_summary_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
) -> Result<Json<ProfileSummary>, ApiError> {
    let session = state.session(&id).await.ok_or_else(|| session_not_found(&id))?;
    let summary = session.lock().await.summary();
    Ok(Json(summary))
}

async fn delete_session_handler(State(state): State<SharedApiState>, Path(id): Path<String>) -> StatusCode {
    match state.sessions.write().await.remove(&id) {
        Some(_) => {
            info!(session = %id, "Session deleted");
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

async fn post_message_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
    Json(payload): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let session = state.session(&id).await.ok_or_else(|| session_not_found(&id))?;
    let mut session = session.lock().await;

    let outcome = match session.submit(&payload.input).await {
        Ok(outcome) => outcome,
        Err(SessionError::EmptyInput) => return Err(api_error(StatusCode::BAD_REQUEST, "Input is empty")),
        Err(e) => {
            error!(session = %id, error = %e, "Turn failed");
            return Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    Ok(Json(MessageResponse {
        message: outcome.message,
        knowledge_update: outcome.knowledge_update,
        knowledge: session.knowledge().clone(),
        completeness: session.completeness(),
        complete: session.is_complete(),
    }))
}

async fn edit_knowledge_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
    Json(knowledge): Json<KnowledgeState>,
) -> Result<Json<KnowledgeState>, ApiError> {
    let session = state.session(&id).await.ok_or_else(|| session_not_found(&id))?;
    let mut session = session.lock().await;
    session.edit_knowledge(knowledge);
    Ok(Json(session.knowledge().clone()))
}

async fn save_knowledge_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<SavedResponse>), ApiError> {
    let session = state.session(&id).await.ok_or_else(|| session_not_found(&id))?;
    let session = session.lock().await;

    match session.save_knowledge().await {
        Ok(doc_id) => Ok((StatusCode::CREATED, Json(SavedResponse { id: doc_id }))),
        Err(e) => {
            error!(session = %id, error = %e, "Knowledge save failed");
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
