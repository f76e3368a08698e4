//! HTTP API gateway for Datasynth.
//!
//! Exposes a health check and the v1 API: a stateless chat endpoint plus
//! session resources that keep a transcript and cumulative knowledge.
//!
//! Built on Axum.

pub mod api_v1;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::extract::State;
use axum::{Router, response::Json, routing::get};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

use datasynth_agent::SessionFactory;
use datasynth_config::AppConfig;
use datasynth_scraper::HttpFetcher;

/// Origins allowed to call the API from a browser during local development.
const LOCAL_ORIGINS: [&str; 3] = [
    "http://localhost:3000",
    "http://localhost:5173",
    "http://127.0.0.1:5173",
];

/// Build the full router.
///
/// Layers applied:
/// - CORS limited to local development origins
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(api_state: api_v1::SharedApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(LOCAL_ORIGINS.map(HeaderValue::from_static)))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .with_state(Arc::clone(&api_state))
        .nest("/v1", api_v1::v1_router(api_state))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
///
/// The provider, the fetcher and the `/v1/chat` store are built once and
/// shared; every session created through the API gets its own store.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let provider = datasynth_providers::build_from_config(&config)?;
    let fetcher = Arc::new(HttpFetcher::new(&config.scraper)?);
    let factory = SessionFactory::new(provider, fetcher, config);
    let api_state = Arc::new(api_v1::ApiV1State::new(factory));

    let app = build_router(api_state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_secs: i64,
    sessions: usize,
}

async fn health_handler(State(state): State<api_v1::SharedApiState>) -> Json<HealthResponse> {
    let uptime_secs = (Utc::now() - state.start_time).num_seconds();
    let sessions = state.sessions.read().await.len();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs,
        sessions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use datasynth_core::error::{AnalyzeError, FetchError};
    use datasynth_core::fetch::{PageFetcher, ScrapedPage};
    use datasynth_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    struct NoopProvider;

    #[async_trait::async_trait]
    impl Provider for NoopProvider {
        fn name(&self) -> &str {
            "noop"
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, AnalyzeError> {
            Err(AnalyzeError::NotConfigured("noop".into()))
        }
    }

    struct NoopFetcher;

    #[async_trait::async_trait]
    impl PageFetcher for NoopFetcher {
        fn name(&self) -> &str {
            "noop"
        }

        async fn fetch(&self, _url: &str) -> Result<ScrapedPage, FetchError> {
            Ok(ScrapedPage::default())
        }
    }

    fn test_app() -> Router {
        let factory = SessionFactory::new(Arc::new(NoopProvider), Arc::new(NoopFetcher), AppConfig::default());
        build_router(Arc::new(api_v1::ApiV1State::new(factory)))
    }

    #[tokio::test]
    async fn health_endpoint() {
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let response = test_app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_reports_uptime_and_sessions() {
        let app = test_app();
        let create = Request::builder()
            .method("POST")
            .uri("/v1/sessions")
            .body(Body::empty())
            .unwrap();
        app.clone().oneshot(create).await.unwrap();

        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["status"], "ok");
        assert_eq!(body["sessions"], 1);
        assert!(body["uptimeSecs"].as_i64().unwrap() >= 0);
    }

    #[tokio::test]
    async fn v1_routes_are_nested() {
        let req = Request::builder()
            .method("POST")
            .uri("/v1/sessions")
            .body(Body::empty())
            .unwrap();

        let response = test_app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let body = format!(r#"{{"input":"{}"}}"#, "a".repeat(2 * 1024 * 1024));
        let req = Request::builder()
            .method("POST")
            .uri("/v1/chat")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();

        let response = test_app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn provider_outage_still_answers() {
        let req = Request::builder()
            .method("POST")
            .uri("/v1/chat")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"input":"We sell boxes"}"#))
            .unwrap();

        let response = test_app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
