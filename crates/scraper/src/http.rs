//! HTTP page fetcher.

use std::time::Duration;

use async_trait::async_trait;
use datasynth_config::ScraperConfig;
use datasynth_core::error::FetchError;
use datasynth_core::fetch::{PageFetcher, ScrapedPage};
use tracing::{debug, warn};

use crate::html::extract_page;

/// Fetches pages over HTTP with a browser-like user agent.
///
/// One attempt per URL; redirects are followed by `reqwest`'s default
/// policy and nothing else is retried.
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout_ms: u64,
    max_content_chars: usize,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| FetchError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            timeout_ms: config.timeout_ms,
            max_content_chars: config.max_content_chars,
        })
    }

    fn map_error(&self, url: &str, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout_ms: self.timeout_ms,
            }
        } else if e.is_builder() {
            FetchError::InvalidUrl(url.to_string())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, url: &str) -> Result<ScrapedPage, FetchError> {
        debug!(url, "Fetching page");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "Page fetch returned error status");
            return Err(FetchError::Status {
                url: url.to_string(),
                status_code: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                self.map_error(url, e)
            } else {
                FetchError::Body(e.to_string())
            }
        })?;

        let page = extract_page(&body, self.max_content_chars);
        debug!(url, title = %page.title, chars = page.content.chars().count(), "Page extracted");
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::{HeaderMap, StatusCode, header};
    use axum::response::{Html, IntoResponse};
    use axum::routing::get;

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn fetcher(timeout_ms: u64) -> HttpFetcher {
        HttpFetcher::new(&ScraperConfig {
            timeout_ms,
            ..ScraperConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn fetches_and_extracts_page() {
        let app = Router::new().route(
            "/",
            get(|| async { Html("<html><title>Acme</title><body><p>We sell boxes</p></body></html>") }),
        );
        let base = spawn(app).await;

        let page = fetcher(10_000).fetch(&base).await.unwrap();
        assert_eq!(page.title, "Acme");
        assert!(page.content.contains("We sell boxes"));
    }

    #[tokio::test]
    async fn sends_browser_user_agent() {
        let app = Router::new().route(
            "/ua",
            get(|headers: HeaderMap| async move {
                let ua = headers
                    .get(header::USER_AGENT)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Html(format!("<p>{ua}</p>"))
            }),
        );
        let base = spawn(app).await;

        let page = fetcher(10_000).fetch(&format!("{base}/ua")).await.unwrap();
        assert!(page.content.starts_with("Mozilla/5.0"));
    }

    #[tokio::test]
    async fn error_status_is_fetch_error() {
        let app = Router::new().route(
            "/missing",
            get(|| async { (StatusCode::NOT_FOUND, "nope").into_response() }),
        );
        let base = spawn(app).await;

        let err = fetcher(10_000).fetch(&format!("{base}/missing")).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status_code: 404, .. }));
    }

    #[tokio::test]
    async fn slow_page_times_out() {
        let app = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                Html("<p>late</p>")
            }),
        );
        let base = spawn(app).await;

        let err = fetcher(100).fetch(&format!("{base}/slow")).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout { timeout_ms: 100, .. }));
    }

    #[tokio::test]
    async fn malformed_url_is_rejected() {
        let err = fetcher(10_000).fetch("http://").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_) | FetchError::Network(_)));
    }
}
