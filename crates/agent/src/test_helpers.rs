//! Shared mocks for pipeline tests.

use async_trait::async_trait;
use datasynth_core::error::{AnalyzeError, FetchError, StoreError};
use datasynth_core::fetch::{PageFetcher, ScrapedPage};
use datasynth_core::memory::{KnowledgeStore, StoredDocument};
use datasynth_core::provider::{Provider, ProviderRequest, ProviderResponse};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Ordered record of calls made across several mocks.
pub type CallLog = Arc<Mutex<Vec<String>>>;

/// A provider that returns a sequence of scripted results.
///
/// Panics if more calls are made than results provided.
pub struct ScriptedProvider {
    results: Mutex<Vec<Result<String, AnalyzeError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
    log: Option<CallLog>,
}

impl ScriptedProvider {
    pub fn new(results: Vec<Result<String, AnalyzeError>>) -> Self {
        Self {
            results: Mutex::new(results),
            requests: Mutex::new(Vec::new()),
            log: None,
        }
    }

    pub fn replies(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, AnalyzeError> {
        if let Some(log) = &self.log {
            log.lock().unwrap().push("analyze".into());
        }
        self.requests.lock().unwrap().push(request);

        let mut results = self.results.lock().unwrap();
        if results.is_empty() {
            panic!("ScriptedProvider: no more results");
        }
        results.remove(0).map(|text| ProviderResponse {
            text,
            model: "scripted-model".into(),
        })
    }
}

/// A provider whose every call panics.
pub struct PanickingProvider;

#[async_trait]
impl Provider for PanickingProvider {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, AnalyzeError> {
        panic!("provider exploded");
    }
}

/// A provider that sleeps before every reply.
pub struct SlowProvider {
    delay: Duration,
    reply: String,
}

impl SlowProvider {
    pub fn new(delay: Duration, reply: &str) -> Self {
        Self {
            delay,
            reply: reply.to_string(),
        }
    }
}

#[async_trait]
impl Provider for SlowProvider {
    fn name(&self) -> &str {
        "slow"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, AnalyzeError> {
        tokio::time::sleep(self.delay).await;
        Ok(ProviderResponse {
            text: self.reply.clone(),
            model: "slow-model".into(),
        })
    }
}

/// A fetcher that returns one fixed result and records requested URLs.
pub struct StubFetcher {
    result: Result<ScrapedPage, FetchError>,
    urls: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn page(title: &str, content: &str) -> Self {
        Self {
            result: Ok(ScrapedPage {
                title: title.into(),
                content: content.into(),
            }),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: FetchError) -> Self {
        Self {
            result: Err(error),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    fn name(&self) -> &str {
        "stub"
    }

    async fn fetch(&self, url: &str) -> Result<ScrapedPage, FetchError> {
        self.urls.lock().unwrap().push(url.to_string());
        self.result.clone()
    }
}

/// Wraps another store and logs each call into a [`CallLog`].
pub struct RecordingStore<S> {
    inner: S,
    log: CallLog,
    fail_queries: bool,
    fail_inserts: bool,
}

impl<S: KnowledgeStore> RecordingStore<S> {
    pub fn new(inner: S, log: CallLog) -> Self {
        Self {
            inner,
            log,
            fail_queries: false,
            fail_inserts: false,
        }
    }

    pub fn failing_queries(mut self) -> Self {
        self.fail_queries = true;
        self
    }

    pub fn failing_inserts(mut self) -> Self {
        self.fail_inserts = true;
        self
    }
}

#[async_trait]
impl<S: KnowledgeStore> KnowledgeStore for RecordingStore<S> {
    fn name(&self) -> &str {
        "recording"
    }

    async fn insert(
        &self,
        text: &str,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) -> Result<String, StoreError> {
        self.log.lock().unwrap().push("insert".into());
        if self.fail_inserts {
            return Err(StoreError::Storage("disk on fire".into()));
        }
        self.inner.insert(text, metadata).await
    }

    async fn query(&self, text: &str, limit: usize) -> Result<Vec<String>, StoreError> {
        self.log.lock().unwrap().push("query".into());
        if self.fail_queries {
            return Err(StoreError::QueryFailed("index unavailable".into()));
        }
        self.inner.query(text, limit).await
    }

    async fn get(&self, id: &str) -> Result<Option<StoredDocument>, StoreError> {
        self.inner.get(id).await
    }

    async fn count(&self) -> Result<usize, StoreError> {
        self.inner.count().await
    }
}

pub fn new_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn logged(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}
