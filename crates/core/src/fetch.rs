//! Page fetcher trait: turns a URL into plain text the model can read.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Plain-text rendition of a fetched web page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedPage {
    /// Contents of the first `<title>` element, or empty
    pub title: String,

    /// Visible text with markup stripped, length-bounded
    pub content: String,
}

/// Retrieves and flattens web pages.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// A human-readable name for this fetcher.
    fn name(&self) -> &str;

    /// Fetch `url` in a single attempt.
    async fn fetch(&self, url: &str) -> Result<ScrapedPage, FetchError>;
}
