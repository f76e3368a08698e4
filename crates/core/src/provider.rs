//! Provider trait: the abstraction over text generation backends.
//!
//! A Provider takes one fully rendered prompt and returns the model's text.
//! Prompt construction and reply interpretation live in the agent crate;
//! providers only deal with transport and the response envelope.
//!
//! Implementations: Gemini `generateContent`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AnalyzeError;

/// Decoding parameters sent with every generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Top-k sampling bound
    #[serde(default = "default_top_k")]
    pub top_k: u32,

    /// Nucleus sampling bound
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

fn default_temperature() -> f32 {
    0.7
}
fn default_top_k() -> u32 {
    40
}
fn default_top_p() -> f32 {
    0.95
}
fn default_max_output_tokens() -> u32 {
    1024
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_k: default_top_k(),
            top_p: default_top_p(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

/// A single-prompt generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The full prompt text
    pub prompt: String,

    /// Decoding parameters
    #[serde(default)]
    pub params: GenerationParams,
}

/// The text of the first candidate returned by a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Raw candidate text, unparsed
    pub text: String,

    /// Which model produced it
    pub model: String,
}

/// The core Provider trait.
///
/// The analyzer calls `complete()` without knowing which backend answers.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "gemini").
    fn name(&self) -> &str;

    /// Send a request and get the first candidate's text.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, AnalyzeError>;
}
