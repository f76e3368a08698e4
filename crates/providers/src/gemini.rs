//! Gemini `generateContent` provider.
//!
//! Sends one prompt as a single user part and reads back
//! `candidates[0].content.parts[0].text`. The API key travels as the `key`
//! query parameter.
//!
//! No client-side timeout is set: a slow model keeps the turn waiting
//! rather than producing a half answer.

use async_trait::async_trait;
use datasynth_core::error::AnalyzeError;
use datasynth_core::provider::{GenerationParams, Provider, ProviderRequest, ProviderResponse};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A Gemini-compatible generation provider.
pub struct GeminiProvider {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a new provider against `base_url` (the models collection URL).
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, AnalyzeError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AnalyzeError::NotConfigured(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.base_url, self.model)
    }

    fn to_api_request(request: &ProviderRequest) -> ApiRequest {
        ApiRequest {
            contents: vec![ApiContent {
                parts: vec![ApiPart {
                    text: request.prompt.clone(),
                }],
            }],
            generation_config: ApiGenerationConfig::from(&request.params),
        }
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, AnalyzeError> {
        let body = Self::to_api_request(&request);

        debug!(model = %self.model, prompt_len = request.prompt.len(), "Sending generation request");

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| AnalyzeError::Network(e.without_url().to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(AnalyzeError::RateLimited);
        }

        if status == 401 || status == 403 {
            return Err(AnalyzeError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(AnalyzeError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| AnalyzeError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        let text = api_response.first_text().ok_or_else(|| {
            AnalyzeError::MalformedResponse("No candidate text in response".into())
        })?;

        Ok(ProviderResponse {
            text,
            model: self.model.clone(),
        })
    }
}

// --- Wire types ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRequest {
    contents: Vec<ApiContent>,
    generation_config: ApiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct ApiContent {
    parts: Vec<ApiPart>,
}

#[derive(Debug, Serialize)]
struct ApiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiGenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

impl From<&GenerationParams> for ApiGenerationConfig {
    fn from(p: &GenerationParams) -> Self {
        Self {
            temperature: p.temperature,
            top_k: p.top_k,
            top_p: p.top_p,
            max_output_tokens: p.max_output_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
}

#[derive(Debug, Deserialize)]
struct ApiCandidate {
    #[serde(default)]
    content: Option<ApiCandidateContent>,
}

#[derive(Debug, Deserialize)]
struct ApiCandidateContent {
    #[serde(default)]
    parts: Vec<ApiCandidatePart>,
}

#[derive(Debug, Deserialize)]
struct ApiCandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl ApiResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}
