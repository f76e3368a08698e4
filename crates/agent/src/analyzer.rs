//! Reply analysis: prompt rendering, the provider call and schema checks.
//!
//! The model is asked for a JSON object of the form
//! `{"response": "...", "knowledgeUpdate": {...}}`. Whatever comes back is
//! stripped of Markdown fences, parsed, and validated field by field before
//! any of it reaches the knowledge state.

use std::sync::Arc;

use datasynth_core::error::{ParseError, ValidationError};
use datasynth_core::knowledge::KnowledgeDelta;
use datasynth_core::message::{ConversationTurn, recent};
use datasynth_core::provider::{GenerationParams, Provider, ProviderRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Instruction block placed at the top of every prompt.
pub const INSTRUCTIONS: &str = r#"You are a business analyst assistant. Your job is to:
1. Extract business understanding, objectives, and constraints from conversations
2. Ask clarifying questions to build a complete picture
3. Summarize business requirements clearly

When analyzing scraped data, focus only on business-relevant information.

IMPORTANT: Always respond with valid JSON in this exact format:
{
  "response": "your conversational message here",
  "knowledgeUpdate": {
    "businessUnderstanding": ["point 1", "point 2"],
    "objectives": ["objective 1"],
    "constraints": ["constraint 1"],
    "summary": "brief summary"
  }
}"#;

/// Reply used when the provider cannot be reached or answers with an error.
pub const CONNECTION_FALLBACK: &str = "I'm having trouble connecting to the AI service. Let me help you manually. Could you tell me more about your business?";

/// Number of trailing transcript turns rendered into the prompt.
pub const DEFAULT_HISTORY_WINDOW: usize = 5;

/// The interpreted model reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub response: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_update: Option<KnowledgeDelta>,
}

impl Analysis {
    /// Degraded result: the given text with an all-empty delta.
    pub fn fallback(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            knowledge_update: Some(KnowledgeDelta::blank()),
        }
    }
}

/// Stateless wrapper around a [`Provider`] that speaks the knowledge
/// extraction contract.
pub struct Analyzer {
    provider: Arc<dyn Provider>,
    params: GenerationParams,
    history_window: usize,
}

impl Analyzer {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            params: GenerationParams::default(),
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    /// Render the full prompt for one analysis call.
    pub fn build_prompt(&self, user_input: &str, history: &[ConversationTurn], context: &str) -> String {
        let context_block = if context.is_empty() {
            String::new()
        } else {
            format!("Previous context: {context}\n")
        };

        let lines: Vec<String> = recent(history, self.history_window)
            .iter()
            .map(ConversationTurn::render)
            .collect();
        let history_block = if lines.is_empty() {
            String::new()
        } else {
            format!("Recent conversation:\n{}\n", lines.join("\n"))
        };

        format!(
            "{INSTRUCTIONS}\n\n{context_block}\n{history_block}\n\nUser input: {user_input}\n\nAnalyze and respond with JSON only."
        )
    }

    /// Ask the model about `user_input`. Never fails: transport errors and
    /// unusable replies both come back as fallback analyses.
    pub async fn analyze(&self, user_input: &str, history: &[ConversationTurn], context: &str) -> Analysis {
        let request = ProviderRequest {
            prompt: self.build_prompt(user_input, history, context),
            params: self.params.clone(),
        };

        debug!(
            provider = self.provider.name(),
            prompt_len = request.prompt.len(),
            context_len = context.len(),
            "Requesting analysis"
        );

        let response = match self.provider.complete(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Analysis request failed, using connection fallback");
                return Analysis::fallback(CONNECTION_FALLBACK);
            }
        };

        match parse_reply(&response.text) {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(error = %e, model = %response.model, "Unusable model reply, returning raw text");
                Analysis::fallback(response.text)
            }
        }
    }
}

/// Remove Markdown code fences (```` ```json ```` or ```` ``` ````, each with
/// an optional trailing newline) and surrounding whitespace.
pub fn strip_fences(text: &str) -> String {
    text.replace("```json\n", "")
        .replace("```json", "")
        .replace("```\n", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Parse and validate a raw model reply.
pub fn parse_reply(raw: &str) -> Result<Analysis, ParseError> {
    let cleaned = strip_fences(raw);
    let value: Value = serde_json::from_str(&cleaned).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    let obj = value
        .as_object()
        .ok_or_else(|| ValidationError::NotAnObject("reply".into()))?;

    let response = match obj.get("response") {
        None | Some(Value::Null) => return Err(ValidationError::MissingField("response".into()).into()),
        Some(Value::String(s)) => s.clone(),
        Some(_) => {
            return Err(ValidationError::WrongType {
                field: "response".into(),
                expected: "a string",
            }
            .into());
        }
    };

    let knowledge_update = match obj.get("knowledgeUpdate") {
        None | Some(Value::Null) => None,
        Some(v) => Some(KnowledgeDelta::from_value(v)?),
    };

    Ok(Analysis {
        response,
        knowledge_update,
    })
}
