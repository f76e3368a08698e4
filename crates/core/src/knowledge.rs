//! Business knowledge accumulated over a conversation.
//!
//! The model extracts a [`KnowledgeDelta`] from every turn; the session
//! folds deltas into a running [`KnowledgeState`]. List fields only ever
//! grow (no dedup, insertion order kept); the summary is replaced whenever
//! a delta carries a non-empty one.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;

/// Cumulative knowledge shown in the knowledge panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeState {
    #[serde(default)]
    pub business_understanding: Vec<String>,

    #[serde(default)]
    pub objectives: Vec<String>,

    #[serde(default)]
    pub constraints: Vec<String>,

    #[serde(default)]
    pub summary: String,
}

impl KnowledgeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a delta into this state.
    pub fn merge(&mut self, delta: &KnowledgeDelta) {
        if let Some(items) = &delta.business_understanding {
            self.business_understanding.extend(items.iter().cloned());
        }
        if let Some(items) = &delta.objectives {
            self.objectives.extend(items.iter().cloned());
        }
        if let Some(items) = &delta.constraints {
            self.constraints.extend(items.iter().cloned());
        }
        if let Some(summary) = delta.summary.as_deref().filter(|s| !s.is_empty()) {
            self.summary = summary.to_string();
        }
    }

    /// Score how much of the business picture has been collected.
    ///
    /// Five equally weighted criteria: each of the four sections is
    /// non-empty, and the user has contributed at least three turns.
    pub fn completeness(&self, user_turns: usize) -> Completeness {
        let checks = [
            !self.business_understanding.is_empty(),
            !self.objectives.is_empty(),
            !self.constraints.is_empty(),
            !self.summary.is_empty(),
            user_turns >= MIN_USER_TURNS,
        ];
        let met = checks.iter().filter(|c| **c).count();
        Completeness {
            met,
            total: checks.len(),
            score: met as f32 / checks.len() as f32,
        }
    }
}

const MIN_USER_TURNS: usize = 3;

/// Result of [`KnowledgeState::completeness`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Completeness {
    pub met: usize,
    pub total: usize,
    pub score: f32,
}

impl Completeness {
    pub fn is_complete(&self, threshold: f32) -> bool {
        self.score >= threshold
    }
}

/// A partial update extracted from one model reply.
///
/// `None` means "the model did not mention this field"; the matching
/// state field is left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_understanding: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objectives: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl KnowledgeDelta {
    /// A delta that names every field but carries nothing.
    ///
    /// Returned alongside fallback replies so callers always see the
    /// full shape.
    pub fn blank() -> Self {
        Self {
            business_understanding: Some(Vec::new()),
            objectives: Some(Vec::new()),
            constraints: Some(Vec::new()),
            summary: Some(String::new()),
        }
    }

    /// True when merging this delta would change nothing.
    pub fn is_empty(&self) -> bool {
        self.business_understanding.as_ref().is_none_or(Vec::is_empty)
            && self.objectives.as_ref().is_none_or(Vec::is_empty)
            && self.constraints.as_ref().is_none_or(Vec::is_empty)
            && self.summary.as_ref().is_none_or(String::is_empty)
    }

    /// Combine two deltas so that merging the result equals merging
    /// `self` then `other`.
    pub fn concat(self, other: KnowledgeDelta) -> KnowledgeDelta {
        KnowledgeDelta {
            business_understanding: concat_lists(
                self.business_understanding,
                other.business_understanding,
            ),
            objectives: concat_lists(self.objectives, other.objectives),
            constraints: concat_lists(self.constraints, other.constraints),
            summary: match other.summary {
                Some(s) if !s.is_empty() => Some(s),
                _ => self.summary,
            },
        }
    }

    /// Validate an untrusted `knowledgeUpdate` object from a model reply.
    ///
    /// Known keys must have the right JSON type; `null` counts as absent
    /// and unknown keys are ignored.
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let obj = value
            .as_object()
            .ok_or_else(|| ValidationError::NotAnObject("knowledgeUpdate".into()))?;

        Ok(Self {
            business_understanding: string_list(obj.get("businessUnderstanding"), "businessUnderstanding")?,
            objectives: string_list(obj.get("objectives"), "objectives")?,
            constraints: string_list(obj.get("constraints"), "constraints")?,
            summary: match obj.get("summary") {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(_) => {
                    return Err(ValidationError::WrongType {
                        field: "summary".into(),
                        expected: "a string",
                    });
                }
            },
        })
    }
}

fn concat_lists(a: Option<Vec<String>>, b: Option<Vec<String>>) -> Option<Vec<String>> {
    match (a, b) {
        (None, None) => None,
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (Some(mut a), Some(b)) => {
            a.extend(b);
            Some(a)
        }
    }
}

fn string_list(value: Option<&Value>, field: &str) -> Result<Option<Vec<String>>, ValidationError> {
    let wrong_type = || ValidationError::WrongType {
        field: field.to_string(),
        expected: "an array of strings",
    };

    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(wrong_type))
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(_) => Err(wrong_type()),
    }
}
