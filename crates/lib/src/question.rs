//! Questions asked by the agent and the answers collected for them.
//!
//! A [`Question`] arrives from the host in the `AskUserQuestion` parameter bag.
//! Each dispatched question gets a fresh [`CorrelationId`]; once posted, the
//! resulting [`PostedMessage`] is handed to the poller until it yields an [`Answer`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One question from the agent (host JSON shape: `question`, `options`, `multiSelect`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(rename = "question")]
    pub text: String,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    #[serde(default, rename = "multiSelect")]
    pub allow_multiple_select: bool,
}

impl Question {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options: Vec::new(),
            allow_multiple_select: false,
        }
    }

    pub fn with_option(mut self, label: impl Into<String>, description: Option<&str>) -> Self {
        self.options.push(QuestionOption {
            label: label.into(),
            description: description.map(str::to_string),
        });
        self
    }
}

/// A selectable choice. Labels are expected to be unique within a question but this is not enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The `AskUserQuestion` parameter bag, as far as this crate reads it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AskParams {
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Opaque per-question token embedded in the posted message's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Generate a new id; never reused across questions.
    pub fn generate() -> Self {
        Self(format!("q-{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Thread root identifier returned by the chat service (Slack `ts`).
pub type MessageHandle = String;

/// A question that has been posted and is waiting for a reply.
#[derive(Debug, Clone)]
pub struct PostedMessage {
    pub channel_id: String,
    pub message_handle: MessageHandle,
    pub correlation_id: CorrelationId,
    pub posted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerKind {
    /// Free-text thread reply.
    Text,
    /// A rendered option was chosen.
    Selection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub kind: AnswerKind,
    pub value: String,
}

impl Answer {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            kind: AnswerKind::Text,
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_deserializes_from_host_shape() {
        let json = serde_json::json!({
            "question": "Which authentication method should we use?",
            "header": "Auth Method",
            "options": [
                { "label": "OAuth 2.0", "description": "Industry standard, secure" },
                { "label": "JWT" }
            ],
            "multiSelect": true
        });
        let q: Question = serde_json::from_value(json).expect("parse question");
        assert_eq!(q.text, "Which authentication method should we use?");
        assert_eq!(q.options.len(), 2);
        assert_eq!(q.options[1].description, None);
        assert!(q.allow_multiple_select);
    }

    #[test]
    fn ask_params_default_to_no_questions() {
        let params: AskParams = serde_json::from_value(serde_json::json!({})).expect("parse");
        assert!(params.questions.is_empty());
    }

    #[test]
    fn correlation_ids_are_unique() {
        let a = CorrelationId::generate();
        let b = CorrelationId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("q-"));
    }
}
