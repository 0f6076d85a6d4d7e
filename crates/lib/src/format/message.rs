//! Question and notice payloads for `chat.postMessage`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::blocks::{Block, BlockMessage, Button};
use crate::question::{CorrelationId, Question};

/// Slack metadata event type attached to every question message.
pub const QUESTION_EVENT_TYPE: &str = "claude_question";
/// Index carried by the synthetic free-text "Other" action.
pub const OTHER_INDEX: i64 = -1;

/// Message body for `chat.postMessage` (the channel is added by the gateway).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessagePayload {
    /// Fallback text shown in notifications.
    pub text: String,
    pub blocks: Vec<Block>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl MessagePayload {
    /// All buttons across the payload's actions blocks.
    pub fn actions(&self) -> impl Iterator<Item = &Button> {
        self.blocks.iter().flat_map(|b| b.buttons())
    }
}

/// Out-of-band message metadata; not part of the visible text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageMetadata {
    pub event_type: &'static str,
    pub event_payload: QuestionMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionMetadata {
    pub question_id: CorrelationId,
    pub hostname: String,
    pub timestamp: String,
}

/// Value encoded on each option button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionValue {
    pub question_id: CorrelationId,
    pub label: String,
    pub index: i64,
}

/// Where and when a question was asked; shown in the message context line.
#[derive(Debug, Clone)]
pub struct MessageOrigin {
    pub hostname: String,
    pub timestamp: DateTime<Utc>,
}

impl MessageOrigin {
    /// This host, now.
    pub fn current() -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown".into());
        Self {
            hostname,
            timestamp: Utc::now(),
        }
    }
}

/// Render a question as a Block Kit message. Options become buttons plus a trailing
/// "Other..." button; a question without options asks for a threaded reply.
pub fn format_question(
    question: &Question,
    correlation_id: &CorrelationId,
    origin: &MessageOrigin,
) -> MessagePayload {
    let timestamp = origin
        .timestamp
        .to_rfc3339_opts(SecondsFormat::Millis, true);

    let mut message = BlockMessage::new()
        .header("🤖 Claude needs your input")
        .section(format!("*{}*", question.text))
        .context(format!(
            "*Host:* {} | *Time:* {}",
            origin.hostname, timestamp
        ))
        .divider();

    if question.options.is_empty() {
        message = message.section("💬 *Reply in thread with your answer*");
    } else {
        let mut buttons: Vec<Button> = question
            .options
            .iter()
            .enumerate()
            .map(|(index, option)| {
                Button::new(
                    option.label.clone(),
                    format!("answer_{index}"),
                    action_value(correlation_id, &option.label, index as i64),
                )
            })
            .collect();
        buttons.push(
            Button::new(
                "Other...",
                "answer_other",
                action_value(correlation_id, "Other", OTHER_INDEX),
            )
            .primary(),
        );
        message = message.actions(buttons);

        let descriptions: Vec<String> = question
            .options
            .iter()
            .filter_map(|o| {
                o.description
                    .as_deref()
                    .map(|d| format!("*{}*: {}", o.label, d))
            })
            .collect();
        if !descriptions.is_empty() {
            message = message.section(descriptions.join("\n"));
        }
        if question.allow_multiple_select {
            message = message.context("Several options may apply: reply in thread with each choice.");
        }
    }

    MessagePayload {
        text: format!("Claude question: {}", question.text),
        blocks: message.build(),
        metadata: Some(MessageMetadata {
            event_type: QUESTION_EVENT_TYPE,
            event_payload: QuestionMetadata {
                question_id: correlation_id.clone(),
                hostname: origin.hostname.clone(),
                timestamp,
            },
        }),
    }
}

fn action_value(correlation_id: &CorrelationId, label: &str, index: i64) -> String {
    let value = ActionValue {
        question_id: correlation_id.clone(),
        label: label.to_string(),
        index,
    };
    // Serializing a struct of strings and an integer cannot fail.
    serde_json::to_string(&value).unwrap_or_default()
}

/// Plain mrkdwn notice.
pub fn text_message(text: impl Into<String>) -> MessagePayload {
    let text = text.into();
    MessagePayload {
        blocks: BlockMessage::new().section(text.clone()).build(),
        text,
        metadata: None,
    }
}

/// Notice prefixed with a check mark.
pub fn success_message(text: impl Into<String>) -> MessagePayload {
    let text = text.into();
    MessagePayload {
        blocks: BlockMessage::new()
            .section(format!(":white_check_mark: {text}"))
            .build(),
        text,
        metadata: None,
    }
}

/// Notice prefixed with a cross.
pub fn error_message(text: impl Into<String>) -> MessagePayload {
    let text = text.into();
    MessagePayload {
        blocks: BlockMessage::new().section(format!(":x: {text}")).build(),
        text,
        metadata: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn origin() -> MessageOrigin {
        MessageOrigin {
            hostname: "devbox".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap(),
        }
    }

    fn color_question() -> Question {
        Question::new("Pick a color?")
            .with_option("Red", Some("warm"))
            .with_option("Blue", None)
            .with_option("Green", None)
    }

    #[test]
    fn options_render_as_buttons_plus_other() {
        let id = CorrelationId::generate();
        let payload = format_question(&color_question(), &id, &origin());
        let buttons: Vec<&Button> = payload.actions().collect();
        assert_eq!(buttons.len(), 4);

        let values: Vec<ActionValue> = buttons
            .iter()
            .map(|b| serde_json::from_str(&b.value).unwrap())
            .collect();
        for v in &values {
            assert_eq!(v.question_id, id);
        }
        assert_eq!(values[0].label, "Red");
        assert_eq!(values[0].index, 0);
        assert_eq!(values[2].label, "Green");
        assert_eq!(values[2].index, 2);
        assert_eq!(values[3].label, "Other");
        assert_eq!(values[3].index, OTHER_INDEX);
        assert_eq!(buttons[1].action_id, "answer_1");
        assert_eq!(buttons[3].action_id, "answer_other");
        assert_eq!(buttons[3].style, Some("primary"));
    }

    #[test]
    fn option_descriptions_listed_once() {
        let payload = format_question(&color_question(), &CorrelationId::generate(), &origin());
        let json = serde_json::to_value(&payload).unwrap();
        let sections: Vec<&str> = json["blocks"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|b| b["type"] == "section")
            .map(|b| b["text"]["text"].as_str().unwrap())
            .collect();
        assert_eq!(sections, ["*Pick a color?*", "*Red*: warm"]);
    }

    #[test]
    fn open_question_asks_for_thread_reply() {
        let payload = format_question(
            &Question::new("What should the release be called?"),
            &CorrelationId::generate(),
            &origin(),
        );
        assert_eq!(payload.actions().count(), 0);
        let json = serde_json::to_value(&payload).unwrap();
        let blocks = json["blocks"].as_array().unwrap();
        assert!(blocks.iter().all(|b| b["type"] != "actions"));
        let last = blocks.last().unwrap();
        assert_eq!(last["text"]["text"], "💬 *Reply in thread with your answer*");
    }

    #[test]
    fn correlation_id_travels_in_metadata() {
        let id = CorrelationId::generate();
        let payload = format_question(&Question::new("Ship it?"), &id, &origin());
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["metadata"]["event_type"], QUESTION_EVENT_TYPE);
        assert_eq!(json["metadata"]["event_payload"]["questionId"], id.as_str());
        assert_eq!(json["metadata"]["event_payload"]["hostname"], "devbox");
        assert_eq!(
            json["metadata"]["event_payload"]["timestamp"],
            "2026-10-16T09:30:00.000Z"
        );
        assert!(!payload.text.contains(id.as_str()));
        assert_eq!(payload.text, "Claude question: Ship it?");
    }

    #[test]
    fn multi_select_adds_hint() {
        let mut q = color_question();
        q.allow_multiple_select = true;
        let payload = format_question(&q, &CorrelationId::generate(), &origin());
        let json = serde_json::to_value(&payload).unwrap();
        let last = json["blocks"].as_array().unwrap().last().unwrap().clone();
        assert_eq!(last["type"], "context");
    }

    #[test]
    fn duplicate_labels_pass_through() {
        let q = Question::new("Again?")
            .with_option("Yes", None)
            .with_option("Yes", None);
        let payload = format_question(&q, &CorrelationId::generate(), &origin());
        assert_eq!(payload.actions().count(), 3);
    }

    #[test]
    fn notices_have_no_metadata() {
        let payload = error_message("Timeout");
        assert!(payload.metadata.is_none());
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["blocks"][0]["text"]["text"], ":x: Timeout");
        assert!(json.get("metadata").is_none());
        assert_eq!(
            serde_json::to_value(success_message("ok")).unwrap()["blocks"][0]["text"]["text"],
            ":white_check_mark: ok"
        );
        assert_eq!(text_message("plain").text, "plain");
    }
}
