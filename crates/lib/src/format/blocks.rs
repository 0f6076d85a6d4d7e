//! Slack Block Kit types: the subset used for question messages and notices.
//!
//! Reference: <https://api.slack.com/reference/block-kit/blocks>

use serde::Serialize;

/// Text object: "plain_text" or "mrkdwn".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextObject {
    #[serde(rename = "type")]
    pub text_type: &'static str,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<bool>,
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text_type: "plain_text",
            text: text.into(),
            emoji: Some(true),
        }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self {
            text_type: "mrkdwn",
            text: text.into(),
            emoji: None,
        }
    }
}

/// Button element for an actions block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Button {
    #[serde(rename = "type")]
    pub element_type: &'static str,
    pub text: TextObject,
    pub action_id: String,
    /// Sent back verbatim with the interaction payload.
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<&'static str>,
}

impl Button {
    pub fn new(
        text: impl Into<String>,
        action_id: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            element_type: "button",
            text: TextObject::plain(text),
            action_id: action_id.into(),
            value: value.into(),
            style: None,
        }
    }

    pub fn primary(mut self) -> Self {
        self.style = Some("primary");
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header { text: TextObject },
    Section { text: TextObject },
    Context { elements: Vec<TextObject> },
    Divider {},
    Actions { elements: Vec<Button> },
}

impl Block {
    /// Buttons carried by this block, if it is an actions block.
    pub fn buttons(&self) -> &[Button] {
        match self {
            Block::Actions { elements } => elements,
            _ => &[],
        }
    }
}

/// Builder for a list of blocks.
#[derive(Debug, Default)]
pub struct BlockMessage {
    blocks: Vec<Block>,
}

impl BlockMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Header {
            text: TextObject::plain(text),
        });
        self
    }

    /// Section with mrkdwn text.
    pub fn section(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Section {
            text: TextObject::mrkdwn(text),
        });
        self
    }

    /// Context line with a single mrkdwn element.
    pub fn context(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Context {
            elements: vec![TextObject::mrkdwn(text)],
        });
        self
    }

    pub fn divider(mut self) -> Self {
        self.blocks.push(Block::Divider {});
        self
    }

    pub fn actions(mut self, elements: Vec<Button>) -> Self {
        self.blocks.push(Block::Actions { elements });
        self
    }

    pub fn build(self) -> Vec<Block> {
        self.blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_serializes_as_mrkdwn() {
        let block = Block::Section {
            text: TextObject::mrkdwn("Hello *world*"),
        };
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "section");
        assert_eq!(json["text"]["type"], "mrkdwn");
        assert_eq!(json["text"]["text"], "Hello *world*");
        assert!(json["text"].get("emoji").is_none());
    }

    #[test]
    fn primary_button_payload() {
        let button = Button::new("Other...", "answer_other", "{}").primary();
        let json = serde_json::to_value(&button).unwrap();
        assert_eq!(json["type"], "button");
        assert_eq!(json["text"]["type"], "plain_text");
        assert_eq!(json["text"]["emoji"], true);
        assert_eq!(json["action_id"], "answer_other");
        assert_eq!(json["style"], "primary");
    }

    #[test]
    fn builder_preserves_order() {
        let blocks = BlockMessage::new()
            .header("Title")
            .section("body")
            .context("meta")
            .divider()
            .actions(vec![Button::new("A", "a", "1")])
            .build();
        let json = serde_json::to_value(&blocks).unwrap();
        let types: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["type"].as_str().unwrap())
            .collect();
        assert_eq!(types, ["header", "section", "context", "divider", "actions"]);
        assert_eq!(blocks[4].buttons().len(), 1);
        assert!(blocks[0].buttons().is_empty());
    }
}
