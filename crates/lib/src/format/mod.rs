//! Message formatting: questions and notices as Slack Block Kit payloads.

pub mod blocks;
mod message;
mod sanitize;

pub use message::{
    error_message, format_question, success_message, text_message, ActionValue, MessageMetadata,
    MessageOrigin, MessagePayload, QuestionMetadata, OTHER_INDEX, QUESTION_EVENT_TYPE,
};
pub use sanitize::sanitize;
