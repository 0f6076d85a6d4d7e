//! Chat gateway capability: the remote operations the redirect needs from a chat service.

use async_trait::async_trait;

use crate::format::MessagePayload;
use crate::question::MessageHandle;

/// A remote call to the chat service failed.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("slack request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("slack payload encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("slack http error: {0}")]
    Status(String),
    #[error("slack api error: {0}")]
    Api(String),
    #[error("slack response missing {0}")]
    MissingField(&'static str),
}

/// One reply in a message thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Chat-service timestamp of the reply (Slack `ts`).
    pub authored_at: String,
    pub text: String,
    pub user: Option<String>,
    /// Set when the reply was posted by a bot.
    pub bot_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelVisibility {
    Public,
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: String,
    pub name: String,
    pub visibility: ChannelVisibility,
}

/// Identity behind the credential (Slack `auth.test`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityInfo {
    pub user_id: Option<String>,
    pub bot_id: Option<String>,
    pub team_id: Option<String>,
    pub team: Option<String>,
}

/// Remote chat service. Every call is independent and is not retried here.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Post a message; returns the handle of the new thread root.
    async fn post_message(
        &self,
        channel_id: &str,
        payload: &MessagePayload,
    ) -> Result<MessageHandle, DeliveryError>;

    /// Replies in the thread rooted at `handle`, oldest first, without the root itself.
    async fn thread_replies(
        &self,
        channel_id: &str,
        handle: &str,
    ) -> Result<Vec<Reply>, DeliveryError>;

    async fn list_channels(&self) -> Result<Vec<ChannelInfo>, DeliveryError>;

    async fn verify_identity(&self) -> Result<IdentityInfo, DeliveryError>;
}
