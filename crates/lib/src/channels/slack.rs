//! Slack Web API gateway: chat.postMessage, conversations.replies, conversations.list, auth.test.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::channels::gateway::{
    ChannelInfo, ChannelVisibility, ChatGateway, DeliveryError, IdentityInfo, Reply,
};
use crate::format::MessagePayload;
use crate::question::MessageHandle;

const SLACK_API_BASE: &str = "https://slack.com/api";
const PAGE_LIMIT: &str = "100";

/// Fields every Slack Web API response carries.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    body: T,
}

#[derive(Debug, Deserialize)]
struct PostMessageBody {
    #[serde(default)]
    ts: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RepliesBody {
    #[serde(default)]
    messages: Vec<SlackMessage>,
}

#[derive(Debug, Deserialize)]
struct SlackMessage {
    ts: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    bot_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChannelsBody {
    #[serde(default)]
    channels: Vec<SlackChannel>,
}

#[derive(Debug, Deserialize)]
struct SlackChannel {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    is_private: bool,
}

#[derive(Debug, Deserialize)]
struct AuthTestBody {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    bot_id: Option<String>,
    #[serde(default)]
    team_id: Option<String>,
    #[serde(default)]
    team: Option<String>,
}

/// Slack gateway authenticated with a bot token.
pub struct SlackGateway {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl SlackGateway {
    /// Gateway against the Slack API (or SLACK_API_BASE when set).
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, slack_api_base())
    }

    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    /// Check HTTP status and the Slack `ok` flag, returning the method-specific body.
    async fn read<T: DeserializeOwned>(
        method: &str,
        res: reqwest::Response,
    ) -> Result<T, DeliveryError> {
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(DeliveryError::Status(format!(
                "{} failed: {} {}",
                method, status, body
            )));
        }
        let data: Envelope<T> = res.json().await?;
        if !data.ok {
            return Err(DeliveryError::Api(
                data.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(data.body)
    }

    /// Post a plain check-mark notice; used to confirm the bot can write to the channel.
    pub async fn test_connection(&self, channel_id: &str) -> Result<MessageHandle, DeliveryError> {
        let payload = crate::format::success_message("Slack Notify plugin connection successful!");
        self.post_message(channel_id, &payload).await
    }
}

#[async_trait]
impl ChatGateway for SlackGateway {
    async fn post_message(
        &self,
        channel_id: &str,
        payload: &MessagePayload,
    ) -> Result<MessageHandle, DeliveryError> {
        let mut body = serde_json::to_value(payload)?;
        body["channel"] = serde_json::Value::String(channel_id.to_string());
        let res = self
            .client
            .post(self.url("chat.postMessage"))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        let data: PostMessageBody = Self::read("chat.postMessage", res).await?;
        data.ts.ok_or(DeliveryError::MissingField("ts"))
    }

    async fn thread_replies(
        &self,
        channel_id: &str,
        handle: &str,
    ) -> Result<Vec<Reply>, DeliveryError> {
        let res = self
            .client
            .get(self.url("conversations.replies"))
            .bearer_auth(&self.token)
            .query(&[("channel", channel_id), ("ts", handle), ("limit", PAGE_LIMIT)])
            .send()
            .await?;
        let data: RepliesBody = Self::read("conversations.replies", res).await?;
        Ok(data
            .messages
            .into_iter()
            .filter(|m| m.ts != handle)
            .map(|m| Reply {
                authored_at: m.ts,
                text: m.text,
                user: m.user,
                bot_id: m.bot_id,
            })
            .collect())
    }

    async fn list_channels(&self) -> Result<Vec<ChannelInfo>, DeliveryError> {
        let res = self
            .client
            .get(self.url("conversations.list"))
            .bearer_auth(&self.token)
            .query(&[
                ("types", "public_channel,private_channel"),
                ("limit", PAGE_LIMIT),
            ])
            .send()
            .await?;
        let data: ChannelsBody = Self::read("conversations.list", res).await?;
        Ok(data
            .channels
            .into_iter()
            .map(|c| ChannelInfo {
                id: c.id,
                name: c.name,
                visibility: if c.is_private {
                    ChannelVisibility::Private
                } else {
                    ChannelVisibility::Public
                },
            })
            .collect())
    }

    async fn verify_identity(&self) -> Result<IdentityInfo, DeliveryError> {
        let res = self
            .client
            .post(self.url("auth.test"))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let data: AuthTestBody = Self::read("auth.test", res).await?;
        Ok(IdentityInfo {
            user_id: data.user_id,
            bot_id: data.bot_id,
            team_id: data.team_id,
            team: data.team,
        })
    }
}

/// Resolve Slack API base URL (for tests or custom endpoints).
pub fn slack_api_base() -> String {
    std::env::var("SLACK_API_BASE").unwrap_or_else(|_| SLACK_API_BASE.to_string())
}
