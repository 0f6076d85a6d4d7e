//! Host hook contract for `AskUserQuestion`.
//!
//! The host hands over a tool name and its parameter bag and always gets a well-formed
//! [`HookResponse`] back:
//! - `{allow: true}`: pass through to the native prompt (other tools, redirect unavailable, or any failure).
//! - `{allow: true, modified_params}`: the original parameters plus the `answers` collected in Slack.
//! - `{allow: false, error}`: a question timed out in Slack.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::channels::{ChatGateway, SlackGateway};
use crate::config::{Config, SlackSettings};
use crate::diagnostics::DiagnosticLog;
use crate::dispatch::{QuestionDispatcher, Resolution};
use crate::question::AskParams;

/// The only tool this hook redirects.
pub const ASK_USER_QUESTION: &str = "AskUserQuestion";
/// Error returned to the host when a question goes unanswered.
pub const TIMEOUT_ERROR: &str = "Slack response timeout";

/// Hook invocation as read from the host.
#[derive(Debug, Clone, Deserialize)]
pub struct HookRequest {
    #[serde(alias = "toolName")]
    pub tool_name: String,
    #[serde(default, alias = "tool_input")]
    pub params: serde_json::Value,
}

impl HookRequest {
    /// Parse the hook input read from the host.
    pub fn parse(input: &str) -> anyhow::Result<Self> {
        serde_json::from_str(input).context("parsing hook input")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookResponse {
    pub allow: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_params: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HookResponse {
    pub fn pass_through() -> Self {
        Self {
            allow: true,
            modified_params: None,
            error: None,
        }
    }

    pub fn answered(modified_params: serde_json::Value) -> Self {
        Self {
            allow: true,
            modified_params: Some(modified_params),
            error: None,
        }
    }

    pub fn denied(error: impl Into<String>) -> Self {
        Self {
            allow: false,
            modified_params: None,
            error: Some(error.into()),
        }
    }

    /// The `answers` map from `modified_params`, if any.
    pub fn answers(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.modified_params
            .as_ref()?
            .get("answers")?
            .as_object()
    }
}

/// Redirects `AskUserQuestion` to Slack for one loaded configuration.
pub struct AskHook {
    config: Option<Config>,
    diagnostics: DiagnosticLog,
    gateway: Option<Arc<dyn ChatGateway>>,
}

impl AskHook {
    /// `config` is None when no config file exists; the hook is then inert.
    pub fn new(config: Option<Config>, diagnostics: DiagnosticLog) -> Self {
        Self {
            config,
            diagnostics,
            gateway: None,
        }
    }

    /// Use this gateway instead of a Slack gateway built from the bot token.
    pub fn with_gateway(mut self, gateway: Arc<dyn ChatGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Handle raw host input. Unparseable input is recorded and passed through.
    pub async fn handle_input(&self, input: &str) -> HookResponse {
        match HookRequest::parse(input) {
            Ok(request) => self.handle(&request.tool_name, request.params).await,
            Err(e) => self.fall_back(e),
        }
    }

    /// Record a failure that happened before a request could be handled and pass through.
    pub fn fall_back(&self, error: anyhow::Error) -> HookResponse {
        log::error!("error in hook: {:#}", error);
        log::error!("falling back to local question prompt");
        self.diagnostics.record(&error);
        HookResponse::pass_through()
    }

    pub async fn handle(&self, tool_name: &str, params: serde_json::Value) -> HookResponse {
        if tool_name != ASK_USER_QUESTION {
            return HookResponse::pass_through();
        }
        let Some(settings) = self.config.as_ref().and_then(Config::slack_settings) else {
            log::debug!("slack redirect unavailable, using local prompt");
            return HookResponse::pass_through();
        };

        match self.redirect(&settings, params).await {
            Ok(response) => response,
            Err(e) => self.fall_back(e),
        }
    }

    async fn redirect(
        &self,
        settings: &SlackSettings,
        params: serde_json::Value,
    ) -> anyhow::Result<HookResponse> {
        let ask: AskParams = serde_json::from_value(params.clone())
            .context("parsing AskUserQuestion parameters")?;
        let gateway = match &self.gateway {
            Some(g) => Arc::clone(g),
            None => Arc::new(SlackGateway::new(settings.bot_token.clone())),
        };

        let resolution = QuestionDispatcher::new(gateway.as_ref(), settings)
            .resolve(&ask.questions)
            .await
            .context("sending questions to Slack")?;

        match resolution {
            Resolution::Answered(answers) => {
                let mut modified = match params {
                    serde_json::Value::Object(map) => map,
                    _ => serde_json::Map::new(),
                };
                let answers: serde_json::Map<String, serde_json::Value> = answers
                    .into_iter()
                    .map(|(question, answer)| (question, serde_json::Value::String(answer.value)))
                    .collect();
                modified.insert("answers".to_string(), serde_json::Value::Object(answers));
                Ok(HookResponse::answered(serde_json::Value::Object(modified)))
            }
            Resolution::TimedOut => {
                log::error!("timeout waiting for response");
                Ok(HookResponse::denied(TIMEOUT_ERROR))
            }
        }
    }
}
