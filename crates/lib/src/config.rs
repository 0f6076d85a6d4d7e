//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (`~/.claude/slack-notify.json` by default) and environment.
//! A missing file, a disabled feature, or an absent bot token / channel id make the redirect inert.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 45;
const DEFAULT_TIMEOUT_MINUTES: i64 = 30;

/// On-disk config for the Slack redirect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// When false, questions are never redirected (default true).
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Bot token (`xoxb-...`). Overridden by SLACK_BOT_TOKEN env.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,

    /// Channel the questions are posted to (e.g. "C0123456789").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,

    /// Seconds between thread-reply fetches (default 45; 0 means default).
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,

    /// Minutes to wait for a reply before giving up (default 30; 0 means default).
    #[serde(default = "default_timeout_minutes")]
    pub timeout_minutes: i64,

    /// Default log filter for the CLI when RUST_LOG is unset (default "info").
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Redact path-like and token-like substrings from question text before posting.
    #[serde(default)]
    pub sanitize_messages: bool,

    /// Which thread replies count as the answer.
    #[serde(default)]
    pub reply_policy: ReplyPolicy,
}

/// Which thread replies may answer a question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReplyPolicy {
    /// The first reply in the thread wins, whoever wrote it.
    #[default]
    Any,
    /// Replies posted by bots (including this one) are skipped.
    HumanOnly,
}

fn default_enabled() -> bool {
    true
}

fn default_poll_interval_seconds() -> u64 {
    DEFAULT_POLL_INTERVAL_SECONDS
}

fn default_timeout_minutes() -> i64 {
    DEFAULT_TIMEOUT_MINUTES
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            bot_token: None,
            channel_id: None,
            poll_interval_seconds: default_poll_interval_seconds(),
            timeout_minutes: default_timeout_minutes(),
            log_level: default_log_level(),
            sanitize_messages: false,
            reply_policy: ReplyPolicy::default(),
        }
    }
}

/// Validated settings for one redirect. Only exists when the config is usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackSettings {
    pub bot_token: String,
    pub channel_id: String,
    pub poll_interval_seconds: u64,
    pub timeout_minutes: i64,
    pub sanitize_messages: bool,
    pub reply_policy: ReplyPolicy,
}

impl Config {
    /// Settings for redirecting questions, or None when the feature is disabled or
    /// the bot token / channel id is missing.
    pub fn slack_settings(&self) -> Option<SlackSettings> {
        if !self.enabled {
            log::debug!("slack redirect disabled in config");
            return None;
        }
        let bot_token = non_empty(self.bot_token.as_deref());
        let channel_id = non_empty(self.channel_id.as_deref());
        let (Some(bot_token), Some(channel_id)) = (bot_token, channel_id) else {
            log::warn!("slack config missing required fields (botToken, channelId)");
            return None;
        };
        Some(SlackSettings {
            bot_token,
            channel_id,
            poll_interval_seconds: if self.poll_interval_seconds == 0 {
                DEFAULT_POLL_INTERVAL_SECONDS
            } else {
                self.poll_interval_seconds
            },
            timeout_minutes: if self.timeout_minutes == 0 {
                DEFAULT_TIMEOUT_MINUTES
            } else {
                self.timeout_minutes
            },
            sanitize_messages: self.sanitize_messages,
            reply_policy: self.reply_policy,
        })
    }
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Resolve the bot token from env SLACK_BOT_TOKEN, if set and non-empty.
fn env_bot_token() -> Option<String> {
    std::env::var("SLACK_BOT_TOKEN")
        .ok()
        .and_then(|s| non_empty(Some(&s)))
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("SLACK_NOTIFY_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".claude").join("slack-notify.json"))
                .unwrap_or_else(|| PathBuf::from("slack-notify.json"))
        })
}

/// Load config from the given path (or the default). Missing file => Ok(None).
/// SLACK_BOT_TOKEN overrides the token from the file.
pub fn load_config(path: Option<PathBuf>) -> Result<(Option<Config>, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    if !path.exists() {
        log::debug!("config file not found: {}", path.display());
        return Ok((None, path));
    }
    let s = std::fs::read_to_string(&path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let mut config: Config = serde_json::from_str(&s)
        .with_context(|| format!("parsing config from {}", path.display()))?;
    if let Some(token) = env_bot_token() {
        config.bot_token = Some(token);
    }
    Ok((Some(config), path))
}

/// Write config as pretty JSON, creating the parent directory. The file is made owner-only on Unix.
pub fn write_config(path: &Path, config: &Config) -> Result<()> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating config directory {}", dir.display()))?;
    }
    let body = serde_json::to_string_pretty(config).context("serializing config")?;
    std::fs::write(path, body)
        .with_context(|| format!("writing config to {}", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("restricting permissions on {}", path.display()))?;
    }
    Ok(())
}

/// Fields to change in an existing config. None leaves the current value.
#[derive(Debug, Clone, Default)]
pub struct ConfigUpdate {
    pub enabled: Option<bool>,
    pub bot_token: Option<String>,
    pub channel_id: Option<String>,
    pub poll_interval_seconds: Option<u64>,
    pub timeout_minutes: Option<i64>,
    pub sanitize_messages: Option<bool>,
}

/// Merge `update` into the config at `path` (or defaults when the file is absent) and write it back.
pub fn update_config(path: &Path, update: ConfigUpdate) -> Result<Config> {
    let mut config = if path.exists() {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s).with_context(|| format!("parsing config from {}", path.display()))?
    } else {
        Config::default()
    };
    if let Some(v) = update.enabled {
        config.enabled = v;
    }
    if let Some(v) = update.bot_token {
        config.bot_token = Some(v);
    }
    if let Some(v) = update.channel_id {
        config.channel_id = Some(v);
    }
    if let Some(v) = update.poll_interval_seconds {
        config.poll_interval_seconds = v;
    }
    if let Some(v) = update.timeout_minutes {
        config.timeout_minutes = v;
    }
    if let Some(v) = update.sanitize_messages {
        config.sanitize_messages = v;
    }
    write_config(path, &config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usable() -> Config {
        Config {
            bot_token: Some("xoxb-test".to_string()),
            channel_id: Some("C0123456789".to_string()),
            ..Config::default()
        }
    }

    #[test]
    fn defaults_from_empty_json() {
        let config: Config = serde_json::from_str("{}").expect("parse");
        assert!(config.enabled);
        assert_eq!(config.poll_interval_seconds, 45);
        assert_eq!(config.timeout_minutes, 30);
        assert_eq!(config.log_level, "info");
        assert!(!config.sanitize_messages);
        assert_eq!(config.reply_policy, ReplyPolicy::Any);
    }

    #[test]
    fn camel_case_keys() {
        let config: Config = serde_json::from_str(
            r#"{"botToken":"xoxb-1","channelId":"C1","pollIntervalSeconds":5,"timeoutMinutes":2,"sanitizeMessages":true,"replyPolicy":"humanOnly"}"#,
        )
        .expect("parse");
        let settings = config.slack_settings().expect("usable");
        assert_eq!(settings.bot_token, "xoxb-1");
        assert_eq!(settings.channel_id, "C1");
        assert_eq!(settings.poll_interval_seconds, 5);
        assert_eq!(settings.timeout_minutes, 2);
        assert!(settings.sanitize_messages);
        assert_eq!(settings.reply_policy, ReplyPolicy::HumanOnly);
    }

    #[test]
    fn missing_channel_is_unusable() {
        let mut config = usable();
        config.channel_id = None;
        assert!(config.slack_settings().is_none());
        config.channel_id = Some("   ".to_string());
        assert!(config.slack_settings().is_none());
    }

    #[test]
    fn missing_token_is_unusable() {
        let mut config = usable();
        config.bot_token = Some(String::new());
        assert!(config.slack_settings().is_none());
    }

    #[test]
    fn disabled_is_unusable() {
        let mut config = usable();
        config.enabled = false;
        assert!(config.slack_settings().is_none());
    }

    #[test]
    fn zero_interval_and_timeout_fall_back_to_defaults() {
        let mut config = usable();
        config.poll_interval_seconds = 0;
        config.timeout_minutes = 0;
        let settings = config.slack_settings().expect("usable");
        assert_eq!(settings.poll_interval_seconds, 45);
        assert_eq!(settings.timeout_minutes, 30);
    }

    #[test]
    fn load_missing_file_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.json");
        let (config, used) = load_config(Some(path.clone())).expect("load");
        assert!(config.is_none());
        assert_eq!(used, path);
    }

    #[test]
    fn load_malformed_file_is_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("slack-notify.json");
        std::fs::write(&path, "{ not json").expect("write");
        assert!(load_config(Some(path)).is_err());
    }

    #[test]
    fn update_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("slack-notify.json");
        update_config(
            &path,
            ConfigUpdate {
                bot_token: Some("xoxb-written".to_string()),
                channel_id: Some("C42".to_string()),
                ..ConfigUpdate::default()
            },
        )
        .expect("write");
        update_config(
            &path,
            ConfigUpdate {
                timeout_minutes: Some(5),
                ..ConfigUpdate::default()
            },
        )
        .expect("update");

        let s = std::fs::read_to_string(&path).expect("read");
        let config: Config = serde_json::from_str(&s).expect("parse");
        assert_eq!(config.channel_id.as_deref(), Some("C42"));
        assert_eq!(config.bot_token.as_deref(), Some("xoxb-written"));
        assert_eq!(config.timeout_minutes, 5);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).expect("metadata").permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }
}
