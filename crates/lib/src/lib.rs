//! slack-notify core library — redirects the agent's `AskUserQuestion` to a Slack thread
//! and returns the answers, falling back to the local prompt whenever Slack is unavailable.

pub mod channels;
pub mod config;
pub mod diagnostics;
pub mod dispatch;
pub mod format;
pub mod hook;
pub mod poller;
pub mod question;
