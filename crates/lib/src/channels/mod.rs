//! Chat gateway: the capability interface over the remote chat service, and its Slack implementation.
//!
//! The poller and dispatcher only see [`ChatGateway`]; [`SlackGateway`] talks to the Slack Web API.

mod gateway;
mod slack;

pub use gateway::{ChannelInfo, ChannelVisibility, ChatGateway, DeliveryError, IdentityInfo, Reply};
pub use slack::{slack_api_base, SlackGateway};
