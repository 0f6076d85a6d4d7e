//! Response poller: waits for a reply in a posted message's thread.
//!
//! The wait is a small state machine (`Posted -> Polling -> Answered | TimedOut`) driven by a
//! deadline. Every tick sleeps for the poll interval (never past the deadline), then fetches the
//! thread. Fetch errors are logged and the next tick tries again; only the deadline ends the wait
//! without an answer. Dropping the returned future abandons the posted message.

use std::time::Duration;
use tokio::time::{sleep_until, Instant};

use crate::channels::{ChatGateway, Reply};
use crate::config::ReplyPolicy;
use crate::question::{Answer, PostedMessage};

const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Longest wait a schedule allows (about a century).
const MAX_TIMEOUT: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Poll interval and overall timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollSchedule {
    /// Interval in seconds (at least one), timeout in minutes (zero or negative means no wait,
    /// capped at about a century).
    pub fn new(interval_seconds: u64, timeout_minutes: i64) -> Self {
        let timeout_secs = u64::try_from(timeout_minutes)
            .unwrap_or(0)
            .saturating_mul(60);
        Self {
            interval: Duration::from_secs(interval_seconds).max(MIN_POLL_INTERVAL),
            timeout: Duration::from_secs(timeout_secs).min(MAX_TIMEOUT),
        }
    }
}

/// Decides whether a thread reply answers the question.
pub trait ReplyPredicate: Send + Sync {
    fn is_qualifying(&self, reply: &Reply) -> bool;
}

/// Any reply qualifies: the first reply in the thread is the answer, whoever posted it.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyReply;

impl ReplyPredicate for AnyReply {
    fn is_qualifying(&self, _reply: &Reply) -> bool {
        true
    }
}

/// Replies posted by bots are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct HumanReplies;

impl ReplyPredicate for HumanReplies {
    fn is_qualifying(&self, reply: &Reply) -> bool {
        reply.bot_id.is_none()
    }
}

/// Predicate for the configured reply policy.
pub fn predicate_for(policy: ReplyPolicy) -> Box<dyn ReplyPredicate> {
    match policy {
        ReplyPolicy::Any => Box::new(AnyReply),
        ReplyPolicy::HumanOnly => Box::new(HumanReplies),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Answered(Answer),
    TimedOut,
}

#[derive(Debug)]
enum PollState {
    Posted,
    Polling { attempt: u32 },
    Answered(Answer),
    TimedOut,
}

/// Polls one gateway on one schedule with one reply predicate.
pub struct ResponsePoller<'a> {
    gateway: &'a dyn ChatGateway,
    schedule: PollSchedule,
    predicate: &'a dyn ReplyPredicate,
}

impl<'a> ResponsePoller<'a> {
    pub fn new(
        gateway: &'a dyn ChatGateway,
        schedule: PollSchedule,
        predicate: &'a dyn ReplyPredicate,
    ) -> Self {
        Self {
            gateway,
            schedule,
            predicate,
        }
    }

    /// Wait for the first qualifying reply to `posted`, or time out.
    pub async fn await_answer(&self, posted: &PostedMessage) -> PollOutcome {
        let now = Instant::now();
        let deadline = now
            .checked_add(self.schedule.timeout)
            .unwrap_or_else(|| now + MAX_TIMEOUT);
        let mut state = PollState::Posted;
        loop {
            state = match state {
                PollState::Posted if self.schedule.timeout.is_zero() => PollState::TimedOut,
                PollState::Posted => PollState::Polling { attempt: 0 },
                PollState::Polling { attempt } => self.tick(posted, attempt, deadline).await,
                PollState::Answered(answer) => {
                    log::info!(
                        "answer received for {} (msg_id: {})",
                        posted.correlation_id,
                        posted.message_handle
                    );
                    return PollOutcome::Answered(answer);
                }
                PollState::TimedOut => {
                    log::info!(
                        "polling timeout reached for {} (msg_id: {})",
                        posted.correlation_id,
                        posted.message_handle
                    );
                    return PollOutcome::TimedOut;
                }
            };
        }
    }

    async fn tick(&self, posted: &PostedMessage, attempt: u32, deadline: Instant) -> PollState {
        let now = Instant::now();
        if now >= deadline {
            return PollState::TimedOut;
        }
        let next = now
            .checked_add(self.schedule.interval)
            .map_or(deadline, |t| t.min(deadline));
        sleep_until(next).await;

        let attempt = attempt + 1;
        log::debug!("polling for response... (attempt {})", attempt);
        match self
            .gateway
            .thread_replies(&posted.channel_id, &posted.message_handle)
            .await
        {
            Ok(replies) => match replies.into_iter().find(|r| self.predicate.is_qualifying(r)) {
                Some(reply) => {
                    log::debug!("received thread reply at {}", reply.authored_at);
                    PollState::Answered(Answer::text(reply.text))
                }
                None => PollState::Polling { attempt },
            },
            Err(e) => {
                log::warn!("error during polling (attempt {}): {}", attempt, e);
                PollState::Polling { attempt }
            }
        }
    }
}
