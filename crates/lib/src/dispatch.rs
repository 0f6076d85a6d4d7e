//! Question dispatcher: format, post and poll each question of a batch in order.

use chrono::Utc;

use crate::channels::{ChatGateway, DeliveryError};
use crate::config::SlackSettings;
use crate::format::{error_message, format_question, sanitize, MessageOrigin};
use crate::poller::{predicate_for, PollOutcome, PollSchedule, ReplyPredicate, ResponsePoller};
use crate::question::{Answer, CorrelationId, PostedMessage, Question};

/// Result of resolving a batch of questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Every question was answered; keyed by the question text as received.
    Answered(Vec<(String, Answer)>),
    /// A question went unanswered until the deadline; earlier answers are discarded.
    TimedOut,
}

pub struct QuestionDispatcher<'a> {
    gateway: &'a dyn ChatGateway,
    settings: &'a SlackSettings,
    predicate: Box<dyn ReplyPredicate>,
}

impl<'a> QuestionDispatcher<'a> {
    pub fn new(gateway: &'a dyn ChatGateway, settings: &'a SlackSettings) -> Self {
        Self {
            gateway,
            settings,
            predicate: predicate_for(settings.reply_policy),
        }
    }

    /// Replace the configured reply predicate.
    pub fn with_predicate(mut self, predicate: Box<dyn ReplyPredicate>) -> Self {
        self.predicate = predicate;
        self
    }

    /// Resolve questions one after another. A failed post aborts the batch with the error.
    pub async fn resolve(&self, questions: &[Question]) -> Result<Resolution, DeliveryError> {
        let schedule = PollSchedule::new(
            self.settings.poll_interval_seconds,
            self.settings.timeout_minutes,
        );
        let poller = ResponsePoller::new(self.gateway, schedule, self.predicate.as_ref());
        let total = questions.len();
        let mut answers = Vec::with_capacity(total);

        for (i, question) in questions.iter().enumerate() {
            let mut text = if self.settings.sanitize_messages {
                sanitize(&question.text)
            } else {
                question.text.clone()
            };
            if total > 1 {
                text.push_str(&format!(" ({}/{})", i + 1, total));
            }
            let outgoing = Question {
                text,
                ..question.clone()
            };

            let correlation_id = CorrelationId::generate();
            let payload = format_question(&outgoing, &correlation_id, &MessageOrigin::current());
            log::info!("posting question to Slack ({}/{})", i + 1, total);
            let message_handle = self
                .gateway
                .post_message(&self.settings.channel_id, &payload)
                .await?;
            log::info!("question posted (msg_id: {})", message_handle);

            let posted = PostedMessage {
                channel_id: self.settings.channel_id.clone(),
                message_handle,
                correlation_id,
                posted_at: Utc::now(),
            };
            match poller.await_answer(&posted).await {
                PollOutcome::Answered(answer) => {
                    answers.push((question.text.clone(), answer));
                }
                PollOutcome::TimedOut => {
                    self.post_timeout_notice().await;
                    return Ok(Resolution::TimedOut);
                }
            }
        }

        Ok(Resolution::Answered(answers))
    }

    async fn post_timeout_notice(&self) {
        let notice = error_message(format!(
            "Timeout: No response received after {} minutes. Claude will continue without this answer.",
            self.settings.timeout_minutes.max(0)
        ));
        if let Err(e) = self
            .gateway
            .post_message(&self.settings.channel_id, &notice)
            .await
        {
            log::warn!("could not post timeout notice: {}", e);
        }
    }
}
