//! Outbound chat delivery.

pub mod telegram;

use crate::error::ChannelError;
use async_trait::async_trait;

/// A single fixed destination for text messages.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Short name used in log fields.
    fn name(&self) -> &'static str;

    /// Deliver one message. Exactly one outbound attempt; no retries.
    async fn send(&self, text: &str) -> Result<(), ChannelError>;
}

/// Result of one delivery attempt, as recorded by a poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    Failed(String),
}

impl DeliveryOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, DeliveryOutcome::Sent)
    }
}

impl From<Result<(), ChannelError>> for DeliveryOutcome {
    fn from(result: Result<(), ChannelError>) -> Self {
        match result {
            Ok(()) => DeliveryOutcome::Sent,
            Err(e) => DeliveryOutcome::Failed(e.to_string()),
        }
    }
}
