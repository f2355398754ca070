//! One fetch-and-forward pass over the monitored account.

use crate::cursor::CursorTracker;
use crate::feeds::{FetchResult, MonitorTarget, Post, SourceReader};
use crate::notify::{DeliveryOutcome, NotificationSink};
use crate::ui::countdown::{sleep_or_cancel, WaitOutcome};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Default pause after the source reports a rate limit.
pub const RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(15 * 60);

/// Message body relayed for each post.
pub fn format_post(handle: &str, post: &Post) -> String {
    format!("New post by @{}:\n\n{}", handle, post.text)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub post_id: String,
    pub outcome: DeliveryOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// At least one post was found; every one was attempted in order.
    Forwarded(Vec<Delivery>),
    /// The fetch succeeded with nothing new.
    Idle,
    /// Source refused the request; the cooldown was served.
    RateLimited,
    /// Fetch failed for any other reason; nothing was sent.
    FetchFailed,
    /// Shutdown fired during the rate-limit cooldown.
    Interrupted,
}

impl CycleOutcome {
    pub fn delivered(&self) -> usize {
        match self {
            CycleOutcome::Forwarded(d) => d.iter().filter(|d| d.outcome.is_sent()).count(),
            _ => 0,
        }
    }

    pub fn failed(&self) -> usize {
        match self {
            CycleOutcome::Forwarded(d) => d.iter().filter(|d| !d.outcome.is_sent()).count(),
            _ => 0,
        }
    }
}

pub struct PollCycle<'a> {
    reader: &'a dyn SourceReader,
    sink: &'a dyn NotificationSink,
    target: &'a MonitorTarget,
    cooldown: Duration,
}

impl<'a> PollCycle<'a> {
    pub fn new(
        reader: &'a dyn SourceReader,
        sink: &'a dyn NotificationSink,
        target: &'a MonitorTarget,
    ) -> Self {
        Self {
            reader,
            sink,
            target,
            cooldown: RATE_LIMIT_COOLDOWN,
        }
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Fetch everything newer than the tracker's cursor and relay it.
    ///
    /// The cursor moves past every attempted post whether or not the send
    /// succeeded; a failed delivery is logged and dropped. On any fetch
    /// failure the cursor is left exactly as it was.
    pub async fn run(
        &self,
        tracker: &mut CursorTracker,
        shutdown: &CancellationToken,
    ) -> CycleOutcome {
        let cursor = tracker.current();
        let handle = self.target.handle.as_str();

        let posts = match self.reader.fetch_since(&self.target.account_id, &cursor).await {
            FetchResult::Items(posts) => posts,
            FetchResult::RateLimited { reset_at } => {
                warn!(
                    handle,
                    reset_at = ?reset_at,
                    cooldown_secs = self.cooldown.as_secs(),
                    "Rate limit exceeded. Waiting before retrying..."
                );
                return match sleep_or_cancel(self.cooldown, shutdown).await {
                    WaitOutcome::Elapsed => CycleOutcome::RateLimited,
                    WaitOutcome::Cancelled => CycleOutcome::Interrupted,
                };
            }
            FetchResult::Transient(e) => {
                error!(
                    handle,
                    status = ?e.status(),
                    details = %e.diagnostics(),
                    "Error fetching posts"
                );
                return CycleOutcome::FetchFailed;
            }
            FetchResult::Fatal(e) => {
                error!(
                    handle,
                    status = ?e.status(),
                    details = %e.diagnostics(),
                    "Error fetching posts; check the source credentials"
                );
                return CycleOutcome::FetchFailed;
            }
        };

        if posts.is_empty() {
            info!(handle, "No new posts found");
            return CycleOutcome::Idle;
        }

        let mut deliveries = Vec::with_capacity(posts.len());
        for post in posts {
            let message = format_post(handle, &post);
            let outcome = DeliveryOutcome::from(self.sink.send(&message).await);

            match &outcome {
                DeliveryOutcome::Sent => {
                    info!(channel = self.sink.name(), post_id = %post.id, "Message sent");
                }
                DeliveryOutcome::Failed(reason) => {
                    warn!(
                        channel = self.sink.name(),
                        post_id = %post.id,
                        error = %reason,
                        "Error sending message; post will not be retried"
                    );
                }
            }

            tracker.advance(post.id.clone());
            deliveries.push(Delivery {
                post_id: post.id,
                outcome,
            });
        }

        let outcome = CycleOutcome::Forwarded(deliveries);
        info!(
            handle,
            delivered = outcome.delivered(),
            failed = outcome.failed(),
            last_seen_id = tracker.last_seen_id().unwrap_or_default(),
            "New posts found and processed"
        );
        outcome
    }
}
