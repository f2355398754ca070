use crate::cursor::CursorTracker;
use crate::poll::{CycleOutcome, PollCycle};
use crate::ui::{Countdown, WaitOutcome};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Default pause between the end of one cycle and the start of the next.
pub const POLL_INTERVAL: Duration = Duration::from_secs(120);

/// Runs poll cycles back to back with a fixed wait in between.
pub struct Scheduler<'a> {
    cycle: PollCycle<'a>,
    interval: Duration,
    countdown: Countdown,
    max_cycles: Option<u64>,
}

impl<'a> Scheduler<'a> {
    pub fn new(cycle: PollCycle<'a>) -> Self {
        Self {
            cycle,
            interval: POLL_INTERVAL,
            countdown: Countdown::hidden(),
            max_cycles: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_countdown(mut self, countdown: Countdown) -> Self {
        self.countdown = countdown;
        self
    }

    /// Stop after `limit` cycles instead of running forever.
    pub fn with_max_cycles(mut self, limit: Option<u64>) -> Self {
        self.max_cycles = limit;
        self
    }

    /// Loop until shutdown (or the cycle limit). Returns the number of cycles run.
    ///
    /// Cycles never overlap: the wait only starts once the previous cycle,
    /// including any rate-limit cooldown, has returned.
    pub async fn run(&self, tracker: &mut CursorTracker, shutdown: &CancellationToken) -> u64 {
        let mut cycles = 0u64;

        while !shutdown.is_cancelled() {
            let outcome = self.cycle.run(tracker, shutdown).await;
            cycles += 1;
            debug!(cycle = cycles, outcome = ?outcome, "Fetched posts");

            if outcome == CycleOutcome::Interrupted {
                break;
            }
            if self.max_cycles.is_some_and(|limit| cycles >= limit) {
                info!(cycles, "Cycle limit reached");
                break;
            }

            info!(wait_secs = self.interval.as_secs(), "Waiting for next fetch cycle");
            if self.countdown.wait(self.interval, shutdown).await == WaitOutcome::Cancelled {
                break;
            }
        }

        info!(
            cycles,
            last_seen_id = tracker.last_seen_id().unwrap_or_default(),
            "Scheduler stopped"
        );
        cycles
    }
}
