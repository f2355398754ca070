use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Upper bound on bar resolution; finer steps only add timer churn.
pub const MAX_COUNTDOWN_STEPS: u64 = 1000;

/// Coarse progress bar shown while waiting between cycles.
///
/// Purely cosmetic: each step sleeps until its own deadline measured from the
/// start of the wait, so the total never drifts past `total`. The bar is
/// hidden when disabled or when stderr is not a terminal.
#[derive(Debug, Clone)]
pub struct Countdown {
    steps: u64,
    visible: bool,
}

/// How a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Elapsed,
    Cancelled,
}

impl Countdown {
    pub fn new(steps: u64, visible: bool) -> Self {
        Self {
            steps: steps.min(MAX_COUNTDOWN_STEPS),
            visible,
        }
    }

    pub fn hidden() -> Self {
        Self::new(0, false)
    }

    fn bar(&self) -> ProgressBar {
        if !self.visible || self.steps == 0 {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(self.steps);
        if let Ok(style) = ProgressStyle::with_template("{bar:40} {percent:>3}% | ETA: {eta}") {
            bar.set_style(style.progress_chars("█░ "));
        }
        bar
    }

    /// Sleep for `total`, returning early if `shutdown` fires.
    pub async fn wait(&self, total: Duration, shutdown: &CancellationToken) -> WaitOutcome {
        if self.steps == 0 {
            return sleep_or_cancel(total, shutdown).await;
        }

        let bar = self.bar();
        let start = Instant::now();
        // Bounded by MAX_COUNTDOWN_STEPS in `new`.
        let steps = u32::try_from(self.steps).unwrap_or(u32::MAX);
        let mut outcome = WaitOutcome::Elapsed;

        for step in 1..=steps {
            let offset = total
                .checked_mul(step)
                .map_or(total, |scaled| scaled / steps);
            let deadline = start + offset;
            if sleep_until_or_cancel(deadline, shutdown).await == WaitOutcome::Cancelled {
                outcome = WaitOutcome::Cancelled;
                break;
            }
            bar.inc(1);
        }

        bar.finish_and_clear();
        outcome
    }
}

pub async fn sleep_or_cancel(duration: Duration, shutdown: &CancellationToken) -> WaitOutcome {
    sleep_until_or_cancel(Instant::now() + duration, shutdown).await
}

async fn sleep_until_or_cancel(deadline: Instant, shutdown: &CancellationToken) -> WaitOutcome {
    tokio::select! {
        _ = tokio::time::sleep_until(deadline) => WaitOutcome::Elapsed,
        _ = shutdown.cancelled() => WaitOutcome::Cancelled,
    }
}
