//! Relays new posts from one Twitter/X account to one Telegram chat.
//!
//! [`bootstrap`](bootstrap::bootstrap) resolves the account and seeds an
//! in-memory cursor, then a [`Scheduler`](scheduler::Scheduler) runs
//! [`PollCycle`](poll::PollCycle)s forever: fetch newer posts, send them
//! oldest first, advance the cursor, wait, repeat.

pub mod bootstrap;
pub mod config;
pub mod cursor;
pub mod error;
pub mod feeds;
pub mod notify;
pub mod poll;
pub mod scheduler;
pub mod ui;

#[cfg(test)]
mod testing;

use config::Config;
use error::RelayError;
use feeds::twitter::TwitterReader;
use notify::telegram::TelegramSink;
use poll::PollCycle;
use scheduler::Scheduler;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use ui::Countdown;

/// Knobs that come from the command line rather than the config file.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub max_cycles: Option<u64>,
    pub hide_progress: bool,
}

/// Build the HTTP clients, bootstrap, and poll until `shutdown` fires.
///
/// Every error returned here has already been logged where it happened;
/// callers only need to turn it into an exit status.
pub async fn run(
    config: Config,
    options: RunOptions,
    shutdown: CancellationToken,
) -> Result<(), RelayError> {
    let monitor = &config.monitor;
    let reader = TwitterReader::new(&config.twitter, monitor.request_timeout)
        .map_err(log_client_error)?;
    let sink = TelegramSink::new(&config.telegram, monitor.request_timeout)
        .map_err(log_client_error)?;
    info!(handle = %monitor.handle, chat_id = %config.telegram.chat_id, "Clients ready");

    let bootstrapped = tokio::select! {
        biased;
        _ = shutdown.cancelled() => {
            info!("Shutdown requested during startup");
            return Ok(());
        }
        result = bootstrap::bootstrap(&reader, &sink, &monitor.handle) => result?,
    };
    let (target, mut tracker) = bootstrapped;

    let cycle = PollCycle::new(&reader, &sink, &target).with_cooldown(monitor.rate_limit_cooldown);
    let countdown = Countdown::new(
        monitor.countdown_steps,
        monitor.show_progress && !options.hide_progress,
    );

    Scheduler::new(cycle)
        .with_interval(monitor.poll_interval)
        .with_countdown(countdown)
        .with_max_cycles(options.max_cycles)
        .run(&mut tracker, &shutdown)
        .await;

    Ok(())
}

fn log_client_error(e: reqwest::Error) -> RelayError {
    error!(error = %e, "Error building HTTP client");
    RelayError::Client(e)
}
