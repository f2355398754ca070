//! Startup sequence: resolve the account, seed the cursor, say hello.

use crate::cursor::{Cursor, CursorTracker};
use crate::error::RelayError;
use crate::feeds::{MonitorTarget, SourceReader};
use crate::notify::NotificationSink;
use chrono::Utc;
use tracing::{error, info, warn};

pub const STARTUP_MESSAGE: &str = "Bot started and connected successfully!";

/// Resolve `handle`, seed the cursor from its newest existing post and send
/// the liveness message.
///
/// Only a failed account lookup is an error. A failed seed fetch leaves the
/// cursor empty so the start-time bound alone filters old posts, and a failed
/// liveness message is only logged.
pub async fn bootstrap(
    reader: &dyn SourceReader,
    sink: &dyn NotificationSink,
    handle: &str,
) -> Result<(MonitorTarget, CursorTracker), RelayError> {
    let account_id = match reader.resolve_account(handle).await {
        Ok(id) => id,
        Err(source) => {
            error!(
                handle,
                status = ?source.status(),
                details = %source.diagnostics(),
                "Error fetching user ID"
            );
            return Err(RelayError::AccountResolution {
                handle: handle.to_string(),
                source,
            });
        }
    };
    info!(handle, account_id = %account_id, "Fetched user ID");

    let start_time = Utc::now();
    let last_seen_id = match reader.latest_post(&account_id).await {
        Ok(Some(post)) => {
            info!(post_id = %post.id, "Initialized last post ID");
            Some(post.id)
        }
        Ok(None) => {
            warn!(handle, "No initial post found");
            None
        }
        Err(e) => {
            error!(
                handle,
                status = ?e.status(),
                details = %e.diagnostics(),
                "Error fetching initial posts"
            );
            None
        }
    };

    match sink.send(STARTUP_MESSAGE).await {
        Ok(()) => info!(channel = sink.name(), "Startup message sent"),
        Err(e) => error!(channel = sink.name(), error = %e, "Error sending startup message"),
    }

    let target = MonitorTarget {
        handle: handle.to_string(),
        account_id,
    };
    Ok((target, CursorTracker::new(Cursor::new(last_seen_id, start_time))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::testing::{post, RecordingSink, ScriptedReader};

    #[tokio::test]
    async fn test_seeds_from_latest_post() {
        let reader = ScriptedReader::new(vec![]).with_latest(Ok(Some(post("100", "old"))));
        let sink = RecordingSink::new();
        let before = Utc::now();

        let (target, tracker) = bootstrap(&reader, &sink, "alice").await.unwrap();

        assert_eq!(target.handle, "alice");
        assert_eq!(target.account_id, "42");
        assert_eq!(tracker.last_seen_id(), Some("100"));
        let start = tracker.current().start_time;
        assert!(start >= before && start <= Utc::now());
        assert_eq!(sink.messages(), vec![STARTUP_MESSAGE]);
    }

    #[tokio::test]
    async fn test_no_history_leaves_cursor_empty() {
        let reader = ScriptedReader::new(vec![]).with_latest(Ok(None));
        let sink = RecordingSink::new();

        let (_, tracker) = bootstrap(&reader, &sink, "alice").await.unwrap();

        assert_eq!(tracker.last_seen_id(), None);
    }

    #[tokio::test]
    async fn test_seed_failure_is_not_fatal() {
        let reader = ScriptedReader::new(vec![])
            .with_latest(Err(FetchError::NotFound("timeline".to_string())));
        let sink = RecordingSink::new();

        let (_, tracker) = bootstrap(&reader, &sink, "alice").await.unwrap();

        assert_eq!(tracker.last_seen_id(), None);
        assert_eq!(sink.attempts(), 1);
    }

    #[tokio::test]
    async fn test_unresolvable_account_aborts() {
        let reader = ScriptedReader::new(vec![])
            .with_account(Err(FetchError::NotFound("@ghost: user not found".to_string())));
        let sink = RecordingSink::new();

        let err = bootstrap(&reader, &sink, "ghost").await.unwrap_err();

        assert!(matches!(err, RelayError::AccountResolution { ref handle, .. } if handle == "ghost"));
        assert_eq!(sink.attempts(), 0);
    }

    #[tokio::test]
    async fn test_startup_message_failure_is_logged_only() {
        let reader = ScriptedReader::new(vec![]).with_latest(Ok(Some(post("1", "x"))));
        let sink = RecordingSink::failing_on(&[0]);

        let (_, tracker) = bootstrap(&reader, &sink, "alice").await.unwrap();

        assert_eq!(tracker.last_seen_id(), Some("1"));
    }
}
