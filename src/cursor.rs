use chrono::{DateTime, SecondsFormat, Utc};

/// How far polling has progressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    /// Id of the last post handed to the sink. `None` until the first one.
    pub last_seen_id: Option<String>,
    /// Lower time bound for every fetch; fixed at bootstrap.
    pub start_time: DateTime<Utc>,
}

impl Cursor {
    pub fn new(last_seen_id: Option<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            last_seen_id,
            start_time,
        }
    }

    /// `start_time` in the form the tweets endpoint accepts (`2024-01-02T03:04:05Z`).
    pub fn start_time_param(&self) -> String {
        self.start_time.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Owns the in-memory cursor. Nothing is persisted; a restart re-seeds from
/// the latest post.
#[derive(Debug, Clone)]
pub struct CursorTracker {
    cursor: Cursor,
}

impl CursorTracker {
    pub fn new(cursor: Cursor) -> Self {
        Self { cursor }
    }

    /// Record `id` as the last processed post. The caller's processing order
    /// is trusted; ids are opaque and never compared.
    pub fn advance(&mut self, id: impl Into<String>) {
        self.cursor.last_seen_id = Some(id.into());
    }

    pub fn current(&self) -> Cursor {
        self.cursor.clone()
    }

    pub fn last_seen_id(&self) -> Option<&str> {
        self.cursor.last_seen_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_advance_overwrites_and_keeps_start_time() {
        let mut tracker = CursorTracker::new(Cursor::new(None, start()));
        assert_eq!(tracker.last_seen_id(), None);

        tracker.advance("101");
        tracker.advance("102");

        let snapshot = tracker.current();
        assert_eq!(snapshot.last_seen_id.as_deref(), Some("102"));
        assert_eq!(snapshot.start_time, start());
    }

    #[test]
    fn test_advance_does_not_compare_ids() {
        let mut tracker = CursorTracker::new(Cursor::new(Some("900".to_string()), start()));
        tracker.advance("1000");
        assert_eq!(tracker.last_seen_id(), Some("1000"));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut tracker = CursorTracker::new(Cursor::new(Some("5".to_string()), start()));
        let before = tracker.current();
        tracker.advance("6");
        assert_eq!(before.last_seen_id.as_deref(), Some("5"));
    }

    #[test]
    fn test_start_time_param_format() {
        let cursor = Cursor::new(None, start());
        assert_eq!(cursor.start_time_param(), "2024-03-01T12:30:00Z");
    }
}
