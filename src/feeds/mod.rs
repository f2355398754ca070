pub mod twitter;

use crate::cursor::Cursor;
use crate::error::FetchError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// The account being watched. Resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorTarget {
    pub handle: String,
    pub account_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub text: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub enum FetchResult {
    /// New posts, oldest first. Empty when nothing is new.
    Items(Vec<Post>),
    RateLimited {
        reset_at: Option<DateTime<Utc>>,
    },
    Transient(FetchError),
    Fatal(FetchError),
}

#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Look up the stable account id for a handle.
    async fn resolve_account(&self, handle: &str) -> Result<String, FetchError>;

    /// Most recent post by the account with no time or id bound.
    async fn latest_post(&self, account_id: &str) -> Result<Option<Post>, FetchError>;

    /// Posts newer than `cursor`, returned oldest-to-newest.
    async fn fetch_since(&self, account_id: &str, cursor: &Cursor) -> FetchResult;
}
