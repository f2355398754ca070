//! In-memory doubles for the source and the sink.

use crate::cursor::Cursor;
use crate::error::{ChannelError, FetchError};
use crate::feeds::{FetchResult, Post, SourceReader};
use crate::notify::NotificationSink;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

pub fn post(id: &str, text: &str) -> Post {
    Post {
        id: id.to_string(),
        author_id: "42".to_string(),
        text: text.to_string(),
        created_at: None,
    }
}

/// Replays scripted fetch results in order; an exhausted script yields empty batches.
pub struct ScriptedReader {
    account: Mutex<Option<Result<String, FetchError>>>,
    latest: Mutex<Option<Result<Option<Post>, FetchError>>>,
    script: Mutex<VecDeque<FetchResult>>,
    cursors: Mutex<Vec<Cursor>>,
}

impl ScriptedReader {
    pub fn new(script: Vec<FetchResult>) -> Self {
        Self {
            account: Mutex::new(Some(Ok("42".to_string()))),
            latest: Mutex::new(Some(Ok(None))),
            script: Mutex::new(script.into()),
            cursors: Mutex::new(Vec::new()),
        }
    }

    pub fn with_account(self, account: Result<String, FetchError>) -> Self {
        *self.account.lock().unwrap() = Some(account);
        self
    }

    pub fn with_latest(self, latest: Result<Option<Post>, FetchError>) -> Self {
        *self.latest.lock().unwrap() = Some(latest);
        self
    }

    pub fn seen_cursors(&self) -> Vec<Cursor> {
        self.cursors.lock().unwrap().clone()
    }
}

fn used_up() -> FetchError {
    FetchError::Status {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        headers: Default::default(),
        body: "scripted response already consumed".to_string(),
    }
}

#[async_trait]
impl SourceReader for ScriptedReader {
    async fn resolve_account(&self, _handle: &str) -> Result<String, FetchError> {
        self.account.lock().unwrap().take().unwrap_or_else(|| Err(used_up()))
    }

    async fn latest_post(&self, _account_id: &str) -> Result<Option<Post>, FetchError> {
        self.latest.lock().unwrap().take().unwrap_or_else(|| Err(used_up()))
    }

    async fn fetch_since(&self, _account_id: &str, cursor: &Cursor) -> FetchResult {
        self.cursors.lock().unwrap().push(cursor.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(FetchResult::Items(Vec::new()))
    }
}

/// Records every message; attempts whose index is in `fail_on` report an error.
pub struct RecordingSink {
    fail_on: HashSet<usize>,
    attempts: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::failing_on(&[])
    }

    pub fn failing_on(indexes: &[usize]) -> Self {
        Self {
            fail_on: indexes.iter().copied().collect(),
            attempts: Mutex::new(Vec::new()),
        }
    }

    /// Every message handed to `send`, including failed ones.
    pub fn messages(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, text: &str) -> Result<(), ChannelError> {
        let mut attempts = self.attempts.lock().unwrap();
        let index = attempts.len();
        attempts.push(text.to_string());

        if self.fail_on.contains(&index) {
            Err(ChannelError::Api {
                status: StatusCode::BAD_REQUEST,
                description: format!("scripted failure #{}", index),
            })
        } else {
            Ok(())
        }
    }
}
