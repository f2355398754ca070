use super::{FetchResult, Post, SourceReader};
use crate::config::TwitterConfig;
use crate::cursor::Cursor;
use crate::error::FetchError;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;

const TWEET_FIELDS: &str = "id,text,author_id,created_at";

/// Twitter API v2 client for the two endpoints the relay needs.
pub struct TwitterReader {
    bearer_token: String,
    api_base: String,
    max_results: u32,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct UserLookupResponse {
    data: Option<ApiUser>,
    #[serde(default)]
    errors: Vec<ApiProblem>,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiProblem {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TimelineResponse {
    #[serde(default)]
    data: Vec<ApiTweet>,
}

#[derive(Debug, Deserialize)]
struct ApiTweet {
    id: String,
    text: String,
    #[serde(default)]
    author_id: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl ApiTweet {
    fn into_post(self, fallback_author: &str) -> Post {
        Post {
            id: self.id,
            author_id: self
                .author_id
                .unwrap_or_else(|| fallback_author.to_string()),
            text: self.text,
            created_at: self.created_at,
        }
    }
}

impl TwitterReader {
    pub fn new(config: &TwitterConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tweetrelay/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            bearer_token: config.bearer_token.clone(),
            api_base: config.api_base.clone(),
            max_results: config.max_results,
            client,
        })
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Response, reqwest::Error> {
        self.client
            .get(url)
            .bearer_auth(&self.bearer_token)
            .query(query)
            .send()
            .await
    }

    fn timeline_url(&self, account_id: &str) -> String {
        format!(
            "{}/2/users/{}/tweets",
            self.api_base,
            urlencoding::encode(account_id)
        )
    }

    async fn fetch_timeline(
        &self,
        account_id: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<Post>, FetchError> {
        let response = self.get(&self.timeline_url(account_id), query).await?;
        let body = read_success_body(response).await?;
        let timeline: TimelineResponse = serde_json::from_str(&body)?;

        Ok(timeline
            .data
            .into_iter()
            .map(|t| t.into_post(account_id))
            .collect())
    }
}

/// Turn a non-success response into `FetchError::Status`, keeping headers and body.
async fn read_success_body(response: Response) -> Result<String, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.text().await?);
    }

    let headers = response.headers().clone();
    let body = response.text().await.unwrap_or_default();
    Err(FetchError::Status {
        status,
        headers,
        body,
    })
}

/// Parse the `x-rate-limit-reset` header (epoch seconds).
fn rate_limit_reset(error: &FetchError) -> Option<DateTime<Utc>> {
    let FetchError::Status { headers, .. } = error else {
        return None;
    };
    let secs: i64 = headers
        .get("x-rate-limit-reset")?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()?;
    Utc.timestamp_opt(secs, 0).single()
}

fn classify(error: FetchError) -> FetchResult {
    match error.status() {
        Some(StatusCode::TOO_MANY_REQUESTS) => FetchResult::RateLimited {
            reset_at: rate_limit_reset(&error),
        },
        Some(StatusCode::UNAUTHORIZED) | Some(StatusCode::FORBIDDEN) => FetchResult::Fatal(error),
        _ => FetchResult::Transient(error),
    }
}

#[async_trait]
impl SourceReader for TwitterReader {
    async fn resolve_account(&self, handle: &str) -> Result<String, FetchError> {
        let url = format!(
            "{}/2/users/by/username/{}",
            self.api_base,
            urlencoding::encode(handle)
        );

        let response = self.get(&url, &[("user.fields", "id".to_string())]).await?;
        let body = read_success_body(response).await?;
        let lookup: UserLookupResponse = serde_json::from_str(&body)?;

        match lookup.data {
            Some(user) => Ok(user.id),
            None => {
                let reason = lookup
                    .errors
                    .into_iter()
                    .find_map(|p| p.detail.or(p.title))
                    .unwrap_or_else(|| "user not found".to_string());
                Err(FetchError::NotFound(format!("@{}: {}", handle, reason)))
            }
        }
    }

    async fn latest_post(&self, account_id: &str) -> Result<Option<Post>, FetchError> {
        let query = [("max_results", self.max_results.to_string())];
        let posts = self.fetch_timeline(account_id, &query).await?;
        // Newest first upstream
        Ok(posts.into_iter().next())
    }

    async fn fetch_since(&self, account_id: &str, cursor: &Cursor) -> FetchResult {
        let mut query = vec![
            ("max_results", self.max_results.to_string()),
            ("tweet.fields", TWEET_FIELDS.to_string()),
            ("expansions", "author_id".to_string()),
            ("start_time", cursor.start_time_param()),
        ];
        if let Some(since_id) = &cursor.last_seen_id {
            query.push(("since_id", since_id.clone()));
        }

        match self.fetch_timeline(account_id, &query).await {
            Ok(mut posts) => {
                posts.reverse();
                FetchResult::Items(posts)
            }
            Err(e) => classify(e),
        }
    }
}
