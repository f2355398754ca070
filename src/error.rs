//! Error types shared across the relay.

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to the post source.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, TLS, timeout, connection reset).
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status.
    #[error("upstream returned {status}")]
    Status {
        status: StatusCode,
        headers: HeaderMap,
        body: String,
    },

    /// Body could not be decoded into the expected shape.
    #[error("failed to decode upstream response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Lookup succeeded but the requested object does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

impl FetchError {
    /// Upstream status, if the error came from an HTTP response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Http(e) => e.status(),
            _ => None,
        }
    }

    /// Flatten everything useful for a post-mortem into one string:
    /// the message, the source chain and, for HTTP failures, headers and body.
    pub fn diagnostics(&self) -> String {
        let mut out = self.to_string();

        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            out.push_str(&format!("\n  caused by: {}", cause));
            source = cause.source();
        }

        if let FetchError::Status { headers, body, .. } = self {
            let rendered: Vec<String> = headers
                .iter()
                .map(|(k, v)| format!("{}: {}", k, v.to_str().unwrap_or("<binary>")))
                .collect();
            out.push_str(&format!("\n  headers: {{{}}}", rendered.join(", ")));
            out.push_str(&format!("\n  body: {}", body));
        }

        out
    }
}

/// Failures delivering a message to the chat destination.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("chat API rejected message ({status}): {description}")]
    Api {
        status: StatusCode,
        description: String,
    },

    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
}

/// Failures loading configuration at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Errors that end the run.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("could not resolve account @{handle}: {source}")]
    AccountResolution {
        handle: String,
        #[source]
        source: FetchError,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_diagnostics_include_headers_and_body() {
        let mut headers = HeaderMap::new();
        headers.insert("x-rate-limit-remaining", HeaderValue::from_static("0"));
        let err = FetchError::Status {
            status: StatusCode::SERVICE_UNAVAILABLE,
            headers,
            body: r#"{"title":"Service Unavailable"}"#.to_string(),
        };

        let text = err.diagnostics();
        assert!(text.starts_with("upstream returned 503 Service Unavailable"));
        assert!(text.contains("x-rate-limit-remaining: 0"));
        assert!(text.contains(r#"body: {"title":"Service Unavailable"}"#));
        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
    }

    #[tokio::test]
    async fn test_transport_error_reported_once() {
        let inner = reqwest::Client::new()
            .get("not a url")
            .send()
            .await
            .unwrap_err();
        let inner_text = inner.to_string();
        let err = FetchError::from(inner);

        let text = err.diagnostics();
        assert!(text.starts_with("HTTP request failed\n  caused by: "));
        assert_eq!(text.matches(inner_text.as_str()).count(), 1);
    }

    #[test]
    fn test_diagnostics_include_source_chain() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = RelayError::AccountResolution {
            handle: "alice".to_string(),
            source: FetchError::Decode(json_err),
        };
        assert!(err.to_string().starts_with("could not resolve account @alice"));

        let fetch = FetchError::NotFound("user alice".to_string());
        assert_eq!(fetch.diagnostics(), "not found: user alice");
        assert_eq!(fetch.status(), None);
    }
}
