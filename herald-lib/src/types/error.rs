use http::StatusCode;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::ratelimit::RouteKey;

/// Possible errors when sending requests through `herald_lib`
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The remote answered with a non-success status other than 429.
    /// Carries the machine-readable `code` and `message` from the error body
    /// if the remote sent one.
    #[error("Remote API error ({status}): {}", remote_details(.code.as_ref(), .message))]
    Remote {
        /// HTTP status of the response
        status: StatusCode,
        /// Machine-readable error code, if the body contained one
        code: Option<ErrorCode>,
        /// Human-readable error message (or the raw body)
        message: String,
    },

    /// Connection-level failure reported by `reqwest`
    #[error("Network error while trying to reach the remote API")]
    NetworkRequest(#[source] reqwest::Error),

    /// The transport gave up waiting for a response
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// A response body did not have the expected shape
    #[error("Cannot deserialize response body: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The remote kept throttling the route past the configured retry cap
    #[error("Route `{route}` is still throttled after {attempts} attempts")]
    ThrottleRetriesExhausted {
        /// The throttled route
        route: RouteKey,
        /// Number of attempts made (including the first one)
        attempts: u32,
    },

    /// The request target does not live under the configured API base.
    /// This is a caller bug, not a runtime condition.
    #[error("URL `{url}` is not below the API base `{base}`")]
    RouteOutsideBase {
        /// The offending request target
        url: Url,
        /// The configured API base
        base: Url,
    },

    /// The request target is the API base itself, so there is no route segment
    #[error("URL `{0}` does not name a route below the API base")]
    EmptyRoute(Url),

    /// The configured base URL cannot have paths joined onto it
    #[error("Invalid API base URL `{0}`")]
    InvalidBaseUrl(Url),

    /// A relative API path could not be joined onto the base URL
    #[error("Cannot build request URL from `{0}`: {1}")]
    UrlJoin(String, #[source] url::ParseError),

    /// The given header could not be parsed.
    #[error("Header could not be parsed.")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),

    /// The underlying `reqwest` client could not be built
    #[error("Error creating request client: {0}")]
    BuildRequestClient(#[source] reqwest::Error),

    /// No API token was configured
    #[error("No API token configured. Use `--token` or the `HERALD_TOKEN` env var.")]
    MissingToken,

    /// The task driving a submitted request panicked
    #[error("Request task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

impl ErrorKind {
    /// Whether sending the same request again later might succeed.
    ///
    /// Only a hint for higher-level callers; the dispatcher itself never
    /// retries anything but throttled responses.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::NetworkRequest(_) | Self::ThrottleRetriesExhausted { .. } => {
                true
            }
            Self::Remote { status, .. } => status.is_server_error(),
            _ => false,
        }
    }

    /// The remote error code, if this is a [`ErrorKind::Remote`] error
    #[must_use]
    pub const fn remote_code(&self) -> Option<&ErrorCode> {
        match self {
            Self::Remote { code, .. } => code.as_ref(),
            _ => None,
        }
    }
}

fn remote_details(code: Option<&ErrorCode>, message: &str) -> String {
    match code {
        Some(code) => format!("{code}, {message}"),
        None => message.to_string(),
    }
}

/// Error code sent by the remote.
///
/// Some APIs send numbers, some send strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    /// A numeric code, e.g. `50001`
    Number(i64),
    /// A textual code, e.g. `"MISSING_ACCESS"`
    Text(String),
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl PartialEq<i64> for ErrorCode {
    fn eq(&self, other: &i64) -> bool {
        matches!(self, Self::Number(n) if n == other)
    }
}
