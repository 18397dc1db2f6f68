use http::{HeaderMap, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::{ErrorCode, ErrorKind, Result};

/// A fully read HTTP response.
///
/// The body is read eagerly so that the dispatcher can inspect it for
/// throttling or error details before deciding what to hand to the caller.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Response status
    pub status: StatusCode,
    /// Response headers, including the rate-limit headers
    pub headers: HeaderMap,
    /// Response body as text
    pub body: String,
}

impl RawResponse {
    /// Create a response from its parts
    #[must_use]
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<String>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Read the whole body of a `reqwest` response
    pub(crate) async fn from_response(
        response: reqwest::Response,
    ) -> std::result::Result<Self, reqwest::Error> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        Ok(Self {
            status,
            headers,
            body,
        })
    }

    /// Whether the remote throttled this request
    #[must_use]
    pub fn is_throttled(&self) -> bool {
        self.status == StatusCode::TOO_MANY_REQUESTS
    }

    /// Deserialize the body into `T`.
    ///
    /// An empty body (e.g. `204 No Content`) is treated as JSON `null`,
    /// so `T = ()` or `Option<_>` can be used for endpoints without content.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Serialization`] if the body has a different shape.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let body = if self.body.trim().is_empty() {
            "null"
        } else {
            self.body.as_str()
        };
        Ok(serde_json::from_str(body)?)
    }

    /// Parse the throttling details the remote sent along with a 429
    #[must_use]
    pub fn throttle_notice(&self) -> Option<ThrottleNotice> {
        serde_json::from_str(&self.body).ok()
    }

    /// Turn a non-success response into [`ErrorKind::Remote`].
    ///
    /// Falls back to the raw body as message if it is not a structured error.
    #[must_use]
    pub fn into_remote_error(self) -> ErrorKind {
        match serde_json::from_str::<ErrorBody>(&self.body) {
            Ok(ErrorBody { code, message }) if code.is_some() || message.is_some() => {
                ErrorKind::Remote {
                    status: self.status,
                    code,
                    message: message.unwrap_or_default(),
                }
            }
            _ => ErrorKind::Remote {
                status: self.status,
                code: None,
                message: self.body,
            },
        }
    }
}

/// Body of a throttled (429) response
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ThrottleNotice {
    /// Seconds to wait before trying again
    pub retry_after: f64,
    /// Whether the whole API (not only this route) is throttled
    #[serde(default)]
    pub global: bool,
    /// Optional explanation
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of any other non-success response
#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<ErrorCode>,
    message: Option<String>,
}
