use http::Method;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;
use url::Url;

use crate::Result;

/// A single outbound API call.
///
/// The body is kept as a JSON [`Value`] so that a request can be sent again
/// unchanged when the remote asks us to retry.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method, e.g. `GET` or `POST`
    pub method: Method,
    /// Absolute request target below the API base
    pub url: Url,
    /// Optional JSON body
    pub body: Option<Value>,
}

impl ApiRequest {
    /// Create a new request without a body
    #[inline]
    #[must_use]
    pub const fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            body: None,
        }
    }

    /// A `GET` request
    #[must_use]
    pub const fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// A `DELETE` request
    #[must_use]
    pub const fn delete(url: Url) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// A `POST` request carrying `body` as JSON
    ///
    /// # Errors
    ///
    /// Returns an error if `body` cannot be represented as JSON.
    pub fn post_json<B: Serialize + ?Sized>(url: Url, body: &B) -> Result<Self> {
        Self::new(Method::POST, url).with_json(body)
    }

    /// A `PATCH` request carrying `body` as JSON
    ///
    /// # Errors
    ///
    /// Returns an error if `body` cannot be represented as JSON.
    pub fn patch_json<B: Serialize + ?Sized>(url: Url, body: &B) -> Result<Self> {
        Self::new(Method::PATCH, url).with_json(body)
    }

    /// Attach a JSON body to the request
    ///
    /// # Errors
    ///
    /// Returns an error if `body` cannot be represented as JSON.
    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }
}

impl Display for ApiRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}
