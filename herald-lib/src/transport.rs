//! The seam between the dispatcher and the network.
//!
//! [`Transport`] sends exactly one HTTP request and hands back the whole
//! response, without interpreting the status code. Ordering, rate limits and
//! retries all live in the [`Dispatcher`](crate::Dispatcher), which makes it
//! easy to drive the dispatcher with a scripted transport in tests.

use async_trait::async_trait;
use http::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use std::time::Duration;

use crate::{ApiRequest, Config, ErrorKind, RawResponse, Result};

/// Sends a single request to the remote API.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Perform one HTTP call.
    ///
    /// Any response the remote sends back is `Ok`, whatever its status.
    ///
    /// # Errors
    ///
    /// Fails only if no complete response was received, e.g. on connection
    /// errors ([`ErrorKind::NetworkRequest`]) or timeouts
    /// ([`ErrorKind::Timeout`]).
    async fn execute(&self, request: ApiRequest) -> Result<RawResponse>;
}

/// [`Transport`] backed by a [`reqwest::Client`].
///
/// The client identity (`Authorization`, `Accept` and `User-Agent` headers)
/// and the per-call timeout are fixed when the transport is built.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Build the underlying HTTP client from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// - no token is configured ([`ErrorKind::MissingToken`])
    /// - the token or scheme contain characters not allowed in a header
    /// - the `reqwest` client cannot be created
    pub fn new(config: &Config) -> Result<Self> {
        let token = config.token.as_ref().ok_or(ErrorKind::MissingToken)?;

        let mut authorization =
            HeaderValue::from_str(&format!("{} {}", config.auth_scheme, token.expose_secret()))?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::ClientBuilder::new()
            .default_headers(headers)
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(ErrorKind::BuildRequestClient)?;

        Ok(Self {
            client,
            timeout: config.timeout,
        })
    }

    fn classify(&self, error: reqwest::Error) -> ErrorKind {
        if error.is_timeout() {
            ErrorKind::Timeout(self.timeout)
        } else {
            ErrorKind::NetworkRequest(error)
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> Result<RawResponse> {
        let mut builder = self.client.request(request.method, request.url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| self.classify(e))?;
        RawResponse::from_response(response)
            .await
            .map_err(|e| self.classify(e))
    }
}
