//! Ordered, rate-limited delivery of API requests.
//!
//! The [`Dispatcher`] is the entry point of the crate. Every request is
//! assigned to a route, waits for the requests submitted before it on the
//! same route, respects the route's remaining budget and transparently
//! waits out throttling before its result is handed back.
#![allow(clippy::module_name_repetitions)]

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use http::header::RETRY_AFTER;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use url::Url;

use crate::ratelimit::headers::parse_retry_after;
use crate::ratelimit::{AdmissionToken, Route, RouteKey, RoutePool, RouteStats, RouteStatsMap};
use crate::transport::{ReqwestTransport, Transport};
use crate::{ApiRequest, Config, ErrorKind, RawResponse, Result};

/// Wait after a throttled response that says nothing about when to retry
const FALLBACK_THROTTLE_WAIT: Duration = Duration::from_secs(1);

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a submitted request.
///
/// Two submissions with identical content still get different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    fn next() -> Self {
        Self(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw id
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to a submitted request, resolving to its outcome.
///
/// The request is driven by its own task: dropping the handle does not
/// cancel it, and a handle that is never polled does not hold up the route.
pub struct PendingRequest<T> {
    id: RequestId,
    route: RouteKey,
    handle: JoinHandle<Result<T>>,
}

impl<T> PendingRequest<T> {
    /// Identity of the request
    #[must_use]
    pub const fn id(&self) -> RequestId {
        self.id
    }

    /// Route the request was queued on
    #[must_use]
    pub const fn route(&self) -> &RouteKey {
        &self.route
    }
}

impl<T> fmt::Debug for PendingRequest<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequest")
            .field("id", &self.id)
            .field("route", &self.route)
            .field("finished", &self.handle.is_finished())
            .finish()
    }
}

impl<T> Future for PendingRequest<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle)
            .poll(cx)
            .map(|joined| joined.map_err(ErrorKind::from).and_then(|result| result))
    }
}

/// Sends requests to the remote API, one route at a time.
///
/// Requests on the same route are sent in the order [`Dispatcher::submit`]
/// was called, each one only after the previous one has completely finished
/// (including all throttling retries). Requests on different routes never
/// wait for each other.
///
/// Cloning is cheap and every clone shares the same routes.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    config: Config,
    transport: Arc<dyn Transport>,
    routes: RoutePool,
}

impl Dispatcher {
    /// Create a dispatcher sending through `transport`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidBaseUrl`] if the configured base URL
    /// cannot carry paths.
    pub fn new(config: Config, transport: Arc<dyn Transport>) -> Result<Self> {
        let config = config.validate()?;
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                transport,
                routes: RoutePool::new(),
            }),
        })
    }

    /// Create a dispatcher sending through a [`ReqwestTransport`] built
    /// from `config`.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid or the HTTP client cannot be
    /// built, see [`ReqwestTransport::new`].
    pub fn from_config(config: Config) -> Result<Self> {
        let config = config.validate()?;
        let transport = ReqwestTransport::new(&config)?;
        Self::new(config, Arc::new(transport))
    }

    /// The validated configuration
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Queue `request` on its route and start driving it.
    ///
    /// The place in the queue is taken before this returns, so the order of
    /// `submit` calls is the order in which requests on a route are sent.
    ///
    /// # Errors
    ///
    /// Fails without queueing anything if the request URL does not name a
    /// route below the configured base URL.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn submit<T>(&self, request: ApiRequest) -> Result<PendingRequest<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let key = RouteKey::resolve(&request.url, &self.inner.config.base_url)?;
        let route = self.inner.routes.get_or_create(&key);
        let token = route.queue().admit();
        let id = RequestId::next();
        log::debug!(
            "Queued request {id} ({request}) on route `{key}` at position {}",
            token.ticket()
        );

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let response = inner.run(id, &route, token, request).await?;
            response.json()
        });

        Ok(PendingRequest {
            id,
            route: key,
            handle,
        })
    }

    /// Submit `request` and wait for its outcome.
    ///
    /// # Errors
    ///
    /// Fails if the request cannot be queued, the remote answers with an
    /// error, the call fails below HTTP or the body has an unexpected shape.
    pub async fn send<T>(&self, request: ApiRequest) -> Result<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.submit(request)?.await
    }

    /// `GET` a path relative to the base URL.
    ///
    /// The request is queued when the returned future is first polled; use
    /// [`Dispatcher::submit`] to fix the order up front.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::send`].
    pub async fn get<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.send(ApiRequest::get(self.url(path)?)).await
    }

    /// `POST` a JSON body to a path relative to the base URL.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::send`]. Also fails if `body` cannot be serialized.
    pub async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned + Send + 'static,
        B: Serialize + ?Sized,
    {
        self.send(ApiRequest::post_json(self.url(path)?, body)?)
            .await
    }

    /// `DELETE` a path relative to the base URL, ignoring any response body.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::send`].
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send::<serde_json::Value>(ApiRequest::delete(self.url(path)?))
            .await
            .map(|_| ())
    }

    /// Join a path relative to the base URL
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::UrlJoin`] if the result is not a valid URL.
    pub fn url(&self, path: &str) -> Result<Url> {
        self.inner.config.url(path)
    }

    /// Statistics for a single route
    #[must_use]
    pub fn route_stats(&self, route: &RouteKey) -> RouteStats {
        self.inner.routes.route_stats(route)
    }

    /// Statistics for every route used so far
    #[must_use]
    pub fn all_route_stats(&self) -> RouteStatsMap {
        self.inner.routes.all_route_stats()
    }

    /// Number of routes used so far
    #[must_use]
    pub fn active_route_count(&self) -> usize {
        self.inner.routes.active_route_count()
    }
}

impl Inner {
    /// Drive one request from its queue position to a successful response.
    /// The queue position is given up on every path out of here.
    async fn run(
        &self,
        id: RequestId,
        route: &Route,
        token: AdmissionToken,
        request: ApiRequest,
    ) -> Result<RawResponse> {
        route.queue().await_turn(&token).await;
        let result = self.deliver(id, route, &request).await;
        route.queue().release(token);
        result
    }

    async fn deliver(&self, id: RequestId, route: &Route, request: &ApiRequest) -> Result<RawResponse> {
        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            Self::wait_for_budget(id, route).await;
            log::debug!("Sending request {id} ({request}), attempt {attempts}");

            let started = Instant::now();
            let response = match self.transport.execute(request.clone()).await {
                Ok(response) => response,
                Err(e) => {
                    route.record(RouteStats::record_transport_failure);
                    log::error!("Request {id} on route `{}` failed: {e}", route.key);
                    return Err(e);
                }
            };
            route.record(|stats| stats.record_response(response.status, started.elapsed()));
            route.update_rate_limit(&response.headers, &self.config.rate_limit_headers);

            if response.is_throttled() {
                if self
                    .config
                    .max_throttle_retries
                    .is_some_and(|max| attempts > max)
                {
                    log::error!(
                        "Giving up on request {id}, route `{}` still throttled after {attempts} attempts",
                        route.key
                    );
                    return Err(ErrorKind::ThrottleRetriesExhausted {
                        route: route.key.clone(),
                        attempts,
                    });
                }

                let wait = self.throttle_wait(route, &response);
                sleep(wait).await;
                route.record(|stats| stats.record_throttle_wait(wait));
                continue;
            }

            if response.status.is_success() {
                return Ok(response);
            }

            let error = response.into_remote_error();
            log::error!("Request {id} on route `{}` failed: {error}", route.key);
            return Err(error);
        }
    }

    /// Every attempt, retries included, waits out an exhausted budget first
    async fn wait_for_budget(id: RequestId, route: &Route) {
        let limits = route.rate_limit();
        if limits.is_exhausted() {
            log::warn!(
                "Rate limit of route `{}` exhausted, waiting {:?} before sending request {id}",
                route.key,
                limits.reset_after
            );
            sleep(limits.reset_after).await;
            route.record(|stats| stats.record_budget_wait(limits.reset_after));
        }
    }

    /// How long to wait before retrying a throttled request
    fn throttle_wait(&self, route: &Route, response: &RawResponse) -> Duration {
        let requested = match response.throttle_notice() {
            Some(notice) => {
                log::warn!(
                    "Throttled on route `{}` (global: {}), retrying after {}s{}",
                    route.key,
                    notice.global,
                    notice.retry_after,
                    notice
                        .message
                        .as_deref()
                        .map(|m| format!(": {m}"))
                        .unwrap_or_default()
                );
                Duration::try_from_secs_f64(notice.retry_after).ok()
            }
            None => {
                log::warn!("Throttled on route `{}` without details", route.key);
                None
            }
        };

        let wait = requested
            .or_else(|| {
                response
                    .headers
                    .get(RETRY_AFTER)
                    .and_then(|value| parse_retry_after(value).ok())
            })
            .or_else(|| Some(route.rate_limit().reset_after).filter(|d| !d.is_zero()))
            .unwrap_or(FALLBACK_THROTTLE_WAIT);

        wait + self.config.throttle_margin
    }
}
