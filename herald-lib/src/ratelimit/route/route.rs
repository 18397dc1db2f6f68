use http::HeaderMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::key::RouteKey;
use super::stats::RouteStats;
use crate::ratelimit::{RateLimitHeaders, RateLimitState, SequencedQueue};

/// Everything herald keeps about one route of the remote API.
///
/// Each route has:
/// - A [`SequencedQueue`] serializing its requests
/// - The [`RateLimitState`] last reported by the remote
/// - Statistics for reporting
///
/// Routes never share locks with each other, so a busy or throttled route
/// cannot hold up any other route.
#[derive(Debug)]
pub struct Route {
    /// The route this entry manages
    pub key: RouteKey,

    /// Admission order of the route's requests
    queue: SequencedQueue,

    /// Remaining budget and reset time, as last reported by the remote
    limits: Mutex<RateLimitState>,

    /// Request statistics
    stats: Mutex<RouteStats>,
}

impl Route {
    /// Create the entry for a route that has not been used before
    #[must_use]
    pub fn new(key: RouteKey) -> Self {
        Self {
            key,
            queue: SequencedQueue::new(),
            limits: Mutex::new(RateLimitState::default()),
            stats: Mutex::new(RouteStats::default()),
        }
    }

    /// The route's admission queue
    #[must_use]
    pub const fn queue(&self) -> &SequencedQueue {
        &self.queue
    }

    /// Snapshot of the current rate limit state
    #[must_use]
    pub fn rate_limit(&self) -> RateLimitState {
        *lock(&self.limits)
    }

    /// Refresh the rate limit state from a response on this route
    pub(crate) fn update_rate_limit(&self, headers: &HeaderMap, names: &RateLimitHeaders) {
        let mut limits = lock(&self.limits);
        limits.update_from_headers(headers, names);
        log::trace!(
            "Route {} budget: remaining={:?}, reset_after={}ms",
            self.key,
            limits.remaining,
            limits.reset_after.as_millis()
        );
    }

    /// Update statistics in place
    pub(crate) fn record(&self, f: impl FnOnce(&mut RouteStats)) {
        f(&mut *lock(&self.stats));
    }

    /// Get route statistics
    #[must_use]
    pub fn stats(&self) -> RouteStats {
        lock(&self.stats).clone()
    }
}

/// Lock a mutex, recovering the data if a previous holder panicked.
/// Both guarded values stay consistent after every single update.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
