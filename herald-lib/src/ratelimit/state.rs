use http::HeaderMap;
use std::time::Duration;

use super::RateLimitHeaders;
use super::headers::{parse_count, parse_seconds};

/// Budget of a single route as last reported by the remote.
///
/// Starts out unlimited and is refreshed from the headers of every response
/// on that route. Only the request at the head of the route's queue reads or
/// writes it, so there is never more than one user at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RateLimitState {
    /// Requests left in the current window, `None` until the remote told us
    pub remaining: Option<i64>,
    /// Time until the window resets
    pub reset_after: Duration,
}

impl RateLimitState {
    /// Whether the route has no budget left in the current window
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        matches!(self.remaining, Some(remaining) if remaining <= 0)
    }

    /// Refresh the state from response headers.
    ///
    /// A header that is missing or malformed leaves its field untouched,
    /// so one response without headers never resets a route to "unlimited".
    pub fn update_from_headers(&mut self, headers: &HeaderMap, names: &RateLimitHeaders) {
        if let Some(remaining) = parse_count(headers, &names.remaining) {
            self.remaining = Some(remaining);
        }
        if let Some(reset_after) = parse_seconds(headers, &names.reset_after) {
            self.reset_after = reset_after;
        }
    }
}
