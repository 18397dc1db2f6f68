use serde::{Deserialize, Serialize};

/// Default name of the header holding the requests left in the current window
const DEFAULT_REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Default name of the header holding the seconds until the window resets
const DEFAULT_RESET_AFTER_HEADER: &str = "x-ratelimit-reset-after";

/// Names of the rate limit headers sent by the remote.
///
/// Their meaning is fixed, only the names differ between APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitHeaders {
    /// Integer count of requests remaining in the current window
    #[serde(default = "default_remaining")]
    pub remaining: String,

    /// Seconds (may be fractional) until the window resets
    #[serde(default = "default_reset_after")]
    pub reset_after: String,
}

impl Default for RateLimitHeaders {
    fn default() -> Self {
        Self {
            remaining: default_remaining(),
            reset_after: default_reset_after(),
        }
    }
}

fn default_remaining() -> String {
    DEFAULT_REMAINING_HEADER.to_string()
}

fn default_reset_after() -> String {
    DEFAULT_RESET_AFTER_HEADER.to_string()
}
