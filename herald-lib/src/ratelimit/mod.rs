//! Per-route ordering and rate limit tracking.
//!
//! Requests to the same route are sent strictly one after another, in the
//! order they were submitted, and the remaining budget reported by the remote
//! is respected before every send. Different routes never wait on each other.
//!
//! # Architecture
//!
//! - [`RouteKey`]: Identifies a route (first path segment below the API base)
//! - [`SequencedQueue`]: FIFO admission handing out [`AdmissionToken`]s
//! - [`RateLimitState`]: Budget last reported by the remote for a route
//! - [`Route`]: Queue, rate limit state and statistics of one route
//! - [`RoutePool`]: Lazily creates and hands out routes
//! - [`RateLimitHeaders`]: Names of the headers carrying rate limit state
//! - [`RouteStats`]: Statistics tracking for each route

mod config;
pub(crate) mod headers;
mod pool;
mod queue;
mod route;
mod state;

pub use config::RateLimitHeaders;
pub use pool::RoutePool;
pub use queue::{AdmissionToken, SequencedQueue};
pub use route::{Route, RouteKey, RouteStats, RouteStatsMap};
pub use state::RateLimitState;
