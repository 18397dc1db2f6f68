use dashmap::DashMap;
use std::sync::Arc;

use crate::ratelimit::{Route, RouteKey, RouteStats, RouteStatsMap};

/// Registry of all routes seen so far.
///
/// Routes are created lazily the first time a request targets them and live
/// as long as the pool. The number of routes is bounded by the remote API's
/// resource taxonomy, so entries are never evicted.
///
/// Thread-safe using `DashMap`: concurrent first uses of the same route end
/// up with one shared [`Route`].
#[derive(Debug, Clone, Default)]
pub struct RoutePool {
    /// Map of route key to route state, created on-demand
    routes: Arc<DashMap<RouteKey, Arc<Route>>>,
}

impl RoutePool {
    /// Create an empty pool
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an existing route or create a new one for the given key
    #[must_use]
    pub fn get_or_create(&self, key: &RouteKey) -> Arc<Route> {
        if let Some(route) = self.routes.get(key) {
            return Arc::clone(route.value());
        }

        // The entry API holds the shard lock, so racing callers agree on one route
        Arc::clone(
            self.routes
                .entry(key.clone())
                .or_insert_with(|| {
                    log::debug!("Tracking new route `{key}`");
                    Arc::new(Route::new(key.clone()))
                })
                .value(),
        )
    }

    /// Get a route if it has been used before
    #[must_use]
    pub fn get(&self, key: &RouteKey) -> Option<Arc<Route>> {
        self.routes.get(key).map(|route| Arc::clone(route.value()))
    }

    /// Get statistics for a specific route
    ///
    /// Returns empty statistics for routes that have not been used yet.
    #[must_use]
    pub fn route_stats(&self, key: &RouteKey) -> RouteStats {
        self.routes
            .get(key)
            .map(|route| route.stats())
            .unwrap_or_default()
    }

    /// Get statistics for all routes that have been created
    #[must_use]
    pub fn all_route_stats(&self) -> RouteStatsMap {
        self.routes
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().stats()))
            .collect::<std::collections::HashMap<_, _>>()
            .into()
    }

    /// Get the number of routes created so far
    #[must_use]
    pub fn active_route_count(&self) -> usize {
        self.routes.len()
    }
}
