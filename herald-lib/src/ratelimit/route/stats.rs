use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use http::StatusCode;
use serde::Serialize;
use serde::ser::SerializeStruct;

use super::RouteKey;

/// Number of most recent request latencies kept per route
const LATENCY_SAMPLES: usize = 128;

/// A [`HashMap`] mapping routes to their [`RouteStats`]
#[derive(Debug, Default, Serialize)]
pub struct RouteStatsMap(HashMap<RouteKey, RouteStats>);

impl RouteStatsMap {
    /// Sort route statistics by request count (descending order)
    #[must_use]
    pub fn sorted(&self) -> Vec<(RouteKey, RouteStats)> {
        let mut sorted: Vec<_> = self.0.clone().into_iter().collect();
        sorted.sort_by(|(a_key, a), (b_key, b)| {
            b.total_requests
                .cmp(&a.total_requests)
                .then_with(|| a_key.cmp(b_key))
        });
        sorted
    }

    /// Statistics for a single route, if it has been used
    #[must_use]
    pub fn get(&self, route: &RouteKey) -> Option<&RouteStats> {
        self.0.get(route)
    }

    /// Number of routes with statistics
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no route has been used yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<HashMap<RouteKey, RouteStats>> for RouteStatsMap {
    fn from(value: HashMap<RouteKey, RouteStats>) -> Self {
        Self(value)
    }
}

/// Record and report statistics for a single route
#[derive(Debug, Clone, Default)]
pub struct RouteStats {
    /// Total number of responses received on this route, retries included
    pub total_requests: u64,
    /// Number of successful responses (2xx status)
    pub successful_requests: u64,
    /// Number of throttled responses (429)
    pub throttled: u64,
    /// Number of client error responses (4xx, excluding 429)
    pub client_errors: u64,
    /// Number of server error responses (5xx)
    pub server_errors: u64,
    /// Number of sends that failed below HTTP (connection errors, timeouts)
    pub transport_failures: u64,
    /// Number of times a send waited for an exhausted budget to reset
    pub budget_waits: u64,
    /// Total time spent waiting for exhausted budgets
    pub budget_wait_time: Duration,
    /// Total time spent waiting out throttled responses
    pub throttle_wait_time: Duration,
    /// Timestamp of the last throttled response
    pub last_throttled: Option<Instant>,
    /// Status code counts
    pub status_codes: HashMap<u16, u64>,
    /// Most recent request latencies
    latencies: VecDeque<Duration>,
}

impl RouteStats {
    /// Record a response with status code and request duration
    pub fn record_response(&mut self, status: StatusCode, request_time: Duration) {
        self.total_requests += 1;
        *self.status_codes.entry(status.as_u16()).or_insert(0) += 1;

        if status.is_success() {
            self.successful_requests += 1;
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            self.throttled += 1;
            self.last_throttled = Some(Instant::now());
        } else if status.is_client_error() {
            self.client_errors += 1;
        } else if status.is_server_error() {
            self.server_errors += 1;
        }

        if self.latencies.len() >= LATENCY_SAMPLES {
            self.latencies.pop_front();
        }
        self.latencies.push_back(request_time);
    }

    /// Record a send that never produced a response
    pub const fn record_transport_failure(&mut self) {
        self.total_requests += 1;
        self.transport_failures += 1;
    }

    /// Record a wait for an exhausted budget
    pub fn record_budget_wait(&mut self, waited: Duration) {
        self.budget_waits += 1;
        self.budget_wait_time += waited;
    }

    /// Record a wait after a throttled response
    pub fn record_throttle_wait(&mut self, waited: Duration) {
        self.throttle_wait_time += waited;
    }

    /// Get median request time over the most recent requests
    #[must_use]
    pub fn median_request_time(&self) -> Option<Duration> {
        if self.latencies.is_empty() {
            return None;
        }

        let mut times: Vec<_> = self.latencies.iter().copied().collect();
        times.sort();
        let mid = times.len() / 2;

        if times.len().is_multiple_of(2) {
            Some((times[mid - 1] + times[mid]) / 2)
        } else {
            Some(times[mid])
        }
    }

    /// Get average request time over the most recent requests
    #[must_use]
    pub fn average_request_time(&self) -> Option<Duration> {
        if self.latencies.is_empty() {
            return None;
        }

        let total: Duration = self.latencies.iter().sum();
        #[allow(clippy::cast_possible_truncation)]
        Some(total / (self.latencies.len() as u32))
    }

    /// Get the current success rate (0.0 to 1.0)
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            1.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let success_rate = self.successful_requests as f64 / self.total_requests as f64;
            success_rate
        }
    }

    /// Share of responses that were throttled (0.0 to 1.0)
    #[must_use]
    pub fn throttle_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let rate = self.throttled as f64 / self.total_requests as f64;
        rate
    }

    /// Get human-readable summary of the stats
    #[must_use]
    pub fn summary(&self) -> String {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let success_pct = (self.success_rate() * 100.0) as u64;

        let avg_time = self
            .average_request_time()
            .map_or_else(|| "N/A".to_string(), |d| format!("{}ms", d.as_millis()));

        format!(
            "{} requests ({}% success, {} throttled), avg: {}, waited: {}ms",
            self.total_requests,
            success_pct,
            self.throttled,
            avg_time,
            (self.budget_wait_time + self.throttle_wait_time).as_millis()
        )
    }
}

impl Serialize for RouteStats {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let median_request_time_ms = self.median_request_time().map(|d| d.as_millis());

        let mut s = serializer.serialize_struct("RouteStats", 11)?;
        s.serialize_field("total_requests", &self.total_requests)?;
        s.serialize_field("successful_requests", &self.successful_requests)?;
        s.serialize_field("success_rate", &self.success_rate())?;
        s.serialize_field("throttled", &self.throttled)?;
        s.serialize_field("client_errors", &self.client_errors)?;
        s.serialize_field("server_errors", &self.server_errors)?;
        s.serialize_field("transport_failures", &self.transport_failures)?;
        s.serialize_field("budget_waits", &self.budget_waits)?;
        s.serialize_field(
            "wait_time_ms",
            &(self.budget_wait_time + self.throttle_wait_time).as_millis(),
        )?;
        s.serialize_field("median_request_time_ms", &median_request_time_ms)?;
        s.serialize_field("status_codes", &self.status_codes)?;
        s.end()
    }
}
