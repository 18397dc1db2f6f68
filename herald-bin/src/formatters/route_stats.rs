use herald_lib::RouteStatsMap;
use std::fmt::{self, Display};

/// Per-route statistics as a table, busiest route first
pub(crate) struct RouteStatsTable<'a>(pub(crate) &'a RouteStatsMap);

impl Display for RouteStatsTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }

        writeln!(f, "Per-route statistics")?;
        writeln!(f, "{}", "─".repeat(72))?;

        let routes = self.0.sorted();
        let width = routes
            .iter()
            .map(|(route, _)| route.as_str().len())
            .max()
            .unwrap_or(0)
            .max(8);

        for (route, stats) in routes {
            let median = stats
                .median_request_time()
                .map_or_else(|| "N/A".to_string(), |d| format!("{}ms", d.as_millis()));
            let waited = (stats.budget_wait_time + stats.throttle_wait_time).as_millis();

            writeln!(
                f,
                "{:<width$} │ {:>5} reqs │ {:>5.1}% success │ {:>4} throttled │ {:>7} median │ {:>6}ms waited",
                route.as_str(),
                stats.total_requests,
                stats.success_rate() * 100.0,
                stats.throttled,
                median,
                waited,
            )?;
        }

        Ok(())
    }
}
