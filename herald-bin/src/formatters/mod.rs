pub(crate) mod log;
pub(crate) mod route_stats;
