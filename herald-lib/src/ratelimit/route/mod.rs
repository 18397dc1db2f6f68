#![allow(clippy::module_inception)]

mod key;
mod route;
mod stats;

pub use key::RouteKey;
pub use route::Route;
pub use stats::{RouteStats, RouteStatsMap};
