//! `herald` sends requests to a rate-limited HTTP API, such as Discord's,
//! while keeping the requests of each route in the order they were submitted.
//!
//! ```no_run
//! use herald_lib::{ApiRequest, Config, Dispatcher, Result};
//! use serde_json::{Value, json};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!   let dispatcher = Dispatcher::from_config(Config::builder().token("my-token").build())?;
//!
//!   // Both messages are queued right away and delivered in this order,
//!   // waiting out rate limits as needed.
//!   let first = dispatcher.submit::<Value>(ApiRequest::post_json(
//!       dispatcher.url("channels/1234/messages")?,
//!       &json!({ "content": "first" }),
//!   )?)?;
//!   let second = dispatcher.submit::<Value>(ApiRequest::post_json(
//!       dispatcher.url("channels/1234/messages")?,
//!       &json!({ "content": "second" }),
//!   )?)?;
//!
//!   println!("{}", first.await?["id"]);
//!   println!("{}", second.await?["id"]);
//!   Ok(())
//! }
//! ```
//!
//! Requests on different routes (the first path segment below the API base,
//! e.g. `channels` or `guilds`) never wait for each other.
#![warn(clippy::all, clippy::pedantic)]
#![warn(
    absolute_paths_not_starting_with_crate,
    rustdoc::invalid_html_tags,
    missing_debug_implementations,
    semicolon_in_expressions_from_macros,
    unreachable_pub,
    unused_extern_crates,
    clippy::missing_const_for_fn
)]
#![deny(anonymous_parameters, macro_use_extern_crate)]
#![warn(missing_docs)]

mod config;
mod dispatcher;
mod transport;
mod types;

pub mod ratelimit;

pub use config::{
    Config, DEFAULT_AUTH_SCHEME, DEFAULT_BASE_URL, DEFAULT_THROTTLE_MARGIN, DEFAULT_TIMEOUT,
    DEFAULT_USER_AGENT,
};
pub use dispatcher::{Dispatcher, PendingRequest, RequestId};
pub use ratelimit::{RouteKey, RouteStats, RouteStatsMap};
pub use transport::{ReqwestTransport, Transport};
pub use types::*;
