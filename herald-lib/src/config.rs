//! Settings for a [`Dispatcher`](crate::Dispatcher) and its transport.
#![allow(clippy::module_name_repetitions)]

use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;
use typed_builder::TypedBuilder;
use url::Url;

use crate::ratelimit::RateLimitHeaders;
use crate::{ErrorKind, Result};

/// Default API base, Discord's v9 REST API.
pub const DEFAULT_BASE_URL: &str = "https://discord.com/api/v9/";
/// Default scheme of the `Authorization` header, `Bot`.
pub const DEFAULT_AUTH_SCHEME: &str = "Bot";
/// Default user agent, `herald/<PKG_VERSION>`.
pub const DEFAULT_USER_AGENT: &str = concat!("herald/", env!("CARGO_PKG_VERSION"));
/// Default timeout of a single HTTP call, 20 seconds.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);
/// Default time added on top of the remote's `retry_after`, 100 milliseconds.
pub const DEFAULT_THROTTLE_MARGIN: Duration = Duration::from_millis(100);

/// Everything needed to talk to one remote API.
///
/// Construct it with [`Config::builder`] or deserialize it, e.g. from TOML.
/// Every field has a default, so only the token usually needs to be set.
///
/// ```
/// use herald_lib::Config;
/// use std::time::Duration;
///
/// let config = Config::builder()
///     .token("my-token")
///     .timeout(Duration::from_secs(5))
///     .build();
/// assert_eq!(config.auth_scheme, "Bot");
/// ```
#[derive(TypedBuilder, Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[builder(builder_method(doc = "
Create a builder for a `Config`.

Call methods with the same name as the fields to set them, then `.build()`.
"))]
pub struct Config {
    /// Root URL of the remote API. Routes are derived from the path below it.
    #[builder(default_code = "default_base_url()")]
    pub base_url: Url,

    /// Secret sent in the `Authorization` header
    #[builder(default, setter(strip_option, into))]
    pub token: Option<SecretString>,

    /// Scheme preceding the token in the `Authorization` header
    #[builder(default_code = "String::from(DEFAULT_AUTH_SCHEME)", setter(into))]
    pub auth_scheme: String,

    /// Value of the `User-Agent` header
    #[builder(default_code = "String::from(DEFAULT_USER_AGENT)", setter(into))]
    pub user_agent: String,

    /// Timeout of a single HTTP call. Requests that time out are not retried.
    #[serde(with = "humantime_serde")]
    #[builder(default = DEFAULT_TIMEOUT)]
    pub timeout: Duration,

    /// Safety margin added to the wait the remote asks for after throttling
    #[serde(with = "humantime_serde")]
    #[builder(default = DEFAULT_THROTTLE_MARGIN)]
    pub throttle_margin: Duration,

    /// Give up after this many retries of a throttled request.
    ///
    /// By default a throttled request is retried until the remote accepts it.
    #[builder(default, setter(strip_option))]
    pub max_throttle_retries: Option<u32>,

    /// Names of the headers carrying the rate limit state
    #[builder(default)]
    pub rate_limit_headers: RateLimitHeaders,
}

impl Default for Config {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Config {
    /// Check the configuration and normalize the base URL so that it ends
    /// with a `/`, which makes joining relative paths onto it predictable.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidBaseUrl`] if the base URL cannot carry a
    /// path, e.g. `mailto:` or `data:` URLs.
    pub fn validate(mut self) -> Result<Self> {
        if self.base_url.cannot_be_a_base() {
            return Err(ErrorKind::InvalidBaseUrl(self.base_url));
        }
        if !self.base_url.path().ends_with('/') {
            let path = format!("{}/", self.base_url.path());
            self.base_url.set_path(&path);
        }
        Ok(self)
    }

    /// Join a path relative to the API base
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::UrlJoin`] if the result is not a valid URL.
    pub fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ErrorKind::UrlJoin(path.to_string(), e))
    }
}

#[allow(clippy::unwrap_used)]
fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.base_url.as_str(), DEFAULT_BASE_URL);
        assert!(config.token.is_none());
        assert_eq!(config.auth_scheme, "Bot");
        assert!(config.user_agent.starts_with("herald/"));
        assert_eq!(config.timeout, Duration::from_secs(20));
        assert_eq!(config.throttle_margin, Duration::from_millis(100));
        assert_eq!(config.max_throttle_retries, None);
        assert_eq!(config.rate_limit_headers, RateLimitHeaders::default());
    }

    #[test]
    fn test_from_toml() {
        let config: Config = toml::from_str(
            r#"
            base_url = "https://chat.example.com/api"
            token = "secret"
            timeout = "5s"
            throttle_margin = "250ms"
            max_throttle_retries = 3

            [rate_limit_headers]
            remaining = "ratelimit-remaining"
            "#,
        )
        .unwrap();

        assert_eq!(config.token.unwrap().expose_secret(), "secret");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.throttle_margin, Duration::from_millis(250));
        assert_eq!(config.max_throttle_retries, Some(3));
        assert_eq!(config.rate_limit_headers.remaining, "ratelimit-remaining");
        assert_eq!(
            config.rate_limit_headers.reset_after,
            "x-ratelimit-reset-after"
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str(r#"retries = 3"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_appends_slash() {
        let config = Config::builder()
            .base_url(Url::parse("https://chat.example.com/api/v9").unwrap())
            .build()
            .validate()
            .unwrap();
        assert_eq!(config.base_url.as_str(), "https://chat.example.com/api/v9/");
        assert_eq!(
            config.url("/channels/1/messages").unwrap().as_str(),
            "https://chat.example.com/api/v9/channels/1/messages"
        );
    }

    #[test]
    fn test_validate_rejects_opaque_base() {
        let config = Config::builder()
            .base_url(Url::parse("mailto:bot@example.com").unwrap())
            .build();
        assert!(matches!(
            config.validate(),
            Err(ErrorKind::InvalidBaseUrl(_))
        ));
    }
}
