use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::ErrorKind;
use crate::types::Result;

/// Name of a logical endpoint family of the remote API.
///
/// Requests with equal keys are sent strictly one after another, in the
/// order they were submitted. Requests with different keys don't affect
/// each other at all.
///
/// The key is the first path segment below the API base:
///
/// ```
/// use herald_lib::ratelimit::RouteKey;
/// use url::Url;
///
/// let base = Url::parse("https://discord.com/api/v9/").unwrap();
/// let url = Url::parse("https://discord.com/api/v9/channels/123/messages").unwrap();
/// let key = RouteKey::resolve(&url, &base).unwrap();
/// assert_eq!(key.as_str(), "channels");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteKey(String);

impl RouteKey {
    /// Derive the route key of `url` relative to the API `base`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::RouteOutsideBase`] if `url` is not below `base`
    /// and [`ErrorKind::EmptyRoute`] if `url` is the base itself.
    /// Both mean the caller built a wrong URL; retrying will not help.
    pub fn resolve(url: &Url, base: &Url) -> Result<Self> {
        let base_str = base.as_str().trim_end_matches('/');

        let rest = url
            .as_str()
            .strip_prefix(base_str)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| ErrorKind::RouteOutsideBase {
                url: url.clone(),
                base: base.clone(),
            })?;

        let segment = rest
            .split(['/', '?', '#'])
            .next()
            .unwrap_or_default();

        if segment.is_empty() {
            return Err(ErrorKind::EmptyRoute(url.clone()));
        }

        Ok(RouteKey(segment.to_string()))
    }

    /// Get the route as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the route as an owned String
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RouteKey {
    fn from(route: String) -> Self {
        RouteKey(route)
    }
}

impl From<&str> for RouteKey {
    fn from(route: &str) -> Self {
        RouteKey(route.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const BASE: &str = "https://discord.com/api/v9/";

    fn resolve(url: &str) -> Result<RouteKey> {
        RouteKey::resolve(&Url::parse(url).unwrap(), &Url::parse(BASE).unwrap())
    }

    #[rstest]
    #[case("https://discord.com/api/v9/channels/123/messages", "channels")]
    #[case("https://discord.com/api/v9/users/@me/guilds", "users")]
    #[case("https://discord.com/api/v9/guilds/42/channels", "guilds")]
    #[case("https://discord.com/api/v9/gateway", "gateway")]
    #[case("https://discord.com/api/v9/gateway?v=9", "gateway")]
    #[case("https://discord.com/api/v9/applications#frag", "applications")]
    fn test_route_resolution(#[case] url: &str, #[case] expected: &str) {
        assert_eq!(resolve(url).unwrap().as_str(), expected);
    }

    #[test]
    fn test_same_route_for_different_resources() {
        let a = resolve("https://discord.com/api/v9/channels/1/messages").unwrap();
        let b = resolve("https://discord.com/api/v9/channels/2").unwrap();
        assert_eq!(a, b);
    }

    #[rstest]
    #[case("https://example.com/api/v9/channels/1")]
    #[case("https://discord.com/api/v8/channels/1")]
    #[case("https://discord.com/api/v90/channels/1")]
    fn test_url_outside_base(#[case] url: &str) {
        assert!(matches!(
            resolve(url),
            Err(ErrorKind::RouteOutsideBase { .. })
        ));
    }

    #[test]
    fn test_base_itself_has_no_route() {
        assert!(matches!(
            resolve("https://discord.com/api/v9/"),
            Err(ErrorKind::EmptyRoute(_))
        ));
        assert!(matches!(
            resolve("https://discord.com/api/v9//channels"),
            Err(ErrorKind::EmptyRoute(_))
        ));
    }

    #[test]
    fn test_base_without_trailing_slash() {
        let base = Url::parse("https://discord.com/api/v9").unwrap();
        let url = Url::parse("https://discord.com/api/v9/channels/1").unwrap();
        assert_eq!(RouteKey::resolve(&url, &base).unwrap().as_str(), "channels");
    }

    #[test]
    fn test_route_key_display() {
        let key = RouteKey::from("channels");
        assert_eq!(format!("{key}"), "channels");
        assert_eq!(key.into_string(), "channels");
    }
}
