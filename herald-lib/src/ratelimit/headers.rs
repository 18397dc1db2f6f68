//! Handle rate limiting headers.

use http::{HeaderMap, HeaderValue};
use std::time::{Duration, SystemTime};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum RetryAfterParseError {
    #[error("Unable to parse value '{0}'")]
    ValueError(String),

    #[error("Header value contains invalid chars")]
    HeaderValueError,
}

/// Parse the "Retry-After" header as specified per
/// [RFC 7231 section 7.1.3](https://www.rfc-editor.org/rfc/rfc7231#section-7.1.3)
pub(crate) fn parse_retry_after(value: &HeaderValue) -> Result<Duration, RetryAfterParseError> {
    let value = value
        .to_str()
        .map_err(|_| RetryAfterParseError::HeaderValueError)?;

    // RFC 7231: Retry-After = HTTP-date / delay-seconds
    value.parse::<u64>().map(Duration::from_secs).or_else(|_| {
        httpdate::parse_http_date(value)
            .map(|s| {
                s.duration_since(SystemTime::now())
                    // if date is in the past, we can use ZERO
                    .unwrap_or(Duration::ZERO)
            })
            .map_err(|_| RetryAfterParseError::ValueError(value.into()))
    })
}

/// Parse an integer header such as `X-RateLimit-Remaining`
pub(crate) fn parse_count(headers: &HeaderMap, name: &str) -> Option<i64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

/// Parse a header holding a (possibly fractional) number of seconds,
/// such as `X-RateLimit-Reset-After: 1.337`
pub(crate) fn parse_seconds(headers: &HeaderMap, name: &str) -> Option<Duration> {
    let secs: f64 = headers.get(name)?.to_str().ok()?.trim().parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use http::{HeaderMap, HeaderValue};
    use rstest::rstest;

    use crate::ratelimit::headers::{
        RetryAfterParseError, parse_count, parse_retry_after, parse_seconds,
    };

    #[test]
    fn test_retry_after() {
        assert_eq!(parse_retry_after(&value("1")), Ok(Duration::from_secs(1)));
        assert_eq!(
            parse_retry_after(&value("-1")),
            Err(RetryAfterParseError::ValueError("-1".into()))
        );

        assert_eq!(
            parse_retry_after(&value("Fri, 15 May 2015 15:34:21 GMT")),
            Ok(Duration::ZERO)
        );

        let result = parse_retry_after(&value("Fri, 15 May 4099 15:34:21 GMT"));
        let is_in_future = matches!(result, Ok(d) if d.as_secs() > 0);
        assert!(is_in_future);
    }

    #[rstest]
    #[case("5", Some(5))]
    #[case("0", Some(0))]
    #[case(" 3 ", Some(3))]
    #[case("-1", Some(-1))]
    #[case("1.5", None)]
    #[case("many", None)]
    fn test_parse_count(#[case] raw: &str, #[case] expected: Option<i64>) {
        let headers = headers("x-ratelimit-remaining", raw);
        assert_eq!(parse_count(&headers, "x-ratelimit-remaining"), expected);
    }

    #[rstest]
    #[case("1", Some(Duration::from_secs(1)))]
    #[case("0.25", Some(Duration::from_millis(250)))]
    #[case("-2", None)]
    #[case("soon", None)]
    fn test_parse_seconds(#[case] raw: &str, #[case] expected: Option<Duration>) {
        let headers = headers("x-ratelimit-reset-after", raw);
        assert_eq!(parse_seconds(&headers, "x-ratelimit-reset-after"), expected);
    }

    #[test]
    fn test_missing_headers() {
        let headers = HeaderMap::new();
        assert_eq!(parse_count(&headers, "x-ratelimit-remaining"), None);
        assert_eq!(parse_seconds(&headers, "x-ratelimit-reset-after"), None);
    }

    fn value(v: &str) -> HeaderValue {
        HeaderValue::from_str(v).unwrap()
    }

    fn headers(name: &'static str, v: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, value(v));
        headers
    }
}
