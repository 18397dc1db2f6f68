//! `test-utils` is used for testing in both `herald-lib` and `herald-bin`.
//! This crate does not depend on `herald-lib` or `herald-bin`, else we would get dependency cycles.
//! Macros are used instead, so that the importer is responsible for providing the dependencies
//! (`wiremock`, `url` and `serde_json`).

/// Create a mock API server, which responds with a predefined status to any
/// request that no more specific mock matches
#[macro_export]
macro_rules! mock_server {
    ($status:expr $(, $func:tt ($($arg:expr),*))*) => {{
        let mock_server = wiremock::MockServer::start().await;
        let response_template = wiremock::ResponseTemplate::new($status);
        let template = response_template$(.$func($($arg),*))*;
        wiremock::Mock::given(wiremock::matchers::any())
            .respond_with(template)
            .with_priority(u8::MAX)
            .mount(&mock_server)
            .await;
        mock_server
    }};
}

/// Mount a mock for one method and path on an existing server.
///
/// ```ignore
/// mock_route!(&server, "GET", "/api/v9/users/@me/guilds" => json_template!(200, guilds), expect(1));
/// ```
#[macro_export]
macro_rules! mock_route {
    ($server:expr, $method:expr, $path:expr => $template:expr $(, $func:tt ($($arg:expr),*))*) => {{
        wiremock::Mock::given(wiremock::matchers::method($method))
            .and(wiremock::matchers::path($path))
            .respond_with($template)
            $(.$func($($arg),*))*
            .mount($server)
            .await;
    }};
}

/// API base URL of a mock server, `<server>/api/v9/`
#[macro_export]
macro_rules! api_base {
    ($server:expr) => {
        url::Url::parse(&format!("{}/api/v9/", $server.uri())).expect("Expected valid mock server URL")
    };
}

/// Response template with a JSON body, optionally followed by rate limit
/// headers given as `remaining, reset_after`
#[macro_export]
macro_rules! json_template {
    ($status:expr, $body:tt) => {
        wiremock::ResponseTemplate::new($status)
            .set_body_json(serde_json::json!($body))
    };
    ($status:expr, $body:tt, ratelimit($remaining:expr, $reset_after:expr)) => {
        $crate::json_template!($status, $body)
            .insert_header("x-ratelimit-remaining", ($remaining).to_string())
            .insert_header("x-ratelimit-reset-after", ($reset_after).to_string())
    };
}
