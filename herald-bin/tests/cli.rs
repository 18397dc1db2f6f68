#[cfg(test)]
mod cli {
    use assert_cmd::cargo::cargo_bin_cmd;
    use predicates::{
        prelude::PredicateBooleanExt,
        str::{contains, is_empty},
    };
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use std::error::Error;
    use std::fs;
    use std::time::{Duration, Instant};
    use tempfile::tempdir;
    use test_utils::{api_base, json_template, mock_route, mock_server};
    use wiremock::{MockServer, Request, Respond, ResponseTemplate};

    type Result<T> = std::result::Result<T, Box<dyn Error>>;

    const MESSAGES: &str = "/api/v9/channels/10/messages";

    /// Answers a posted message with `msg-<content>` as its id
    struct EchoMessage;

    impl Respond for EchoMessage {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let body: Value = serde_json::from_slice(&request.body).unwrap();
            let content = body["content"].as_str().unwrap_or("embed");
            ResponseTemplate::new(200).set_body_json(json!({
                "id": format!("msg-{content}"),
                "channel_id": "10",
                "content": content,
            }))
        }
    }

    /// `herald` with the token and base URL pointing at the mock server,
    /// run in an empty directory so no `herald.toml` is picked up
    macro_rules! herald {
        ($server:expr, $dir:expr) => {{
            let mut cmd = cargo_bin_cmd!("herald");
            cmd.current_dir($dir)
                .env_remove("RUST_LOG")
                .env("HERALD_TOKEN", "cli-token")
                .arg("--base-url")
                .arg(api_base!($server).as_str());
            cmd
        }};
    }

    async fn posted(server: &MockServer) -> Vec<Value> {
        server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|request| request.url.path() == MESSAGES)
            .map(|request| serde_json::from_slice(&request.body).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_send_posts_messages_in_order() -> Result<()> {
        let server = mock_server!(404);
        mock_route!(&server, "POST", MESSAGES => EchoMessage);
        let dir = tempdir()?;

        herald!(server, dir.path())
            .args(["send", "--channel", "10", "one", "two", "three"])
            .assert()
            .success()
            .stdout("msg-one\nmsg-two\nmsg-three\n");

        let contents: Vec<_> = posted(&server)
            .await
            .into_iter()
            .map(|body| body["content"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_send_reads_stdin() -> Result<()> {
        let server = mock_server!(404);
        mock_route!(&server, "POST", MESSAGES => EchoMessage);
        let dir = tempdir()?;

        herald!(server, dir.path())
            .args(["send", "-C", "10"])
            .write_stdin("alpha\n\nbeta\n")
            .assert()
            .success()
            .stdout("msg-alpha\nmsg-beta\n");
        Ok(())
    }

    #[tokio::test]
    async fn test_send_embed() -> Result<()> {
        let server = mock_server!(404);
        mock_route!(&server, "POST", MESSAGES => EchoMessage);
        let dir = tempdir()?;

        herald!(server, dir.path())
            .args([
                "send",
                "-C",
                "10",
                "--title",
                "Release 10",
                "--color",
                "#ff0000",
                "--thumbnail",
                "https://example.com/icon.png",
            ])
            .assert()
            .success()
            .stdout("msg-embed\n");

        assert_eq!(
            posted(&server).await,
            vec![json!({"embeds": [{
                "title": "Release 10",
                "color": 16_711_680,
                "thumbnail": {"url": "https://example.com/icon.png"}
            }]})]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_nothing_to_send() -> Result<()> {
        let server = mock_server!(404);
        let dir = tempdir()?;

        herald!(server, dir.path())
            .args(["send", "-C", "10"])
            .assert()
            .failure()
            .code(1)
            .stderr(contains("Nothing to send"));
        Ok(())
    }

    #[tokio::test]
    async fn test_throttled_message_is_delivered() -> Result<()> {
        let server = mock_server!(404);
        mock_route!(
            &server,
            "POST",
            MESSAGES => json_template!(429, {"message": "You are being rate limited.", "retry_after": 0.3, "global": false}),
            up_to_n_times(1),
            with_priority(1)
        );
        mock_route!(&server, "POST", MESSAGES => EchoMessage);
        let dir = tempdir()?;

        let started = Instant::now();
        herald!(server, dir.path())
            .args(["send", "-C", "10", "first", "second"])
            .assert()
            .success()
            .stdout("msg-first\nmsg-second\n")
            .stderr(contains("Throttled on route `channels`"));
        assert!(started.elapsed() >= Duration::from_millis(300));

        let contents: Vec<_> = posted(&server)
            .await
            .into_iter()
            .map(|body| body["content"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(contents, vec!["first", "first", "second"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_delivery_failure_exit_code() -> Result<()> {
        let server = mock_server!(404);
        mock_route!(
            &server,
            "POST",
            MESSAGES => json_template!(403, {"code": 50001, "message": "Missing Access"}),
            expect(2)
        );
        let dir = tempdir()?;

        herald!(server, dir.path())
            .args(["send", "-C", "10", "one", "two"])
            .assert()
            .failure()
            .code(2)
            .stdout(is_empty())
            .stderr(contains("Missing Access").and(contains("50001")));
        Ok(())
    }

    #[tokio::test]
    async fn test_route_stats() -> Result<()> {
        let server = mock_server!(404);
        mock_route!(&server, "POST", MESSAGES => EchoMessage);
        let dir = tempdir()?;

        herald!(server, dir.path())
            .args(["send", "-C", "10", "--route-stats", "hello"])
            .assert()
            .success()
            .stderr(contains("Per-route statistics").and(contains("channels")));
        Ok(())
    }

    #[tokio::test]
    async fn test_channels() -> Result<()> {
        let server = mock_server!(404);
        mock_route!(
            &server,
            "GET",
            "/api/v9/users/@me/guilds" => json_template!(200, [{"id": "1", "name": "Playnite"}])
        );
        mock_route!(
            &server,
            "GET",
            "/api/v9/guilds/1/channels" => json_template!(200, [
                {"id": "12", "name": "announcements", "type": 0, "position": 2},
                {"id": "11", "name": "general", "type": 0, "position": 1},
                {"id": "13", "name": "Voice", "type": 2, "position": 3}
            ])
        );
        let dir = tempdir()?;

        herald!(server, dir.path())
            .arg("channels")
            .assert()
            .success()
            .stdout("11\tgeneral\n12\tannouncements\n");

        herald!(server, dir.path())
            .args(["channels", "--all"])
            .assert()
            .success()
            .stdout(contains("13\tVoice"));

        herald!(server, dir.path())
            .args(["channels", "--name", "announcements"])
            .assert()
            .success()
            .stdout("12\n");

        herald!(server, dir.path())
            .args(["channels", "--guild", "1", "--name", "offtopic"])
            .assert()
            .failure()
            .code(1)
            .stderr(contains("No text channel named `offtopic`"));
        Ok(())
    }

    #[tokio::test]
    async fn test_config_file() -> Result<()> {
        let server = mock_server!(404);
        mock_route!(&server, "POST", MESSAGES => EchoMessage);
        let dir = tempdir()?;
        fs::write(
            dir.path().join("herald.toml"),
            format!(
                "base_url = \"{}\"\ntoken = \"file-token\"\ntimeout = \"5s\"\n",
                api_base!(server)
            ),
        )?;

        cargo_bin_cmd!("herald")
            .current_dir(dir.path())
            .env_remove("HERALD_TOKEN")
            .args(["send", "-C", "10", "from config"])
            .assert()
            .success()
            .stdout("msg-from config\n");

        let requests = server.received_requests().await.unwrap();
        assert_eq!(
            requests[0].headers.get("authorization").unwrap(),
            "Bot file-token"
        );
        Ok(())
    }

    #[test]
    fn test_invalid_config_file() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("herald.toml"), "tokn = \"typo\"\n")?;

        cargo_bin_cmd!("herald")
            .current_dir(dir.path())
            .args(["send", "-C", "10", "hello"])
            .assert()
            .failure()
            .code(3)
            .stderr(contains("Cannot load configuration file"));
        Ok(())
    }

    #[test]
    fn test_missing_token() -> Result<()> {
        let dir = tempdir()?;

        cargo_bin_cmd!("herald")
            .current_dir(dir.path())
            .env_remove("HERALD_TOKEN")
            .args(["send", "-C", "10", "hello"])
            .assert()
            .failure()
            .code(1)
            .stderr(contains("No API token configured"));
        Ok(())
    }
}
