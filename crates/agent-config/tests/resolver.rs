//! ConfigResolver against a local one-shot HTTP server.

use std::io::ErrorKind;
use std::time::{Duration, Instant};

use agent_config::{AgentConfig, ConfigError, ConfigResolver, ConfigSettings};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Serve a single canned response and hand back the raw request.
async fn start_single_response_server(
    status: &str,
    content_type: &str,
    body: &'static str,
) -> Option<(String, oneshot::Receiver<String>)> {
    let listener = match TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => listener,
        Err(err) if err.kind() == ErrorKind::PermissionDenied => return None,
        Err(err) => panic!("failed to bind local test listener: {err}"),
    };
    let addr = listener.local_addr().unwrap();

    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Length: {}\r\nContent-Type: {content_type}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
    .into_bytes();

    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let n = socket.read(&mut buf).await.unwrap_or(0);
        let _ = tx.send(String::from_utf8_lossy(&buf[..n]).to_string());
        let _ = socket.write_all(&response).await;
        let _ = socket.shutdown().await;
    });

    Some((format!("http://{addr}/api/agent-settings"), rx))
}

/// Accept a connection and never answer.
async fn start_silent_server() -> Option<String> {
    let listener = match TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => listener,
        Err(err) if err.kind() == ErrorKind::PermissionDenied => return None,
        Err(err) => panic!("failed to bind local test listener: {err}"),
    };
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (_socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });
    Some(format!("http://{addr}/api/agent-settings"))
}

fn resolver_for(url: &str) -> ConfigResolver {
    ConfigResolver::new(
        ConfigSettings::builder()
            .endpoint(url)
            .token("test-token")
            .timeout(Duration::from_millis(500))
            .build(),
    )
}

#[tokio::test]
async fn test_success_merges_over_defaults_and_sends_bearer() {
    let Some((url, request)) = start_single_response_server(
        "200 OK",
        "application/json",
        r#"{"prompt":"A","instructions":"B","greetingText":"Say hello","ttsVoiceId":"v-9"}"#,
    )
    .await
    else {
        return;
    };

    let config = resolver_for(&url).resolve().await;
    assert_eq!(config.effective_instructions(), "A\n\nB");
    assert_eq!(config.greeting_text, "Say hello");
    assert_eq!(config.tts_voice_id, "v-9");
    assert_eq!(config.llm_model, AgentConfig::default().llm_model);

    let raw = request.await.unwrap();
    assert!(raw.starts_with("GET /api/agent-settings"));
    assert!(raw
        .to_ascii_lowercase()
        .contains("authorization: bearer test-token"));
}

#[tokio::test]
async fn test_non_200_returns_defaults() {
    for status in ["500 Internal Server Error", "401 Unauthorized", "404 Not Found"] {
        let Some((url, _)) =
            start_single_response_server(status, "application/json", r#"{"instructions":"B"}"#)
                .await
        else {
            return;
        };
        let resolver = resolver_for(&url);
        assert_eq!(resolver.resolve().await, AgentConfig::default());
    }
}

#[tokio::test]
async fn test_non_json_returns_defaults() {
    let Some((url, _)) =
        start_single_response_server("200 OK", "text/html", "<html>maintenance</html>").await
    else {
        return;
    };
    let resolver = resolver_for(&url);
    assert!(matches!(
        resolver.try_resolve().await,
        Err(ConfigError::InvalidBody(_))
    ));
}

#[tokio::test]
async fn test_failure_is_idempotent() {
    let mut results = Vec::new();
    for _ in 0..2 {
        let Some((url, _)) =
            start_single_response_server("502 Bad Gateway", "text/plain", "upstream down").await
        else {
            return;
        };
        results.push(resolver_for(&url).resolve().await);
    }
    assert_eq!(results[0], results[1]);
    assert_eq!(results[0], AgentConfig::default());
}

#[tokio::test]
async fn test_connection_refused_returns_defaults() {
    // Bind then drop to get a port with nothing listening.
    let listener = match std::net::TcpListener::bind("127.0.0.1:0") {
        Ok(listener) => listener,
        Err(_) => return,
    };
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let resolver = resolver_for(&format!("http://{addr}/config"));
    assert_eq!(resolver.resolve().await, AgentConfig::default());
}

#[tokio::test]
async fn test_timeout_is_bounded() {
    let Some(url) = start_silent_server().await else {
        return;
    };
    let resolver = resolver_for(&url);

    let start = Instant::now();
    let result = resolver.try_resolve().await;
    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(matches!(
        result,
        Err(ConfigError::Timeout(_)) | Err(ConfigError::Http(_))
    ));
    assert_eq!(resolver.resolve().await, AgentConfig::default());
}
