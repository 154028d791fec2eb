//! HTTP side channel for sending an SMS tied to the active call.
//!
//! The messaging API looks the caller's number up from the room name, so
//! the request only carries `{roomName, body}`. Every outcome is folded
//! into an [`SmsResult`]; nothing here returns an error to the caller.

use std::env;
use std::fmt;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Default bound on one SMS request.
pub const DEFAULT_SMS_TIMEOUT: Duration = Duration::from_secs(15);

/// Message returned when the gateway accepted the SMS.
pub const SMS_SENT: &str = "Text message sent.";

/// Message used when the gateway declined without saying why.
pub const SMS_FAILED: &str = "Failed to send text message.";

/// Refusal when the SMS endpoint or token is not configured.
pub const SMS_UNCONFIGURED: &str = "SMS is not configured for this call.";

/// Refusal when the call has no confirmed room yet.
pub const SMS_NO_ROOM: &str = "Cannot send SMS: the call is not connected to a room yet.";

/// Refusal when the message is empty after trimming.
pub const SMS_EMPTY: &str = "Cannot send an empty text message.";

/// Outcome of an SMS attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmsResult {
    pub ok: bool,
    /// Confirmation or a human-readable failure reason.
    pub message: String,
}

impl SmsResult {
    fn sent() -> Self {
        Self {
            ok: true,
            message: SMS_SENT.to_string(),
        }
    }

    fn failed(kind: SmsFailure, message: impl Into<String>) -> Self {
        let message = message.into();
        warn!("SMS not sent ({}): {}", kind, message);
        Self { ok: false, message }
    }
}

/// Why an SMS was not sent, for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmsFailure {
    /// Endpoint or token missing.
    Unconfigured,
    /// Timeout, connection error, or malformed response.
    Transport,
    /// The gateway answered and declined.
    Rejected,
}

impl fmt::Display for SmsFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SmsFailure::Unconfigured => "unconfigured",
            SmsFailure::Transport => "transport",
            SmsFailure::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Where and how to send SMS.
#[derive(Clone, PartialEq, Eq)]
pub struct SmsSettings {
    /// SMS endpoint URL.
    pub url: Option<String>,
    /// Bearer token.
    pub token: Option<String>,
    /// Bound on one request.
    pub timeout: Duration,
}

impl Default for SmsSettings {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            timeout: DEFAULT_SMS_TIMEOUT,
        }
    }
}

impl SmsSettings {
    /// Create settings with an endpoint and token.
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            token: Some(token.into()),
            ..Default::default()
        }
    }

    /// Create settings from environment variables.
    ///
    /// - `AGENT_SMS_URL` - SMS endpoint
    /// - `AGENT_SMS_TOKEN` - Bearer token (falls back to `AGENT_CONFIG_TOKEN`)
    /// - `AGENT_SMS_TIMEOUT_SECS` - Request timeout (default: 15)
    pub fn from_env() -> Self {
        let token = env_value("AGENT_SMS_TOKEN").or_else(|| env_value("AGENT_CONFIG_TOKEN"));
        let timeout = env_value("AGENT_SMS_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SMS_TIMEOUT);

        Self {
            url: env_value("AGENT_SMS_URL"),
            token,
            timeout,
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Endpoint and token, if both are present and non-blank.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let url = self.url.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let token = self.token.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        Some((url, token))
    }
}

// Keep the token out of debug output.
impl fmt::Debug for SmsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmsSettings")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn env_value(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SmsRequest<'a> {
    room_name: &'a str,
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct SmsResponse {
    #[serde(default)]
    success: Value,
    #[serde(default)]
    error: Option<Value>,
}

/// Client for the SMS endpoint.
#[derive(Debug, Clone)]
pub struct SmsGateway {
    client: Client,
    timeout: Duration,
}

impl SmsGateway {
    /// Create a gateway with the given request timeout.
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
            warn!("Failed to build SMS HTTP client ({}), using defaults", e);
            Client::new()
        });
        Self { client, timeout }
    }

    /// Send `body` to the caller of `room_name`.
    ///
    /// The body is trimmed before sending.
    pub async fn send(&self, url: &str, token: &str, room_name: &str, body: &str) -> SmsResult {
        let url = url.trim();
        let token = token.trim();
        if url.is_empty() || token.is_empty() {
            return SmsResult::failed(SmsFailure::Unconfigured, SMS_UNCONFIGURED);
        }
        let room_name = room_name.trim();
        if room_name.is_empty() {
            return SmsResult::failed(SmsFailure::Unconfigured, SMS_NO_ROOM);
        }
        let body = body.trim();

        info!("Sending SMS for room {} ({} chars)", room_name, body.len());

        match timeout(self.timeout, self.post(url, token, room_name, body)).await {
            Ok(result) => result,
            Err(_) => SmsResult::failed(
                SmsFailure::Transport,
                format!("SMS request timed out after {}s", self.timeout.as_secs()),
            ),
        }
    }

    async fn post(&self, url: &str, token: &str, room_name: &str, body: &str) -> SmsResult {
        let response = match self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", token))
            .json(&SmsRequest { room_name, body })
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return SmsResult::failed(SmsFailure::Transport, e.to_string()),
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return SmsResult::failed(SmsFailure::Transport, e.to_string()),
        };
        debug!("SMS gateway answered {} ({} bytes)", status, text.len());

        if !status.is_success() {
            return SmsResult::failed(SmsFailure::Rejected, http_error_message(status, &text));
        }

        let parsed: SmsResponse = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(e) => {
                return SmsResult::failed(
                    SmsFailure::Transport,
                    format!("Invalid response from SMS gateway: {}", e),
                )
            }
        };

        if is_truthy(&parsed.success) {
            info!("SMS sent for room {}", room_name);
            SmsResult::sent()
        } else {
            let message = parsed
                .error
                .as_ref()
                .and_then(error_text)
                .unwrap_or_else(|| SMS_FAILED.to_string());
            SmsResult::failed(SmsFailure::Rejected, message)
        }
    }
}

impl Default for SmsGateway {
    fn default() -> Self {
        Self::new(DEFAULT_SMS_TIMEOUT)
    }
}

/// Failure text for a non-2xx answer: the JSON `error` field, else the
/// raw body, else the status line.
fn http_error_message(status: reqwest::StatusCode, text: &str) -> String {
    if let Ok(Value::Object(object)) = serde_json::from_str::<Value>(text) {
        if let Some(message) = object.get("error").and_then(error_text) {
            return message;
        }
    }
    let raw = text.trim();
    if raw.is_empty() {
        format!("SMS gateway returned {}", status)
    } else {
        raw.to_string()
    }
}

fn error_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(object) => object
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
    }

    #[test]
    fn test_http_error_prefers_json_error() {
        let status = reqwest::StatusCode::INTERNAL_SERVER_ERROR;
        assert_eq!(
            http_error_message(status, r#"{"error":"rate limited"}"#),
            "rate limited"
        );
        assert_eq!(http_error_message(status, "Bad Gateway"), "Bad Gateway");
        assert_eq!(
            http_error_message(status, ""),
            "SMS gateway returned 500 Internal Server Error"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(SmsRequest {
            room_name: "call-abc",
            body: "call me back",
        })
        .unwrap();
        assert_eq!(body, json!({"roomName": "call-abc", "body": "call me back"}));
    }

    #[test]
    fn test_settings_credentials() {
        assert!(SmsSettings::default().credentials().is_none());
        assert!(SmsSettings::new("", "t").credentials().is_none());
        assert_eq!(
            SmsSettings::new("https://x/sms", "t").credentials(),
            Some(("https://x/sms", "t"))
        );
        assert!(!format!("{:?}", SmsSettings::new("u", "secret")).contains("secret"));
    }

    #[test]
    fn test_settings_from_env_token_fallback() {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();

        fn clear_all_vars() {
            std::env::remove_var("AGENT_SMS_URL");
            std::env::remove_var("AGENT_SMS_TOKEN");
            std::env::remove_var("AGENT_SMS_TIMEOUT_SECS");
            std::env::remove_var("AGENT_CONFIG_TOKEN");
        }

        clear_all_vars();
        assert_eq!(SmsSettings::from_env(), SmsSettings::default());

        clear_all_vars();
        std::env::set_var("AGENT_SMS_URL", "https://admin.example.com/api/sms");
        std::env::set_var("AGENT_CONFIG_TOKEN", "config-token");
        let settings = SmsSettings::from_env();
        assert_eq!(settings.token.as_deref(), Some("config-token"));

        std::env::set_var("AGENT_SMS_TOKEN", "sms-token");
        std::env::set_var("AGENT_SMS_TIMEOUT_SECS", "5");
        let settings = SmsSettings::from_env();
        assert_eq!(settings.token.as_deref(), Some("sms-token"));
        assert_eq!(settings.timeout, Duration::from_secs(5));

        clear_all_vars();
    }

    #[tokio::test]
    async fn test_send_without_credentials_refuses() {
        let gateway = SmsGateway::default();
        let result = gateway.send("", "token", "room", "hi").await;
        assert_eq!(
            result,
            SmsResult {
                ok: false,
                message: SMS_UNCONFIGURED.to_string()
            }
        );
    }
}
