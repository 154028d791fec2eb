//! `send_sms` tool: text the caller from inside the conversation.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::ToolError;
use crate::gateway::{SmsGateway, SmsSettings, SMS_EMPTY, SMS_NO_ROOM, SMS_UNCONFIGURED};
use crate::tool::{Tool, ToolArgs, ToolOutput};

/// Sends an SMS to the caller of the current call.
///
/// # Parameters
///
/// - `message` (required): The text to send. Surrounding whitespace is trimmed.
///
/// The room is read from the call context when the tool runs. Nothing is
/// sent (and no request is made) unless the SMS endpoint, its token and
/// the room are all known; the tool answers with a refusal instead.
pub struct SendSms {
    gateway: SmsGateway,
    settings: SmsSettings,
}

impl SendSms {
    /// Create the tool with explicit settings.
    pub fn new(settings: SmsSettings) -> Self {
        Self {
            gateway: SmsGateway::new(settings.timeout),
            settings,
        }
    }

    /// Whether the endpoint and token are both configured.
    pub fn is_configured(&self) -> bool {
        self.settings.credentials().is_some()
    }
}

#[async_trait]
impl Tool for SendSms {
    fn name(&self) -> &str {
        "send_sms"
    }

    fn description(&self) -> &str {
        "Send a text message (SMS) to the caller. Use when the caller asks for a text \
         follow-up, a link, or details in writing."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "message": {
                    "type": "string",
                    "description": "The text message to send to the caller."
                }
            },
            "required": ["message"]
        })
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let message = args.get_string("message")?;

        let Some((url, token)) = self.settings.credentials() else {
            info!("send_sms refused: SMS endpoint or token not configured");
            return Ok(ToolOutput::failure(SMS_UNCONFIGURED));
        };

        let body = message.trim();
        if body.is_empty() {
            return Ok(ToolOutput::failure(SMS_EMPTY));
        }

        let Some(room_name) = args.call.room_name() else {
            info!(
                "send_sms refused: call {} has no room identity yet",
                args.call.call_id()
            );
            return Ok(ToolOutput::failure(SMS_NO_ROOM));
        };

        debug!("send_sms for call {} room {}", args.call.call_id(), room_name);
        let result = self.gateway.send(url, token, &room_name, body).await;

        if result.ok {
            Ok(ToolOutput::success(result.message))
        } else {
            Ok(ToolOutput::failure(result.message))
        }
    }
}
