//! Messaging sender tool.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use foreman_core::config::MessagingSettings;

use crate::registry::{Tool, ToolError, ToolOutcome};

/// Sends a message through an HTTP messaging gateway.
pub struct MessagingTool {
    client: Client,
    settings: MessagingSettings,
}

impl MessagingTool {
    /// Create a messaging tool for the configured gateway.
    #[must_use]
    pub fn new(settings: MessagingSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }
}

#[async_trait]
impl Tool for MessagingTool {
    fn name(&self) -> &str {
        "send_whatsapp"
    }

    fn description(&self) -> &str {
        "Send a WhatsApp message to a specified phone number with message content"
    }

    fn required_permission(&self) -> Option<&str> {
        Some("whatsapp:send")
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let to = input["to"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidParams("missing 'to' field".to_string()))?;
        let message = input["message"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidParams("missing 'message' field".to_string()))?;

        let response = match self
            .client
            .post(&self.settings.endpoint)
            .json(&json!({"to": to, "message": message}))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Ok(ToolOutcome::failure(e.to_string())),
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Ok(ToolOutcome::failure(format!(
                "messaging gateway returned {status}: {text}"
            )));
        }

        Ok(ToolOutcome::success(json!({
            "to": to,
            "message": message,
        })))
    }
}
