//! Mail sender tool.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use foreman_core::config::MailSettings;

use crate::registry::{Tool, ToolError, ToolOutcome};

/// Sends email through an HTTP relay endpoint.
///
/// Owns its HTTP client for the lifetime of the tool.
pub struct MailTool {
    client: Client,
    settings: MailSettings,
}

impl MailTool {
    /// Create a mail tool for the configured relay.
    #[must_use]
    pub fn new(settings: MailSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    fn build_payload(&self, to: &str, subject: &str, body: &str) -> serde_json::Value {
        json!({
            "from": self.settings.from,
            "to": to,
            "subject": subject,
            "body": body,
        })
    }
}

#[async_trait]
impl Tool for MailTool {
    fn name(&self) -> &str {
        "send_email"
    }

    fn description(&self) -> &str {
        "Send an email to a specified address with subject and body"
    }

    fn required_permission(&self) -> Option<&str> {
        Some("email:send")
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let to = input["to"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidParams("missing 'to' field".to_string()))?;
        let subject = input["subject"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidParams("missing 'subject' field".to_string()))?;
        let body = input["body"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidParams("missing 'body' field".to_string()))?;

        let payload = self.build_payload(to, subject, body);
        let response = match self
            .client
            .post(&self.settings.endpoint)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Ok(ToolOutcome::failure(e.to_string())),
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Ok(ToolOutcome::failure(format!(
                "mail relay returned {status}: {message}"
            )));
        }

        let relay_response: serde_json::Value =
            response.json().await.unwrap_or(serde_json::Value::Null);
        Ok(ToolOutcome::success(json!({
            "to": to,
            "subject": subject,
            "relay": relay_response,
        })))
    }
}
