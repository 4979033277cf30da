//! Web search tool.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use foreman_core::config::SearchSettings;

use crate::registry::{Tool, ToolError, ToolOutcome};

/// Queries a web search endpoint. Public tool: requires no permission.
pub struct SearchTool {
    client: Client,
    settings: SearchSettings,
}

impl SearchTool {
    /// Create a search tool for the configured endpoint.
    #[must_use]
    pub fn new(settings: SearchSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for a query and return structured results"
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let query = input["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidParams("missing 'query' field".to_string()))?;
        if query.trim().is_empty() {
            return Err(ToolError::InvalidParams("empty query".to_string()));
        }

        let response = match self
            .client
            .get(&self.settings.endpoint)
            .query(&[("q", query), ("format", "json"), ("no_html", "1")])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Ok(ToolOutcome::failure(e.to_string())),
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Ok(ToolOutcome::failure(format!(
                "search endpoint returned {status}"
            )));
        }

        let results: serde_json::Value = response.json().await.unwrap_or(serde_json::Value::Null);
        Ok(ToolOutcome::success(json!({
            "query": query,
            "results": results,
        })))
    }
}
