// Oracle implementation using Gemini
//
// This is the infrastructure implementation of BaseOracle.
// What to ask (the instruction template) lives in domains/intent/prompt.rs.

use anyhow::{Context, Result};
use async_trait::async_trait;
use gemini_client::{GeminiClient, GenerateContentRequest, HarmBlockThreshold, SafetySetting};
use serde_json::json;

use super::BaseOracle;

/// Fixed content-filter threshold. Visitors cannot change it.
pub const SAFETY_THRESHOLD: HarmBlockThreshold = HarmBlockThreshold::BlockOnlyHigh;

/// Response schema for the `{url, parameter, name}` answer object.
///
/// All three keys are required; the service writes the string "None" when a
/// parameter or name does not apply.
pub fn oracle_response_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "url": { "type": "STRING" },
            "parameter": { "type": "STRING" },
            "name": { "type": "STRING" }
        },
        "required": ["url", "parameter", "name"]
    })
}

/// Gemini-backed oracle
#[derive(Clone)]
pub struct GeminiOracle {
    client: GeminiClient,
    model: String,
}

impl GeminiOracle {
    pub fn new(api_key: String, model: impl Into<String>) -> Self {
        Self {
            client: GeminiClient::new(api_key),
            model: model.into(),
        }
    }

    pub fn with_client(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    fn build_request(prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest::prompt(prompt)
            .safety_settings(SafetySetting::uniform(SAFETY_THRESHOLD))
            .json_response(oracle_response_schema())
    }
}

#[async_trait]
impl BaseOracle for GeminiOracle {
    async fn generate_json(&self, prompt: &str) -> Result<String> {
        tracing::debug!(
            prompt_length = prompt.len(),
            model = %self.model,
            "Calling Gemini API"
        );

        let request = Self::build_request(prompt);
        let text = self
            .client
            .generate_text(&self.model, &request)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, model = %self.model, "Gemini API call failed");
                e
            })
            .context("Failed to call Gemini API")?;

        tracing::debug!(response_length = text.len(), "Gemini API response received");

        Ok(text)
    }
}
