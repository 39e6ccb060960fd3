//! Thin OpenAI Responses API client used by the enhancement stage.
//!
//! Failures here are deliberately coarse: the caller only needs to know
//! whether AI is configured at all (`Unavailable`) and whether a call
//! failed (`CallFailed`); both are recovered locally by the heuristic
//! fallback, never surfaced as pipeline errors.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("no AI credential configured")]
    Unavailable,

    #[error("AI call failed: {0}")]
    CallFailed(String),
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl AiConfig {
    /// Reads `OPENAI_API_KEY`; absence means the pipeline runs on the
    /// heuristic path only.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        Some(Self::new(api_key))
    }

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_owned(),
            model: "gpt-4o-mini".to_owned(),
            temperature: 0.3,
            timeout: Duration::from_secs(60),
        }
    }
}

pub struct OpenAiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiClient {
    pub fn new(config: &AiConfig) -> Result<Self, AiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| AiError::CallFailed(format!("build http client: {err}")))?;

        Ok(Self {
            client,
            endpoint: responses_endpoint(&config.base_url),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    /// Single instructions + input call; returns the concatenated output
    /// text. Network errors, non-2xx statuses, and malformed payloads all
    /// collapse into `CallFailed`.
    pub async fn complete(&self, instructions: &str, input: &str) -> Result<String, AiError> {
        let mut body = serde_json::json!({
            "model": self.model,
            "instructions": instructions,
            "input": input,
            "text": { "format": { "type": "text" } },
            "store": false,
        });

        // Some model families reject sampling params; skip temperature for
        // the ones known to.
        if !self.model.starts_with("gpt-5")
            && let Some(obj) = body.as_object_mut()
        {
            obj.insert(
                "temperature".to_owned(),
                serde_json::json!(self.temperature),
            );
        }

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| AiError::CallFailed(format!("POST {}: {err}", self.endpoint)))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|err| AiError::CallFailed(format!("read response body: {err}")))?;

        if !status.is_success() {
            let message = api_error_message(&raw).unwrap_or(raw);
            return Err(AiError::CallFailed(format!("status {status}: {message}")));
        }

        let value: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|err| AiError::CallFailed(format!("parse response: {err}")))?;
        output_text(&value)
    }
}

fn responses_endpoint(base_url: &str) -> String {
    format!("{}/responses", base_url.trim_end_matches('/'))
}

fn api_error_message(raw_json: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw_json).ok()?;
    Some(value.get("error")?.get("message")?.as_str()?.to_owned())
}

fn output_text(value: &serde_json::Value) -> Result<String, AiError> {
    let output = value
        .get("output")
        .and_then(|v| v.as_array())
        .ok_or_else(|| AiError::CallFailed("missing `output` array in response".to_owned()))?;

    let mut text = String::new();
    for item in output {
        if item.get("type").and_then(|v| v.as_str()) != Some("message") {
            continue;
        }
        let Some(content) = item.get("content").and_then(|v| v.as_array()) else {
            continue;
        };
        for part in content {
            if part.get("type").and_then(|v| v.as_str()) != Some("output_text") {
                continue;
            }
            if let Some(part_text) = part.get("text").and_then(|v| v.as_str()) {
                text.push_str(part_text);
            }
        }
    }

    if text.trim().is_empty() {
        return Err(AiError::CallFailed("empty output text".to_owned()));
    }
    Ok(text)
}

/// Models love to wrap JSON in code fences; strip them before parsing.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        assert_eq!(
            responses_endpoint("https://api.openai.com/v1/"),
            "https://api.openai.com/v1/responses"
        );
    }

    #[test]
    fn output_text_concatenates_message_parts() {
        let value = serde_json::json!({
            "output": [
                { "type": "reasoning" },
                { "type": "message", "content": [
                    { "type": "output_text", "text": "hello " },
                    { "type": "output_text", "text": "world" },
                ]},
            ]
        });
        assert_eq!(output_text(&value).unwrap(), "hello world");
    }

    #[test]
    fn empty_output_is_a_call_failure() {
        let value = serde_json::json!({ "output": [] });
        assert!(matches!(output_text(&value), Err(AiError::CallFailed(_))));
    }

    #[test]
    fn code_fences_are_stripped() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
    }
}
