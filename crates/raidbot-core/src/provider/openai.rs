//! Client for OpenAI-compatible `/chat/completions` endpoints.
//!
//! OpenRouter, OpenAI, Groq, Gemini (OpenAI mode), DeepSeek and local vLLM
//! servers all speak the same protocol, so one client serves every
//! configured provider. Requests are sent once; deadlines belong to the
//! caller.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::types::{ChatMessage, LlmResponse, Usage};
use super::LlmProvider;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Base URLs of the hosted providers raidbot knows by name.
const PROVIDER_URLS: &[(&str, &str)] = &[
    ("openrouter", "https://openrouter.ai/api/v1"),
    ("openai", "https://api.openai.com/v1"),
    ("groq", "https://api.groq.com/openai/v1"),
    ("gemini", "https://generativelanguage.googleapis.com/v1beta/openai"),
    ("deepseek", "https://api.deepseek.com/v1"),
];

/// The configured base, else the provider's known URL, without a trailing slash.
fn base_url_for(provider_name: &str, api_base: Option<&str>) -> String {
    let base = api_base
        .filter(|b| !b.trim().is_empty())
        .or_else(|| {
            PROVIDER_URLS
                .iter()
                .find(|(name, _)| *name == provider_name)
                .map(|(_, url)| *url)
        })
        .unwrap_or(DEFAULT_BASE_URL);
    base.trim_end_matches('/').to_string()
}

pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
}

impl OpenAiProvider {
    /// `api_base` overrides the URL looked up from `provider_name`.
    pub fn new(
        provider_name: &str,
        api_key: &str,
        api_base: Option<&str>,
        default_model: &str,
        client: Client,
    ) -> Self {
        let base_url = base_url_for(provider_name, api_base);
        debug!(provider = provider_name, base_url = %base_url, "Initialized LLM provider");

        Self {
            client,
            api_key: api_key.to_string(),
            base_url,
            default_model: default_model.to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

// ── Wire format ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct Completion {
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

fn parse_completion(body: &str) -> Result<LlmResponse> {
    let completion: Completion =
        serde_json::from_str(body).context("Failed to parse LLM API response")?;

    let choice = completion
        .choices
        .into_iter()
        .next()
        .context("LLM API returned no choices")?;

    Ok(LlmResponse {
        content: choice.message.content,
        finish_reason: choice.finish_reason.unwrap_or_else(|| "stop".into()),
        usage: completion.usage.unwrap_or_default(),
    })
}

/// `error.message` from an error body (object or one-element array), else
/// the raw body.
fn error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let detail = parsed.as_ref().and_then(|v| {
        let error = match v {
            Value::Array(items) => items.first()?.get("error")?,
            other => other.get("error")?,
        };
        error.get("message")?.as_str().map(str::to_string)
    });
    detail.unwrap_or_else(|| body.trim().to_string())
}

// ── LlmProvider implementation ──────────────────────────────────────

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        model: Option<&str>,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<LlmResponse> {
        let model = model.unwrap_or(&self.default_model);
        let body = CompletionBody {
            model,
            messages,
            max_tokens,
            temperature,
        };

        debug!(model, messages = messages.len(), "Requesting completion");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Network error calling LLM API")?;

        let status = response.status();
        let text = response
            .text()
            .await
            .context("Failed to read LLM API response body")?;

        if !status.is_success() {
            anyhow::bail!("LLM API error ({}): {}", status, error_message(&text));
        }

        let parsed = parse_completion(&text)?;
        debug!(
            finish_reason = %parsed.finish_reason,
            tokens = parsed.usage.total_tokens,
            "Completion received"
        );
        Ok(parsed)
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_resolution() {
        assert_eq!(base_url_for("groq", None), "https://api.groq.com/openai/v1");
        assert_eq!(base_url_for("mystery", None), DEFAULT_BASE_URL);
        assert_eq!(
            base_url_for("vllm", Some("http://localhost:8000/v1/")),
            "http://localhost:8000/v1"
        );
        assert_eq!(base_url_for("deepseek", Some("  ")), "https://api.deepseek.com/v1");
    }

    #[test]
    fn test_provider_endpoint_and_model() {
        let p = OpenAiProvider::new("openrouter", "key", None, "openai/gpt-4o-mini", Client::new());
        assert_eq!(p.endpoint(), "https://openrouter.ai/api/v1/chat/completions");
        assert_eq!(p.default_model(), "openai/gpt-4o-mini");
    }

    #[test]
    fn test_parse_completion() {
        let body = r#"{
            "choices": [{"message": {"content": "Build Kael with Lifesteal."}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 40, "completion_tokens": 6, "total_tokens": 46}
        }"#;
        let resp = parse_completion(body).unwrap();
        assert_eq!(resp.content.as_deref(), Some("Build Kael with Lifesteal."));
        assert_eq!(resp.usage.total_tokens, 46);
    }

    #[test]
    fn test_parse_completion_without_choices() {
        assert!(parse_completion(r#"{"choices": []}"#).is_err());
        assert!(parse_completion("not json").is_err());
    }

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(error_message(r#"{"error": {"message": "bad key"}}"#), "bad key");
        assert_eq!(error_message(r#"[{"error": {"message": "quota"}}]"#), "quota");
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
    }
}
