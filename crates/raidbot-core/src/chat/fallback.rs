//! Remote text generation used when the rule table has no answer.
//!
//! A [`Fallback`] never fails past its own boundary: transport errors,
//! timeouts and empty completions all come back as `None`.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::context::{ContentArea, ContextSnapshot};
use crate::data::Champion;
use crate::provider::types::ChatMessage;
use crate::provider::LlmProvider;

/// Optional text generation capability.
#[async_trait]
pub trait Fallback: Send + Sync {
    /// Generate an answer for `text`, or `None` when nothing usable came back.
    async fn generate(&self, text: &str) -> Option<String>;
}

/// Tuning for [`LlmFallback`].
#[derive(Debug, Clone)]
pub struct FallbackOptions {
    pub timeout: Duration,
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for FallbackOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            model: None,
            max_tokens: 150,
            temperature: 0.7,
        }
    }
}

/// Champions listed in the system prompt at most.
const PROMPT_CHAMPIONS: usize = 10;

/// A [`Fallback`] backed by an [`LlmProvider`], primed with the current
/// context snapshot and the champions the message is about.
pub struct LlmFallback {
    provider: Arc<dyn LlmProvider>,
    options: FallbackOptions,
    system_prompt: String,
}

impl LlmFallback {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        options: FallbackOptions,
        ctx: &ContextSnapshot,
        champions: &[Champion],
    ) -> Self {
        Self {
            provider,
            options,
            system_prompt: system_prompt(ctx, champions),
        }
    }
}

#[async_trait]
impl Fallback for LlmFallback {
    async fn generate(&self, text: &str) -> Option<String> {
        let messages = [
            ChatMessage::system(&self.system_prompt),
            ChatMessage::user(text),
        ];

        let call = self.provider.chat(
            &messages,
            self.options.model.as_deref(),
            self.options.max_tokens,
            self.options.temperature,
        );

        match tokio::time::timeout(self.options.timeout, call).await {
            Ok(Ok(resp)) => {
                let content = resp.content.map(|c| c.trim().to_string()).unwrap_or_default();
                if content.is_empty() {
                    debug!("LLM fallback returned an empty completion");
                    None
                } else {
                    Some(content)
                }
            }
            Ok(Err(e)) => {
                warn!(error = %e, "LLM fallback failed");
                None
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.options.timeout.as_secs(),
                    "LLM fallback timed out"
                );
                None
            }
        }
    }
}

/// System prompt describing the assistant plus whatever the snapshot knows.
fn system_prompt(ctx: &ContextSnapshot, champions: &[Champion]) -> String {
    let mut prompt = String::from(
        "You are a RAID Shadow Legends expert AI assistant. You help players with champion \
         builds, team compositions, strategies, and current game events.",
    );

    let meta: Vec<String> = ContentArea::ALL
        .iter()
        .filter_map(|area| {
            let top = ctx.top(*area, 4);
            (!top.is_empty()).then(|| format!("{}: {}", area.label(), top.join(", ")))
        })
        .collect();
    let events: Vec<&str> = ctx.events.iter().take(3).map(|e| e.name.as_str()).collect();
    let listed: Vec<String> = champions
        .iter()
        .take(PROMPT_CHAMPIONS)
        .map(|c| format!("{} ({}, {})", c.name, c.faction, c.rarity))
        .collect();

    if !meta.is_empty() || !events.is_empty() || !listed.is_empty() {
        prompt.push_str("\n\nCurrent RAID Data:");
        if !listed.is_empty() {
            prompt.push_str("\nChampions: ");
            prompt.push_str(&listed.join(", "));
        }
        for line in &meta {
            prompt.push_str("\nMeta ");
            prompt.push_str(line);
        }
        if !events.is_empty() {
            prompt.push_str("\nCurrent Events: ");
            prompt.push_str(&events.join(", "));
        }
    }

    prompt.push_str(
        "\n\nGuidelines:\n\
         - Be helpful and specific about RAID Shadow Legends\n\
         - Recommend actual champions and builds\n\
         - Keep responses concise but informative\n\
         - If you don't know something specific, suggest general RAID strategies\n\
         - Always stay focused on RAID Shadow Legends topics",
    );
    prompt
}
