//! Configuration module for raidbot.
//!
//! Loads typed configuration from `~/.raidbot/config.json`. Every section
//! has defaults, so an absent file or a partial one is fine. A few values
//! can be overridden from the environment (see [`Config::apply_env`]).

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::chat::{ChatStrategy, FallbackOptions};
use crate::session::ConversationLimits;

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub providers: ProvidersConfig,
    pub chat: ChatConfig,
    pub data: DataConfig,
    pub conversations: ConversationsConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration from the default path (`~/.raidbot/config.json`).
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        Ok(config)
    }

    /// Get the default config file path.
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.json")
    }

    /// Get the default config directory path.
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".raidbot")
    }

    /// Apply `PORT`, `RAIDBOT_UPDATE_KEY` and `RAIDBOT_API_URL` from the
    /// process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Same as [`Config::apply_env`] with an explicit lookup.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").and_then(|p| p.trim().parse::<u16>().ok()) {
            self.server.port = port;
        }
        if let Some(key) = lookup("RAIDBOT_UPDATE_KEY").filter(|k| !k.trim().is_empty()) {
            self.data.update_key = Some(key);
        }
        if let Some(url) = lookup("RAIDBOT_API_URL").filter(|u| !u.trim().is_empty()) {
            self.server.public_url = Some(url);
        }
    }

    /// Validate the configuration and return every problem found.
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.chat.strategy == ChatStrategy::FallbackFirst && self.providers.find_active().is_none() {
            errors.push(
                "chat.strategy is fallbackFirst but no LLM provider has a real API key. \
                 Edit config.json or switch to rulesFirst."
                    .into(),
            );
        }
        if !(0.0..=2.0).contains(&self.chat.temperature) {
            errors.push("chat.temperature must be between 0.0 and 2.0.".into());
        }
        if self.chat.max_tokens == 0 {
            errors.push("chat.maxTokens must be greater than 0.".into());
        }
        if self.chat.fallback_timeout_secs == 0 {
            errors.push("chat.fallbackTimeoutSecs must be greater than 0.".into());
        }

        if self.data.cache_ttl_secs == 0 {
            errors.push("data.cacheTtlSecs must be greater than 0.".into());
        } else if self.data.cache_ttl_secs > MAX_AGE_SECS {
            errors.push(format!("data.cacheTtlSecs must be at most {}.", MAX_AGE_SECS));
        }
        if let Err(e) = cron::Schedule::from_str(&self.data.refresh_schedule) {
            errors.push(format!(
                "data.refreshSchedule '{}' is not a valid cron expression: {}",
                self.data.refresh_schedule, e
            ));
        }

        if self.conversations.max_messages == 0 {
            errors.push("conversations.maxMessages must be greater than 0.".into());
        }
        if self.conversations.max_age_secs > MAX_AGE_SECS {
            errors.push(format!(
                "conversations.maxAgeSecs must be at most {}.",
                MAX_AGE_SECS
            ));
        }
        if self.conversations.capacity == 0 {
            errors.push("conversations.capacity must be greater than 0.".into());
        }
        if self.conversations.sweep_interval_secs == 0 {
            errors.push("conversations.sweepIntervalSecs must be greater than 0.".into());
        }

        if self.server.rate_limit_per_minute == 0 {
            errors.push("server.rateLimitPerMinute must be greater than 0.".into());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Write the default config template to disk.
    pub fn write_default_template() -> anyhow::Result<PathBuf> {
        let path = Self::default_path();
        Self::write_template_to(&path)?;
        Ok(path)
    }

    /// Write the default config template to `path`.
    pub fn write_template_to(path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = serde_json::json!({
            "providers": {
                "openrouter": {
                    "apiKey": "sk-or-v1-YOUR_KEY_HERE",
                    "model": "openai/gpt-4o-mini"
                }
            },
            "chat": {
                "strategy": "rulesFirst"
            },
            "data": {
                "refreshSchedule": "0 0 */6 * * *"
            },
            "server": {
                "port": 3000
            }
        });

        std::fs::write(path, serde_json::to_string_pretty(&template)?)?;
        Ok(())
    }

    pub fn fallback_options(&self) -> FallbackOptions {
        FallbackOptions {
            timeout: Duration::from_secs(self.chat.fallback_timeout_secs),
            model: self.chat.model.clone().filter(|m| !m.is_empty()),
            max_tokens: self.chat.max_tokens,
            temperature: self.chat.temperature,
        }
    }

    pub fn conversation_limits(&self) -> ConversationLimits {
        ConversationLimits {
            max_messages: self.conversations.max_messages,
            max_age: bounded_secs(self.conversations.max_age_secs),
            capacity: self.conversations.capacity,
        }
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        bounded_secs(self.data.cache_ttl_secs)
    }
}

/// Upper bound for cache TTL and conversation age (30 days).
pub const MAX_AGE_SECS: u64 = 30 * 24 * 60 * 60;

/// Seconds as a chrono duration, clamped to `MAX_AGE_SECS`.
fn bounded_secs(secs: u64) -> chrono::Duration {
    chrono::Duration::seconds(secs.min(MAX_AGE_SECS) as i64)
}

// ── Provider Configuration ──────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProviderEntry {
    pub api_key: String,
    pub api_base: Option<String>,
    pub model: Option<String>,
}

impl ProviderEntry {
    /// A key that is set and is not the onboarding placeholder.
    pub fn has_real_key(&self) -> bool {
        let key = self.api_key.trim();
        !key.is_empty() && !key.contains("YOUR_")
    }

    /// The entry's model, else a small chat model the provider serves.
    pub fn model_or_default(&self, provider_name: &str) -> String {
        if let Some(model) = self.model.as_deref().filter(|m| !m.trim().is_empty()) {
            return model.to_string();
        }
        match provider_name {
            "openrouter" => "openai/gpt-4o-mini",
            "groq" => "llama-3.1-8b-instant",
            "gemini" => "gemini-1.5-flash",
            "deepseek" => "deepseek-chat",
            _ => "gpt-4o-mini",
        }
        .to_string()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub openrouter: Option<ProviderEntry>,
    pub openai: Option<ProviderEntry>,
    pub groq: Option<ProviderEntry>,
    pub gemini: Option<ProviderEntry>,
    pub deepseek: Option<ProviderEntry>,
    pub vllm: Option<ProviderEntry>,
}

impl ProvidersConfig {
    /// Find the first configured provider with a real API key.
    pub fn find_active(&self) -> Option<(&str, &ProviderEntry)> {
        let candidates: [(&str, &Option<ProviderEntry>); 6] = [
            ("openrouter", &self.openrouter),
            ("openai", &self.openai),
            ("groq", &self.groq),
            ("gemini", &self.gemini),
            ("deepseek", &self.deepseek),
            ("vllm", &self.vllm),
        ];

        candidates
            .into_iter()
            .find_map(|(name, entry)| entry.as_ref().filter(|e| e.has_real_key()).map(|e| (name, e)))
    }
}

// ── Chat Configuration ──────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChatConfig {
    pub strategy: ChatStrategy,
    pub fallback_timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Overrides the provider's model.
    pub model: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            strategy: ChatStrategy::RulesFirst,
            fallback_timeout_secs: 10,
            max_tokens: 150,
            temperature: 0.7,
            model: None,
        }
    }
}

// ── Data Configuration ──────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DataConfig {
    pub cache_ttl_secs: u64,
    /// Cron expression with a seconds field.
    pub refresh_schedule: String,
    pub startup_delay_secs: u64,
    /// Key required by `POST /api/update-data`. Unset means no check.
    pub update_key: Option<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 6 * 60 * 60,
            refresh_schedule: "0 0 */6 * * *".into(),
            startup_delay_secs: 30,
            update_key: None,
        }
    }
}

// ── Conversations Configuration ─────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConversationsConfig {
    pub max_messages: usize,
    pub max_age_secs: u64,
    pub capacity: usize,
    pub sweep_interval_secs: u64,
}

impl Default for ConversationsConfig {
    fn default() -> Self {
        Self {
            max_messages: 10,
            max_age_secs: 60 * 60,
            capacity: 1000,
            sweep_interval_secs: 5 * 60,
        }
    }
}

// ── Server Configuration ────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base URL baked into the embed widget.
    pub public_url: Option<String>,
    pub rate_limit_per_minute: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            public_url: None,
            rate_limit_per_minute: 50,
        }
    }
}

impl ServerConfig {
    /// The widget's API base, falling back to the local listener.
    pub fn public_url(&self) -> String {
        self.public_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| format!("http://localhost:{}", self.port))
            .trim_end_matches('/')
            .to_string()
    }
}
