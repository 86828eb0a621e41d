//! Intent classification and response composition.
//!
//! [`Classifier`] picks the first rule in [`rules::RULES`] whose keywords
//! occur in the message as whole words and renders that rule's template
//! against a [`ContextSnapshot`]. When no rule matches, an optional
//! [`Fallback`] gets a chance; failing that, the default menu is returned.
//!
//! The synchronous entry points ([`Classifier::select`],
//! [`Classifier::compose`]) are pure: the same message, snapshot and instant
//! always produce the same text.

pub mod context;
pub mod fallback;
pub mod rules;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use context::{ContentArea, ContextSnapshot, Event};
pub use fallback::{Fallback, FallbackOptions, LlmFallback};
pub use rules::{RuleId, DEFAULT_MENU};

/// Order in which rules and fallback are consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChatStrategy {
    /// Rules first; the fallback only runs when no rule matched.
    #[default]
    RulesFirst,
    /// Fallback first; rules answer when the fallback has nothing.
    FallbackFirst,
}

/// Where an answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Rule(RuleId),
    Fallback,
    Menu,
}

impl ReplySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rule(id) => id.as_str(),
            Self::Fallback => "fallback",
            Self::Menu => "menu",
        }
    }
}

/// A composed answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
}

impl Reply {
    fn menu() -> Self {
        Self {
            text: DEFAULT_MENU.to_string(),
            source: ReplySource::Menu,
        }
    }
}

/// Rule-table classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier {
    strategy: ChatStrategy,
}

impl Classifier {
    pub fn new(strategy: ChatStrategy) -> Self {
        Self { strategy }
    }

    /// First rule whose keywords occur in `input`, if any.
    pub fn select(input: &str) -> Option<RuleId> {
        let normalized = input.trim().to_lowercase();
        rules::rules()
            .iter()
            .find(|rule| rule.matches(&normalized))
            .map(|rule| rule.id)
    }

    /// Render the first matching rule, or `None` when nothing matched.
    pub fn compose(input: &str, ctx: &ContextSnapshot, now: DateTime<Utc>) -> Option<Reply> {
        let normalized = input.trim().to_lowercase();
        rules::rules()
            .iter()
            .find(|rule| rule.matches(&normalized))
            .map(|rule| Reply {
                text: rule.respond(ctx, now),
                source: ReplySource::Rule(rule.id),
            })
    }

    /// Rule answer or default menu, without consulting any fallback.
    pub fn respond_offline(input: &str, ctx: &ContextSnapshot, now: DateTime<Utc>) -> Reply {
        Self::compose(input, ctx, now).unwrap_or_else(Reply::menu)
    }

    /// Full pipeline: rules, fallback and default menu in strategy order.
    pub async fn respond(
        &self,
        input: &str,
        ctx: &ContextSnapshot,
        fallback: Option<&dyn Fallback>,
        now: DateTime<Utc>,
    ) -> Reply {
        let reply = match (self.strategy, fallback) {
            (ChatStrategy::FallbackFirst, Some(fb)) => match generate(fb, input).await {
                Some(text) => Reply {
                    text,
                    source: ReplySource::Fallback,
                },
                None => Self::respond_offline(input, ctx, now),
            },
            (ChatStrategy::RulesFirst, Some(fb)) => match Self::compose(input, ctx, now) {
                Some(reply) => reply,
                None => generate(fb, input)
                    .await
                    .map(|text| Reply {
                        text,
                        source: ReplySource::Fallback,
                    })
                    .unwrap_or_else(Reply::menu),
            },
            (_, None) => Self::respond_offline(input, ctx, now),
        };

        debug!(source = reply.source.as_str(), "Composed reply");
        reply
    }
}

/// Ask the fallback; blank answers count as no answer.
async fn generate(fallback: &dyn Fallback, input: &str) -> Option<String> {
    fallback
        .generate(input)
        .await
        .filter(|text| !text.trim().is_empty())
}

/// Classify `input` and return the answer text.
pub async fn classify(
    input: &str,
    ctx: &ContextSnapshot,
    fallback: Option<&dyn Fallback>,
) -> String {
    Classifier::default()
        .respond(input, ctx, fallback, Utc::now())
        .await
        .text
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        answer: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl Counting {
        fn new(answer: Option<&'static str>) -> Self {
            Self {
                answer,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Fallback for Counting {
        async fn generate(&self, _text: &str) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.map(str::to_string)
        }
    }

    #[test]
    fn test_select_first_match_wins() {
        assert_eq!(Classifier::select("Hello, which champion?"), Some(RuleId::Greeting));
        assert_eq!(Classifier::select("cb team"), Some(RuleId::ClanBoss));
        assert_eq!(Classifier::select("is Kael good in arena?"), Some(RuleId::Kael));
        assert_eq!(Classifier::select("archive"), None);
    }

    #[test]
    fn test_select_is_case_and_whitespace_insensitive() {
        assert_eq!(Classifier::select("   ARENA   "), Some(RuleId::Arena));
        assert_eq!(Classifier::select("Ice\tGolem help"), Some(RuleId::Dungeons));
    }

    #[tokio::test]
    async fn test_rules_first_skips_fallback_on_match() {
        let fb = Counting::new(Some("generated"));
        let reply = Classifier::new(ChatStrategy::RulesFirst)
            .respond("gear advice", &ContextSnapshot::default(), Some(&fb), Utc::now())
            .await;

        assert_eq!(reply.source, ReplySource::Rule(RuleId::Gear));
        assert_eq!(fb.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rules_first_uses_fallback_on_miss() {
        let fb = Counting::new(Some("Try the Doom Tower rotation."));
        let reply = Classifier::new(ChatStrategy::RulesFirst)
            .respond("doom tower?", &ContextSnapshot::default(), Some(&fb), Utc::now())
            .await;

        assert_eq!(reply.source, ReplySource::Fallback);
        assert_eq!(reply.text, "Try the Doom Tower rotation.");
    }

    #[tokio::test]
    async fn test_blank_fallback_means_menu() {
        let fb = Counting::new(Some("  \n"));
        let reply = Classifier::new(ChatStrategy::RulesFirst)
            .respond("doom tower?", &ContextSnapshot::default(), Some(&fb), Utc::now())
            .await;

        assert_eq!(reply.source, ReplySource::Menu);
        assert_eq!(reply.text, DEFAULT_MENU);
    }

    #[tokio::test]
    async fn test_fallback_first_without_answer_uses_rules() {
        let fb = Counting::new(None);
        let reply = Classifier::new(ChatStrategy::FallbackFirst)
            .respond("dragon 20 team", &ContextSnapshot::default(), Some(&fb), Utc::now())
            .await;

        assert_eq!(reply.source, ReplySource::Rule(RuleId::Dungeons));
        assert_eq!(fb.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_classify_helper() {
        let text = classify("", &ContextSnapshot::default(), None).await;
        assert_eq!(text, DEFAULT_MENU);
    }
}
