//! raidbot-core: Core library for the raidbot RAID Shadow Legends assistant.
//!
//! - [`chat`] - Intent classification and response composition
//! - [`data`] - Champion catalog, events, tier lists and the TTL cache
//! - [`provider`] - LLM provider trait and OpenAI-compatible implementation
//! - [`session`] - Bounded in-memory conversation history
//! - [`config`] - Typed configuration loading from JSON
//! - [`cron`] - Scheduled data refresh
//! - [`sweeper`] - Periodic eviction of idle conversations
//! - [`gateway`] - axum HTTP service and embeddable widget
//!
//! # Quick Start
//!
//! ```no_run
//! use raidbot_core::chat::Classifier;
//! use raidbot_core::data::{ContextProvider, SharedData};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let data = SharedData::curated(chrono::Duration::hours(6));
//! data.refresh(chrono::Utc::now()).await?;
//!
//! let snapshot = data.snapshot().await;
//! let reply = Classifier::respond_offline("best arena team?", &snapshot, chrono::Utc::now());
//! println!("{}", reply.text);
//! # Ok(())
//! # }
//! ```

pub mod chat;
pub mod config;
pub mod cron;
pub mod data;
pub mod error;
pub mod gateway;
pub mod provider;
pub mod session;
pub mod sweeper;
