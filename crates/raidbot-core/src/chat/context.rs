//! Context snapshot handed to response templates.
//!
//! A snapshot is an immutable bundle of auxiliary facts (current events and
//! per-content-area meta champion lists). The classifier only ever reads it;
//! producing and refreshing snapshots is the job of [`crate::data`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

const SECS_PER_DAY: i64 = 86_400;

/// Content areas that carry a meta champion list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentArea {
    Arena,
    ClanBoss,
    Dungeons,
}

impl ContentArea {
    pub const ALL: [ContentArea; 3] = [Self::Arena, Self::ClanBoss, Self::Dungeons];

    /// Human-readable label used in rendered answers.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Arena => "Arena",
            Self::ClanBoss => "Clan Boss",
            Self::Dungeons => "Dungeons",
        }
    }
}

impl fmt::Display for ContentArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An in-game event shown to players.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub tips: String,
}

impl Event {
    /// Whole days left until the event ends, rounded up. Zero once ended.
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        let secs = (self.end_date - now).num_seconds();
        if secs <= 0 {
            0
        } else {
            (secs + SECS_PER_DAY - 1) / SECS_PER_DAY
        }
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.end_date > now
    }
}

/// Immutable facts available to response templates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContextSnapshot {
    pub events: Vec<Event>,
    /// Champion names per content area, best first.
    pub meta_champions: BTreeMap<ContentArea, Vec<String>>,
}

impl ContextSnapshot {
    pub fn new(events: Vec<Event>, meta_champions: BTreeMap<ContentArea, Vec<String>>) -> Self {
        Self {
            events,
            meta_champions,
        }
    }

    /// Up to `n` meta champions for `area`. Empty when the area is unknown.
    pub fn top(&self, area: ContentArea, n: usize) -> &[String] {
        match self.meta_champions.get(&area) {
            Some(names) => &names[..names.len().min(n)],
            None => &[],
        }
    }

    /// Events that have not ended yet, in snapshot order.
    pub fn active_events(&self, now: DateTime<Utc>) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(move |e| e.is_active(now))
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.meta_champions.values().all(Vec::is_empty)
    }
}
