//! Where cache refreshes get their data from.
//!
//! The only source shipped is [`CuratedSource`], a hand-maintained table of
//! events, tier lists and champions. It does not scrape anything.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

use super::catalog::{seed_champions, Champion};
use crate::chat::{ContentArea, Event};

/// Result of one fetch.
#[derive(Debug, Clone, Default)]
pub struct FetchedData {
    pub events: Vec<Event>,
    pub meta_champions: BTreeMap<ContentArea, Vec<String>>,
    pub champions: Vec<Champion>,
}

#[async_trait]
pub trait DataSource: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    async fn fetch(&self, now: DateTime<Utc>) -> anyhow::Result<FetchedData>;
}

/// Curated placeholder data.
#[derive(Debug, Clone, Copy, Default)]
pub struct CuratedSource;

impl CuratedSource {
    pub fn events(now: DateTime<Utc>) -> Vec<Event> {
        vec![
            Event {
                name: "Champion Training".into(),
                kind: "Training Event".into(),
                end_date: now + Duration::days(7),
                tips: "Use XP boosts and farm campaign 12-3 Brutal".into(),
            },
            Event {
                name: "Artifact Enhancement".into(),
                kind: "Enhancement Event".into(),
                end_date: now + Duration::days(5),
                tips: "Upgrade gear to +12 or +16 for maximum points".into(),
            },
        ]
    }

    /// Tier lists flattened S, A, B per content area.
    pub fn meta_champions() -> BTreeMap<ContentArea, Vec<String>> {
        let tiers: [(ContentArea, &[&str]); 3] = [
            (
                ContentArea::Arena,
                &[
                    "Arbiter", "Hegemon", "Tormin", "Krisk", // S
                    "Siphi", "Duchess Lilitu", "Warlord", "Rotos", // A
                    "Kael", "Elhain", "Athel", "High Khatun", // B
                ],
            ),
            (
                ContentArea::ClanBoss,
                &[
                    "Geomancer", "Fayne", "Frozen Banshee", "Occult Brawler",
                    "Kael", "Steelskull", "Aothar", "Bulwark",
                    "Outlaw Monk", "Coffin Smasher", "Warmaiden",
                ],
            ),
            (
                ContentArea::Dungeons,
                &[
                    "Seer", "Kymar", "Renegade", "Alure",
                    "Coldheart", "Royal Guard", "Armiger", "Bellower",
                    "Kael", "Athel", "Apothecary", "Warmaiden",
                ],
            ),
        ];

        tiers
            .into_iter()
            .map(|(area, names)| (area, names.iter().map(|n| n.to_string()).collect()))
            .collect()
    }
}

#[async_trait]
impl DataSource for CuratedSource {
    fn name(&self) -> &str {
        "curated"
    }

    async fn fetch(&self, now: DateTime<Utc>) -> anyhow::Result<FetchedData> {
        Ok(FetchedData {
            events: Self::events(now),
            meta_champions: Self::meta_champions(),
            champions: seed_champions(),
        })
    }
}
