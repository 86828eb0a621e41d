//! Champion catalog and query filters.

use serde::{Deserialize, Serialize};

/// Maximum number of champions a query returns.
pub const MAX_RESULTS: usize = 50;

/// A champion as listed by `/api/champions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Champion {
    pub name: String,
    pub faction: String,
    pub rarity: String,
    pub role: String,
    pub affinity: String,
    pub tier_rating: u8,
    pub recommended_sets: String,
    pub notes: String,
}

/// Filters accepted by the champions endpoint. Empty strings are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChampionQuery {
    pub search: Option<String>,
    pub faction: Option<String>,
    pub rarity: Option<String>,
    pub role: Option<String>,
}

/// A filter value that was actually provided.
fn provided(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl ChampionQuery {
    fn accepts(&self, champion: &Champion) -> bool {
        if let Some(search) = provided(&self.search) {
            if !champion
                .name
                .to_lowercase()
                .contains(&search.to_lowercase())
            {
                return false;
            }
        }
        if let Some(faction) = provided(&self.faction) {
            if !champion.faction.eq_ignore_ascii_case(faction) {
                return false;
            }
        }
        if let Some(rarity) = provided(&self.rarity) {
            if !champion.rarity.eq_ignore_ascii_case(rarity) {
                return false;
            }
        }
        if let Some(role) = provided(&self.role) {
            if !champion.role.eq_ignore_ascii_case(role) {
                return false;
            }
        }
        true
    }
}

/// Champions accepted by `query`, best tier first then by name, at most
/// [`MAX_RESULTS`].
pub fn filter(champions: &[Champion], query: &ChampionQuery) -> Vec<Champion> {
    let mut matched: Vec<Champion> = champions
        .iter()
        .filter(|c| query.accepts(c))
        .cloned()
        .collect();
    matched.sort_by(|a, b| {
        b.tier_rating
            .cmp(&a.tier_rating)
            .then_with(|| a.name.cmp(&b.name))
    });
    matched.truncate(MAX_RESULTS);
    matched
}

// ── Message Context ─────────────────────────────────────────────────

const FACTIONS: &[&str] = &[
    "High Elves",
    "Dark Elves",
    "Sacred Order",
    "Banner Lords",
    "Barbarians",
    "Lizardmen",
    "Skinwalkers",
    "Orcs",
    "Demonspawn",
    "Undead Hordes",
    "Knights Revenant",
    "Dwarves",
];

const ROLES: &[&str] = &["Attack", "Defense", "Support", "HP"];

/// Whether `needle` occurs in `haystack` as whole words. Both lower-case.
fn mentions(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// The first candidate `text` mentions, as written in the candidate list.
fn first_mentioned<'a>(text: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<String> {
    candidates
        .into_iter()
        .find(|c| mentions(text, &c.to_lowercase()))
        .map(String::from)
}

/// The query a chat message implies, if any.
///
/// A mentioned role takes precedence over a faction, which takes precedence
/// over a champion named in the catalog.
pub fn query_for_message(champions: &[Champion], message: &str) -> Option<ChampionQuery> {
    let text = message.to_lowercase();

    if let Some(role) = first_mentioned(&text, ROLES.iter().copied()) {
        return Some(ChampionQuery {
            role: Some(role),
            ..ChampionQuery::default()
        });
    }
    if let Some(faction) = first_mentioned(&text, FACTIONS.iter().copied()) {
        return Some(ChampionQuery {
            faction: Some(faction),
            ..ChampionQuery::default()
        });
    }
    first_mentioned(&text, champions.iter().map(|c| c.name.as_str())).map(|name| ChampionQuery {
        search: Some(name),
        ..ChampionQuery::default()
    })
}

fn champion(
    name: &str,
    faction: &str,
    rarity: &str,
    role: &str,
    affinity: &str,
    tier_rating: u8,
    recommended_sets: &str,
    notes: &str,
) -> Champion {
    Champion {
        name: name.into(),
        faction: faction.into(),
        rarity: rarity.into(),
        role: role.into(),
        affinity: affinity.into(),
        tier_rating,
        recommended_sets: recommended_sets.into(),
        notes: notes.into(),
    }
}

/// The curated seed catalog.
pub fn seed_champions() -> Vec<Champion> {
    vec![
        champion(
            "Arbiter",
            "High Elves",
            "Legendary",
            "Support",
            "Void",
            5,
            "Speed, Perception, Accuracy",
            "Best speed lead in game, team revive, turn meter boost",
        ),
        champion(
            "Krisk the Ageless",
            "Lizardmen",
            "Legendary",
            "Defense",
            "Void",
            5,
            "Stoneskin, Immunity, Speed",
            "Top tier support, ally protection, crowd control",
        ),
        champion(
            "Duchess Lilitu",
            "Demonspawn",
            "Legendary",
            "Support",
            "Void",
            5,
            "Speed, Immunity, Perception",
            "Perfect veil, team revive, block debuffs",
        ),
        champion(
            "Kael",
            "Dark Elves",
            "Rare",
            "Attack",
            "Magic",
            4,
            "Lifesteal, Speed, Cruel",
            "Best starter champion, poison damage, campaign farmer",
        ),
        champion(
            "Apothecary",
            "High Elves",
            "Rare",
            "Support",
            "Spirit",
            4,
            "Speed, Perception, Immortal",
            "Excellent speed booster, heal, turn meter manipulation",
        ),
        champion(
            "Scyl of the Drakes",
            "Barbarians",
            "Legendary",
            "Support",
            "Magic",
            5,
            "Speed, Immortal, Perception",
            "Login reward champion, revive, stun, heal",
        ),
        champion(
            "Coldheart",
            "Dark Elves",
            "Epic",
            "Attack",
            "Spirit",
            5,
            "Savage, Cruel, Speed",
            "Max HP damage, turn meter reduction, dungeon specialist",
        ),
        champion(
            "Bad-el-Kazar",
            "Undead Hordes",
            "Legendary",
            "HP",
            "Spirit",
            5,
            "Lifesteal, Speed, Immortal",
            "Poison damage, continuous heal, extend buffs",
        ),
        champion(
            "Tayrel",
            "High Elves",
            "Epic",
            "Defense",
            "Spirit",
            4,
            "Speed, Accuracy, Perception",
            "Decrease attack and defense, turn meter reduction",
        ),
        champion(
            "Miscreated Monster",
            "Demonspawn",
            "Epic",
            "HP",
            "Magic",
            4,
            "Shield, Speed, Immortal",
            "Shield generation, provoke, ally protection",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(search: Option<&str>, faction: Option<&str>, rarity: Option<&str>) -> ChampionQuery {
        ChampionQuery {
            search: search.map(String::from),
            faction: faction.map(String::from),
            rarity: rarity.map(String::from),
            role: None,
        }
    }

    #[test]
    fn test_unfiltered_order() {
        let all = filter(&seed_champions(), &ChampionQuery::default());
        assert_eq!(all.len(), 10);
        // Tier 5 first, alphabetical within a tier.
        assert_eq!(all[0].name, "Arbiter");
        assert_eq!(all[1].name, "Bad-el-Kazar");
        assert!(all.iter().skip(6).all(|c| c.tier_rating == 4));
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let hits = filter(&seed_champions(), &query(Some("KAEL"), None, None));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].faction, "Dark Elves");
    }

    #[test]
    fn test_faction_and_rarity() {
        let hits = filter(
            &seed_champions(),
            &query(None, Some("high elves"), Some("rare")),
        );
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Apothecary");
    }

    #[test]
    fn test_blank_filters_are_ignored() {
        let hits = filter(&seed_champions(), &query(Some("  "), Some(""), None));
        assert_eq!(hits.len(), 10);
    }

    #[test]
    fn test_role_filter() {
        let support = ChampionQuery {
            role: Some("support".into()),
            ..ChampionQuery::default()
        };
        let hits = filter(&seed_champions(), &support);
        assert_eq!(hits.len(), 4);
        assert!(hits.iter().all(|c| c.role == "Support"));
    }

    #[test]
    fn test_query_for_message() {
        let seed = seed_champions();

        let q = query_for_message(&seed, "Best DARK ELVES?").unwrap();
        assert_eq!(q.faction.as_deref(), Some("Dark Elves"));

        let q = query_for_message(&seed, "how do I gear coldheart").unwrap();
        assert_eq!(q.search.as_deref(), Some("Coldheart"));

        // Role wins over faction.
        let q = query_for_message(&seed, "high elves support picks").unwrap();
        assert_eq!(q.role.as_deref(), Some("Support"));
        assert!(q.faction.is_none());

        // Whole words only.
        assert!(query_for_message(&seed, "my php attacker").is_none());
        assert!(query_for_message(&seed, "what should I do today").is_none());
    }
}
