//! The canonical rule table.
//!
//! Each rule pairs a keyword set with a response template. Keywords are
//! compiled once into a case-insensitive, word-bounded regex, so `hi` never
//! fires inside `history` and `cb` never fires inside `archive`. Table order
//! is priority: the first matching rule wins.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::fmt::Write as _;
use std::sync::LazyLock;

use super::context::{ContentArea, ContextSnapshot};

/// Renders a rule's answer from the context snapshot and the current instant.
pub type Responder = fn(&ContextSnapshot, DateTime<Utc>) -> String;

/// How many meta champions a category answer lists.
const META_LIST_LEN: usize = 4;

/// How many events the events answer lists.
const EVENT_LIST_LEN: usize = 3;

/// Answer returned when nothing matched and no fallback produced text.
pub const DEFAULT_MENU: &str = "I am here to help with RAID Shadow Legends! I can assist with:\n\n\
**CHAMPIONS** - Builds, ratings, and strategies\n\
**TEAM BUILDING** - Compositions for any content\n\
**ARENA** - PvP strategies and team setups\n\
**CLAN BOSS** - Damage optimization\n\
**DUNGEONS** - Farming strategies\n\
**GEAR** - Artifact recommendations\n\
**EVENTS** - Current events and fusions\n\
**PROGRESSION** - Next steps guidance\n\
**RESOURCES** - Energy, gems, silver management\n\n\
Just ask me about any specific champion, strategy, or content you need help with!";

/// Stable identifier of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleId {
    Greeting,
    Starter,
    Kael,
    Athel,
    Apothecary,
    Warmaiden,
    Spirithost,
    TierList,
    Arena,
    ClanBoss,
    Dungeons,
    Gear,
    TeamBuilding,
    Events,
    Progression,
    Masteries,
    Leveling,
    Resources,
}

impl RuleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::Starter => "starter",
            Self::Kael => "kael",
            Self::Athel => "athel",
            Self::Apothecary => "apothecary",
            Self::Warmaiden => "warmaiden",
            Self::Spirithost => "spirithost",
            Self::TierList => "tier_list",
            Self::Arena => "arena",
            Self::ClanBoss => "clan_boss",
            Self::Dungeons => "dungeons",
            Self::Gear => "gear",
            Self::TeamBuilding => "team_building",
            Self::Events => "events",
            Self::Progression => "progression",
            Self::Masteries => "masteries",
            Self::Leveling => "leveling",
            Self::Resources => "resources",
        }
    }
}

/// A rule as declared in the table, before compilation.
struct RuleDef {
    id: RuleId,
    keywords: &'static [&'static str],
    respond: Responder,
}

/// A compiled rule.
pub struct Rule {
    pub id: RuleId,
    pub keywords: &'static [&'static str],
    matcher: Regex,
    respond: Responder,
}

impl Rule {
    /// Whether `text` contains one of the rule's keywords as a whole word.
    pub fn matches(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }

    pub fn respond(&self, ctx: &ContextSnapshot, now: DateTime<Utc>) -> String {
        (self.respond)(ctx, now)
    }
}

/// Build `(?i)\b(?:kw1|kw2|...)\b`. Spaces inside a phrase match any run of
/// whitespace.
fn keyword_pattern(keywords: &[&str]) -> String {
    let alternatives = keywords
        .iter()
        .map(|kw| {
            kw.split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect::<Vec<_>>()
        .join("|");
    format!(r"(?i)\b(?:{})\b", alternatives)
}

/// The compiled table, built on first use and shared read-only afterwards.
pub static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    RULE_DEFS
        .iter()
        .map(|def| Rule {
            id: def.id,
            keywords: def.keywords,
            // Every alternative is regex::escape'd, so the pattern is always valid.
            matcher: Regex::new(&keyword_pattern(def.keywords))
                .expect("escaped keyword pattern must compile"),
            respond: def.respond,
        })
        .collect()
});

/// All rules in priority order.
pub fn rules() -> &'static [Rule] {
    &RULES
}

// ── Table ───────────────────────────────────────────────────────────

// Specific champion rules come before the category rules, so
// "is Kael good in arena?" answers with the Kael guide.
const RULE_DEFS: &[RuleDef] = &[
    RuleDef {
        id: RuleId::Greeting,
        keywords: &["hello", "hi", "hey", "greetings"],
        respond: greeting,
    },
    RuleDef {
        id: RuleId::Starter,
        keywords: &[
            "starter",
            "beginning",
            "beginner",
            "new player",
            "which champion",
            "best champion to start",
        ],
        respond: starter,
    },
    RuleDef {
        id: RuleId::Kael,
        keywords: &["kael"],
        respond: kael,
    },
    RuleDef {
        id: RuleId::Athel,
        keywords: &["athel"],
        respond: athel,
    },
    RuleDef {
        id: RuleId::Apothecary,
        keywords: &["apothecary", "apo"],
        respond: apothecary,
    },
    RuleDef {
        id: RuleId::Warmaiden,
        keywords: &["warmaiden"],
        respond: warmaiden,
    },
    RuleDef {
        id: RuleId::Spirithost,
        keywords: &["spirithost"],
        respond: spirithost,
    },
    RuleDef {
        id: RuleId::TierList,
        keywords: &["tier list", "tierlist", "meta", "best champions"],
        respond: tier_list,
    },
    RuleDef {
        id: RuleId::Arena,
        keywords: &["arena", "pvp", "classic arena", "tag team"],
        respond: arena,
    },
    RuleDef {
        id: RuleId::ClanBoss,
        keywords: &["clan boss", "cb", "unkillable", "counter attack"],
        respond: clan_boss,
    },
    RuleDef {
        id: RuleId::Dungeons,
        keywords: &[
            "dungeon",
            "dungeons",
            "dragon",
            "ice golem",
            "fire knight",
            "spider",
            "minotaur",
        ],
        respond: dungeons,
    },
    RuleDef {
        id: RuleId::Gear,
        keywords: &["gear", "artifact", "artifacts", "set", "sets", "stats", "main stat"],
        respond: gear,
    },
    RuleDef {
        id: RuleId::TeamBuilding,
        keywords: &["team", "teams", "composition", "synergy", "who should i use"],
        respond: team_building,
    },
    RuleDef {
        id: RuleId::Events,
        keywords: &[
            "event",
            "events",
            "fusion",
            "fusions",
            "tournament",
            "tournaments",
            "fragment",
            "fragments",
        ],
        respond: events,
    },
    RuleDef {
        id: RuleId::Progression,
        keywords: &["progress", "progression", "stuck", "next step", "what should i do"],
        respond: progression,
    },
    RuleDef {
        id: RuleId::Masteries,
        keywords: &["masteries", "mastery", "great hall", "books", "skill books"],
        respond: masteries,
    },
    RuleDef {
        id: RuleId::Leveling,
        keywords: &["food", "level", "leveling", "rank up", "6 star"],
        respond: leveling,
    },
    RuleDef {
        id: RuleId::Resources,
        keywords: &["energy", "gem", "gems", "silver", "resource", "resources"],
        respond: resources,
    },
];

// ── Responders ──────────────────────────────────────────────────────

/// Append a "current meta" line for `area` when the snapshot has one.
fn push_meta_line(out: &mut String, ctx: &ContextSnapshot, area: ContentArea) {
    let top = ctx.top(area, META_LIST_LEN);
    if !top.is_empty() {
        let _ = write!(out, "\n\n**Current {} meta:** {}", area.label(), top.join(", "));
    }
}

fn greeting(_: &ContextSnapshot, _: DateTime<Utc>) -> String {
    "Hello! I am your RAID Shadow Legends AI assistant. I can help with champions, team builds, \
     strategies, events, and more. What would you like to know?"
        .into()
}

fn starter(_: &ContextSnapshot, _: DateTime<Utc>) -> String {
    "For starters, I recommend:\n\n\
     **KAEL (Dark Elves)** - Best overall starter\n\
     - Excellent farmer and poisoner\n\
     - Great for Clan Boss and Campaign\n\
     - Build: Lifesteal + Speed sets\n\n\
     **ATHEL (Sacred Order)** - Strong damage dealer\n\
     **GALEK (Orcs)** - AOE specialist\n\
     **ELHAIN (High Elves)** - Speed and damage\n\n\
     Kael is generally the best choice for new players!"
        .into()
}

fn kael(_: &ContextSnapshot, _: DateTime<Utc>) -> String {
    "**KAEL BUILD GUIDE:**\n\n\
     **Early Game:** Lifesteal + Speed\n\
     - Chest: ATK%\n\
     - Gloves: Crit Rate\n\
     - Boots: Speed\n\
     - Substats: Speed, Crit Rate, ATK%\n\n\
     **Late Game:** Speed + Cruel/Savage\n\
     - Focus on 100% Crit Rate\n\
     - High Speed (170+ for CB)\n\
     - Accuracy for debuffs\n\n\
     **Best for:** Campaign farming, Clan Boss, Arena nuker"
        .into()
}

fn athel(_: &ContextSnapshot, _: DateTime<Utc>) -> String {
    "**ATHEL BUILD GUIDE:**\n\n\
     **Sets:** Lifesteal + Speed (early) -> Savage + Speed (late)\n\
     - Chest: ATK%\n\
     - Gloves: Crit Rate\n\
     - Boots: Speed\n\n\
     **Great for:** Campaign, Arena, Dungeons\n\
     **Skills:** Strong single target and AOE damage"
        .into()
}

fn apothecary(_: &ContextSnapshot, _: DateTime<Utc>) -> String {
    "**APOTHECARY BUILD:**\n\n\
     **Sets:** Speed + Immortal/Divine Life\n\
     - Chest: HP%\n\
     - Gloves: HP%\n\
     - Boots: Speed\n\
     - Focus: Speed (220+), HP, DEF\n\n\
     **Role:** Speed booster, healer, turn meter manipulation\n\
     **Best for:** All content - amazing support champion!"
        .into()
}

fn warmaiden(_: &ContextSnapshot, _: DateTime<Utc>) -> String {
    "**WARMAIDEN BUILD:**\n\n\
     **Sets:** Speed + Accuracy\n\
     - Chest: HP%\n\
     - Gloves: HP%\n\
     - Boots: Speed\n\
     - Focus: Speed (170+), Accuracy (200+), HP\n\n\
     **Role:** AOE Decrease DEF debuffer\n\
     **Best for:** Arena, Dungeons, Clan Boss\n\
     **Skill Priority:** A3 (60% DEF down) is her main value"
        .into()
}

fn spirithost(_: &ContextSnapshot, _: DateTime<Utc>) -> String {
    "**SPIRITHOST BUILD:**\n\n\
     **Sets:** Speed + Immortal\n\
     - Chest: HP%\n\
     - Gloves: HP%\n\
     - Boots: Speed\n\
     - Focus: Speed (180+), HP, Resistance\n\n\
     **Role:** ATK buffer, cleanser, reviver\n\
     **Best for:** Arena, support teams\n\
     **Key Skill:** A3 gives team ATK up and cleanses debuffs"
        .into()
}

fn tier_list(ctx: &ContextSnapshot, _: DateTime<Utc>) -> String {
    let mut out = String::from("**CURRENT META:**");
    let mut listed = false;
    for area in ContentArea::ALL {
        let top = ctx.top(area, META_LIST_LEN);
        if !top.is_empty() {
            let _ = write!(out, "\n\n**{}:** {}", area.label(), top.join(", "));
            listed = true;
        }
    }
    if !listed {
        out.push_str(
            "\n\nSome long-standing top picks are Arbiter, Krisk, Duchess Lilitu, \
             Bad-el-Kazar, and Scyl of the Drakes.",
        );
    }
    out.push_str("\n\nTell me which content you are building for and I can narrow it down!");
    out
}

fn arena(ctx: &ContextSnapshot, _: DateTime<Utc>) -> String {
    let mut out = String::from(
        "**ARENA STRATEGY:**\n\n\
         **Classic Team Setup:**\n\
         1. **Speed Lead** - High Khatun, Gorgorab, Arbiter\n\
         2. **Buffer** - Spirithost (ATK up), Seeker (TM boost)\n\
         3. **Debuffer** - Warmaiden (DEF down), Decrease DEF\n\
         4. **Nuker** - Kael, Elhain, Sinesha\n\n\
         **Key Tips:**\n\
         - Speed is everything! Aim for 200+ speed on your lead\n\
         - Use speed sets on everyone\n\
         - Focus on going first\n\
         - Target teams you can beat, not the highest power",
    );
    push_meta_line(&mut out, ctx, ContentArea::Arena);
    out
}

fn clan_boss(ctx: &ContextSnapshot, _: DateTime<Utc>) -> String {
    let mut out = String::from(
        "**CLAN BOSS GUIDE:**\n\n\
         **Essential Debuffs:**\n\
         - Decrease ATK (most important!)\n\
         - Poison/HP Burn damage\n\
         - Weaken/Decrease DEF\n\n\
         **Good Early CB Champions:**\n\
         - Kael (poison)\n\
         - Warmaiden (DEF down)\n\
         - Coffin Smasher (DEF down + weaken)\n\
         - Apothecary (speed/heal)\n\n\
         **Advanced Strategies:**\n\
         - Unkillable teams (Maneater + Painkeeper)\n\
         - Counter-attack teams (Valkyrie, Skullcrusher)\n\
         - Speed tuning is crucial!",
    );
    push_meta_line(&mut out, ctx, ContentArea::ClanBoss);
    out
}

fn dungeons(ctx: &ContextSnapshot, _: DateTime<Utc>) -> String {
    let mut out = String::from(
        "**DUNGEON GUIDE:**\n\n\
         **Dragons Lair:** Focus on poisoners and healers\n\
         **Ice Golem:** Bring decrease ATK and block debuffs\n\
         **Fire Knight:** Multi-hit champions and turn meter reduction\n\
         **Spiders Den:** AOE damage and HP burn\n\
         **Minotaur:** High damage dealers\n\n\
         **Universal Team:** Kael, Apothecary, Warmaiden, healer, +1\n\n\
         Start with Dragon 20 for the best gear!",
    );
    push_meta_line(&mut out, ctx, ContentArea::Dungeons);
    out
}

fn gear(_: &ContextSnapshot, _: DateTime<Utc>) -> String {
    "**GEAR PRIORITY:**\n\n\
     **Main Stats Priority:**\n\
     - Chest: HP%/ATK%/DEF% (role dependent)\n\
     - Gloves: Crit Rate > Crit DMG > HP%/ATK%\n\
     - Boots: Speed > HP%/ATK%\n\n\
     **Best Sets:**\n\
     - **Speed:** Universal, always useful\n\
     - **Lifesteal:** Early game survival\n\
     - **Cruel/Savage:** Late game damage\n\
     - **Accuracy:** For debuffers\n\n\
     **Substat Priority:** Speed > Crit Rate > HP%/ATK% > Accuracy"
        .into()
}

fn team_building(_: &ContextSnapshot, _: DateTime<Utc>) -> String {
    "**TEAM BUILDING BASICS:**\n\n\
     **Balanced Team Structure:**\n\
     1. **Damage Dealer** - Kael, Athel, Elhain\n\
     2. **Support/Healer** - Apothecary, Warpriest\n\
     3. **Debuffer** - Warmaiden, Spirithost\n\
     4. **Tank/Utility** - High HP champion\n\
     5. **Flex spot** - Based on content needs\n\n\
     **Key Synergies:**\n\
     - Speed boost + Damage dealers\n\
     - DEF down + Nukers\n\
     - Healers + Damage over time\n\n\
     Tell me what content you are focusing on for specific recommendations!"
        .into()
}

fn events(ctx: &ContextSnapshot, now: DateTime<Utc>) -> String {
    let mut out = String::from("**EVENTS & FUSIONS:**");

    let active: Vec<_> = ctx.active_events(now).take(EVENT_LIST_LEN).collect();
    if !active.is_empty() {
        out.push_str("\n\n**Active Events:**");
        for ev in active {
            let days = ev.days_remaining(now);
            let unit = if days == 1 { "day" } else { "days" };
            let _ = write!(out, "\n- **{}** ({}) - {} {} left", ev.name, ev.kind, days, unit);
            if !ev.tips.is_empty() {
                let _ = write!(out, "\n  Tip: {}", ev.tips);
            }
        }
    }

    out.push_str(
        "\n\n**Event Tips:**\n\
         - Plan your energy usage\n\
         - Do not chase every event\n\
         - Focus on events that give good rewards\n\
         - Fragment champions are usually worth it\n\n\
         **Fusion Strategy:**\n\
         - Save rare champions for fusions\n\
         - Keep food champions ready\n\
         - Plan your resources 2-3 events ahead",
    );
    out
}

fn progression(_: &ContextSnapshot, _: DateTime<Utc>) -> String {
    "**PROGRESSION GUIDE:**\n\n\
     **Early Game Priority:**\n\
     1. Get Kael to 6-star level 60\n\
     2. Farm Campaign 12-3 Brutal for XP\n\
     3. Complete Arbiter missions\n\
     4. Build basic Arena team\n\
     5. Start Dragon dungeon\n\n\
     **Mid Game:**\n\
     1. Build Clan Boss team\n\
     2. Progress in all dungeons\n\
     3. Expand champion roster\n\
     4. Focus on Great Hall upgrades\n\n\
     **Late Game:**\n\
     1. Optimize speed tuning\n\
     2. Build specialized teams\n\
     3. Push higher dungeon levels\n\
     4. Focus on Doom Tower"
        .into()
}

fn masteries(_: &ContextSnapshot, _: DateTime<Utc>) -> String {
    "**MASTERIES & SKILL BOOKS:**\n\n\
     **Mastery Priority:**\n\
     1. Offense tree for damage dealers\n\
     2. Defense tree for tanks/supports\n\
     3. Support tree for healers\n\n\
     **Skill Book Priority:**\n\
     1. Legendary champions first\n\
     2. Key skills (cooldown reduction)\n\
     3. Champions you use everywhere\n\n\
     **Great Hall:** Focus on Speed, ATK, HP, DEF bonuses for your main factions first."
        .into()
}

fn leveling(_: &ContextSnapshot, _: DateTime<Utc>) -> String {
    "**LEVELING & RANKING UP:**\n\n\
     **6-Star Priority:**\n\
     1. Your farmer (usually Kael)\n\
     2. Main damage dealer\n\
     3. Key support (Apothecary)\n\
     4. Arena team members\n\n\
     **Food Strategy:**\n\
     - Use 1-star champions as food\n\
     - Level 2-star champions to make 3-star food\n\
     - Farm Campaign 12-3 Brutal for XP\n\
     - Use XP boosts efficiently\n\n\
     **Never use rare+ champions as food unless you have duplicates!**"
        .into()
}

fn resources(_: &ContextSnapshot, _: DateTime<Utc>) -> String {
    "**RESOURCE MANAGEMENT:**\n\n\
     **Energy Usage:**\n\
     - Campaign farming for XP\n\
     - Dragon dungeon for gear\n\
     - Events and tournaments\n\n\
     **Gem Priority:**\n\
     1. Energy refills (early game)\n\
     2. Masteries for key champions\n\
     3. Vault space\n\
     4. Market refreshes (late game)\n\n\
     **Silver Spending:**\n\
     - Upgrading gear (main priority)\n\
     - Ascending champions\n\
     - Great Hall upgrades"
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(id: RuleId) -> &'static Rule {
        rules().iter().find(|r| r.id == id).unwrap()
    }

    #[test]
    fn test_every_rule_compiles_once() {
        assert_eq!(rules().len(), RULE_DEFS.len());
        assert_eq!(rules()[0].id, RuleId::Greeting);
    }

    #[test]
    fn test_rule_ids_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for rule in rules() {
            assert!(seen.insert(rule.id.as_str()), "duplicate rule {}", rule.id.as_str());
        }
    }

    #[test]
    fn test_keyword_pattern_shape() {
        assert_eq!(
            keyword_pattern(&["hi", "clan boss"]),
            r"(?i)\b(?:hi|clan\s+boss)\b"
        );
    }

    #[test]
    fn test_word_boundaries() {
        let greeting = find(RuleId::Greeting);
        assert!(greeting.matches("hi there"));
        assert!(greeting.matches("HEY!"));
        assert!(!greeting.matches("history"));
        assert!(!greeting.matches("archive"));

        let cb = find(RuleId::ClanBoss);
        assert!(cb.matches("cb team"));
        assert!(cb.matches("clan   boss tips"));
        assert!(!cb.matches("archive"));
    }

    #[test]
    fn test_static_responders_ignore_context() {
        let now = Utc::now();
        let empty = ContextSnapshot::default();
        assert!(find(RuleId::Kael).respond(&empty, now).starts_with("**KAEL BUILD GUIDE:**"));
        assert!(find(RuleId::Gear).respond(&empty, now).contains("Substat Priority"));
    }
}
