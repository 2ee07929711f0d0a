//! Type definitions for `siege_core`.
//!
//! All public types, structs, enums, and ID newtypes used by the simulation.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Snapshot layout version. Saves carrying any other value are treated as absent.
pub const SCHEMA_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// ID newtypes
// ---------------------------------------------------------------------------

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(EventId);
string_id!(NotificationId);

// ---------------------------------------------------------------------------
// Core enums
// ---------------------------------------------------------------------------

/// Rejected text at the boundary where closed enums are parsed from user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            /// Accepts the wire spelling case-insensitively, with `-` for `_`.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == normalized)
                    .ok_or_else(|| ParseEnumError {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }
    };
}

closed_enum!(
    /// The fixed research catalog.
    TechId, "tech" {
        CropRotation => "CROP_ROTATION",
        HeavyPlow => "HEAVY_PLOW",
        Masonry => "MASONRY",
        ObsidianWalls => "OBSIDIAN_WALLS",
        SteelWeapons => "STEEL_WEAPONS",
        IronArmor => "IRON_ARMOR",
        ArcaneStudies => "ARCANE_STUDIES",
        CoreStabilization => "CORE_STABILIZATION",
    }
);

closed_enum!(
    /// Fixed for the whole run; selects the threat growth rate.
    Difficulty, "difficulty" {
        Recruit => "RECRUIT",
        Veteran => "VETERAN",
        Commander => "COMMANDER",
        Legend => "LEGEND",
    }
);

closed_enum!(
    DefenseStance, "stance" {
        Standard => "STANDARD",
        Fortify => "FORTIFY",
        SallyForth => "SALLY_FORTH",
    }
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HeroStatus {
    Ready,
    Recovering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    ResearchComplete,
    Attack,
    Victory,
    Defeat,
    Generic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DefeatCause {
    WallsFallen,
    Extinction,
}

/// What an unlocked tech does. Multipliers of the same kind compound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TechEffect {
    FoodYield { multiplier: f64 },
    RepairYield { multiplier: f64 },
    ResearchYield { multiplier: f64 },
    Defense { multiplier: f64 },
    /// Gates the `IgniteCore` command.
    Ignition,
}

// ---------------------------------------------------------------------------
// State types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub meta: MetaState,
    /// Starts at 1; incremented once per resolved cycle.
    pub cycle: u64,
    pub stance: DefenseStance,
    pub resources: Resources,
    pub population: Population,
    /// Stored verbatim; the allocation resolver clamps what it reads.
    pub allocation: AllocationPolicy,
    pub active_research_id: Option<TechId>,
    pub research_progress: BTreeMap<TechId, f64>,
    pub techs: BTreeMap<TechId, Tech>,
    pub structure_health: f64,
    pub max_structure_health: f64,
    pub threat_strength: f64,
    /// Display text only; never read by the engine.
    pub scout_report: String,
    pub hero: Hero,
    pub difficulty: Difficulty,
    pub final_stand: FinalStand,
    /// Newest entry first, capped at `Constants::event_log_capacity`.
    pub event_log: VecDeque<String>,
    pub notifications: Vec<Notification>,
    pub game_over: bool,
    /// Implies `game_over`.
    pub victory: bool,
    pub counters: Counters,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaState {
    pub schema_version: u32,
    pub content_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub next_event_id: u64,
    pub next_notification_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    pub food: f64,
    pub shards: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Population {
    /// Continuous; fractional growth accrues here.
    pub total: f64,
    pub farmers: u32,
    pub miners: u32,
    pub soldiers: u32,
    pub scientists: u32,
}

/// Percentages of the population per role. Scientists take whatever is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationPolicy {
    pub farmers: u32,
    pub miners: u32,
    pub soldiers: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tech {
    pub name: String,
    pub description: String,
    pub cost: f64,
    pub effect: TechEffect,
    pub unlocked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hero {
    pub level: u32,
    pub xp: f64,
    /// Flat defense bonus while `Ready`.
    pub might: f64,
    pub status: HeroStatus,
    pub cooldown: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalStand {
    pub active: bool,
    pub turns_remaining: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub cycle: u64,
}

// ---------------------------------------------------------------------------
// Command types
// ---------------------------------------------------------------------------

/// The state-changing operations other than advancing the cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    SetAllocation { policy: AllocationPolicy },
    SetStance { stance: DefenseStance },
    StartResearch { tech_id: TechId },
    BanishThreat,
    IgniteCore,
}

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: EventId,
    pub cycle: u64,
    pub event: Event,
}

/// Coarse, presentation-facing events. Never read back by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    CycleAdvanced,
    AttackRepelled,
    WallsDamaged { damage: f64 },
    SallyCasualties { lost: u32 },
    HeroLeveledUp { level: u32 },
    ResearchStarted { tech_id: TechId },
    ResearchCompleted { tech_id: TechId },
    ThreatBanished { remaining: f64 },
    CoreIgnited,
    FinalStandTick { turns_remaining: u32 },
    Defeat { cause: DefeatCause },
    Victory,
}

/// Result of any operation: the successor snapshot plus what happened.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: GameState,
    pub events: Vec<EventEnvelope>,
}

impl Transition {
    pub(crate) fn unchanged(state: &GameState) -> Self {
        Self {
            state: state.clone(),
            events: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Content types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameContent {
    pub content_version: String,
    pub techs: Vec<TechDef>,
    pub constants: Constants,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechDef {
    pub id: TechId,
    pub name: String,
    pub description: String,
    pub cost: f64,
    pub effect: TechEffect,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyRates {
    pub recruit: f64,
    pub veteran: f64,
    pub commander: f64,
    pub legend: f64,
}

impl DifficultyRates {
    pub fn rate(&self, difficulty: Difficulty) -> f64 {
        match difficulty {
            Difficulty::Recruit => self.recruit,
            Difficulty::Veteran => self.veteran,
            Difficulty::Commander => self.commander,
            Difficulty::Legend => self.legend,
        }
    }
}

/// Values a fresh game starts from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StartConditions {
    pub food: f64,
    pub shards: f64,
    pub population: f64,
    pub allocation: AllocationPolicy,
    pub structure_health: f64,
    pub threat_strength: f64,
    pub hero_might: f64,
}

/// Balance numbers. Loaded from `constants.json`; `Default` carries the shipped values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constants {
    // Production
    pub food_yield_per_farmer: f64,
    pub repair_yield_per_miner: f64,
    pub research_yield_per_scientist: f64,
    pub shard_yield_per_miner: f64,
    pub food_consumption_per_person: f64,
    pub fortify_repair_multiplier: f64,

    // Combat
    pub defense_per_soldier: f64,
    pub fortify_defense_multiplier: f64,
    pub sally_defense_multiplier: f64,
    /// Fraction of soldiers lost each cycle spent sallying forth.
    pub sally_attrition_rate: f64,
    pub hero_xp_per_defense: f64,
    /// XP needed per hero level; the threshold is `level * hero_xp_per_level`.
    pub hero_xp_per_level: f64,
    pub hero_might_per_level: f64,

    // Threat
    pub threat_flat_growth_base: f64,
    pub threat_flat_growth_per_cycle: f64,
    pub threat_growth_rates: DifficultyRates,
    pub threat_mitigation_cap_fraction: f64,
    pub threat_mitigation_per_scientist: f64,
    pub scout_band_low: f64,
    pub scout_band_high: f64,

    // Population
    pub base_natality: f64,
    pub natality_per_surplus: f64,
    pub mortality: f64,
    pub starvation_decline: f64,
    pub max_population: f64,

    // Commands
    pub banish_cost_shards: f64,
    pub banish_threat_reduction: f64,
    pub ignition_cost_shards: f64,
    pub ignition_threat_spike: f64,
    pub final_stand_cycles: u32,
    pub final_stand_threat_escalation: f64,

    pub event_log_capacity: usize,
    pub start: StartConditions,
}

impl Default for Constants {
    fn default() -> Self {
        Self {
            food_yield_per_farmer: 5.0,
            repair_yield_per_miner: 5.0,
            research_yield_per_scientist: 5.0,
            shard_yield_per_miner: 0.5,
            food_consumption_per_person: 1.0,
            fortify_repair_multiplier: 0.5,
            defense_per_soldier: 2.0,
            fortify_defense_multiplier: 1.5,
            sally_defense_multiplier: 2.0,
            sally_attrition_rate: 0.05,
            hero_xp_per_defense: 10.0,
            hero_xp_per_level: 100.0,
            hero_might_per_level: 5.0,
            threat_flat_growth_base: 2.0,
            threat_flat_growth_per_cycle: 0.5,
            threat_growth_rates: DifficultyRates {
                recruit: 0.02,
                veteran: 0.05,
                commander: 0.08,
                legend: 0.12,
            },
            threat_mitigation_cap_fraction: 0.10,
            threat_mitigation_per_scientist: 0.005,
            scout_band_low: 0.9,
            scout_band_high: 1.2,
            base_natality: 0.15,
            natality_per_surplus: 0.05,
            mortality: 0.05,
            starvation_decline: 0.10,
            max_population: 1000.0,
            banish_cost_shards: 100.0,
            banish_threat_reduction: 2.0,
            ignition_cost_shards: 2000.0,
            ignition_threat_spike: 20.0,
            final_stand_cycles: 10,
            final_stand_threat_escalation: 5.0,
            event_log_capacity: 10,
            start: StartConditions {
                food: 100.0,
                shards: 0.0,
                population: 10.0,
                allocation: AllocationPolicy {
                    farmers: 50,
                    miners: 20,
                    soldiers: 30,
                },
                structure_health: 100.0,
                threat_strength: 5.0,
                hero_might: 10.0,
            },
        }
    }
}
