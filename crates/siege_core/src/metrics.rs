//! Snapshot metrics computed from `GameState`.
//!
//! `compute_metrics(&GameState, &Constants) -> MetricsSnapshot` samples one
//! cycle for time-series analysis. No state mutation, no IO; writers live
//! with the callers.

use crate::{defense_power, GameState};
use serde::Serialize;

/// Current schema version; bump when fields are added, removed or reordered.
pub const METRICS_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub cycle: u64,
    pub metrics_version: u32,

    // Population
    pub population_total: f64,
    pub farmers: u32,
    pub miners: u32,
    pub soldiers: u32,
    pub scientists: u32,

    // Stockpiles
    pub food: f64,
    pub shards: f64,

    // Siege
    pub structure_health: f64,
    pub threat_strength: f64,
    /// Defense the garrison would field next cycle.
    pub defense_power: f64,

    // Progress
    pub techs_unlocked: u32,
    pub hero_level: u32,
    pub final_stand_turns_remaining: u32,

    pub game_over: bool,
    pub victory: bool,
}

#[allow(clippy::cast_possible_truncation)]
pub fn compute_metrics(state: &GameState, constants: &crate::Constants) -> MetricsSnapshot {
    let techs_unlocked = state.techs.values().filter(|t| t.unlocked).count() as u32;
    let pop = &state.population;

    MetricsSnapshot {
        cycle: state.cycle,
        metrics_version: METRICS_VERSION,
        population_total: pop.total,
        farmers: pop.farmers,
        miners: pop.miners,
        soldiers: pop.soldiers,
        scientists: pop.scientists,
        food: state.resources.food,
        shards: state.resources.shards,
        structure_health: state.structure_health,
        threat_strength: state.threat_strength,
        defense_power: defense_power(state, constants),
        techs_unlocked,
        hero_level: state.hero.level,
        final_stand_turns_remaining: if state.final_stand.active {
            state.final_stand.turns_remaining
        } else {
            0
        },
        game_over: state.game_over,
        victory: state.victory,
    }
}
