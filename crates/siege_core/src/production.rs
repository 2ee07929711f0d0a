//! Per-role yields for one cycle, plus applying them to the stockpiles.

use crate::{Constants, DefenseStance, GameState, TechEffect};
use serde::Serialize;

/// One cycle's output. Food, repair and shards are whole units; research
/// points stay fractional.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Production {
    pub food: f64,
    pub repair: f64,
    pub shards: f64,
    pub research: f64,
}

/// Product of every unlocked multiplier `pick` accepts. `1.0` when none apply.
pub(crate) fn unlocked_multiplier(state: &GameState, pick: fn(&TechEffect) -> Option<f64>) -> f64 {
    state
        .techs
        .values()
        .filter(|tech| tech.unlocked)
        .filter_map(|tech| pick(&tech.effect))
        .product()
}

fn food_multiplier(effect: &TechEffect) -> Option<f64> {
    match effect {
        TechEffect::FoodYield { multiplier } => Some(*multiplier),
        _ => None,
    }
}

fn repair_multiplier(effect: &TechEffect) -> Option<f64> {
    match effect {
        TechEffect::RepairYield { multiplier } => Some(*multiplier),
        _ => None,
    }
}

fn research_multiplier(effect: &TechEffect) -> Option<f64> {
    match effect {
        TechEffect::ResearchYield { multiplier } => Some(*multiplier),
        _ => None,
    }
}

/// Yields from the current role counts, techs and stance. Also usable as a
/// preview of the next cycle since the engine leaves role counts in sync.
pub fn calculate_production(state: &GameState, constants: &Constants) -> Production {
    let pop = &state.population;

    let food = f64::from(pop.farmers)
        * constants.food_yield_per_farmer
        * unlocked_multiplier(state, food_multiplier);

    let mut repair = f64::from(pop.miners)
        * constants.repair_yield_per_miner
        * unlocked_multiplier(state, repair_multiplier);
    if state.stance == DefenseStance::Fortify {
        repair *= constants.fortify_repair_multiplier;
    }

    let shards = f64::from(pop.miners) * constants.shard_yield_per_miner;

    let research = f64::from(pop.scientists)
        * constants.research_yield_per_scientist
        * unlocked_multiplier(state, research_multiplier);

    Production {
        food: food.floor(),
        repair: repair.floor(),
        shards: shards.floor(),
        research,
    }
}

/// Credit yields, repair the structure, then feed the population.
pub(crate) fn apply_production(
    mut state: GameState,
    production: &Production,
    constants: &Constants,
) -> GameState {
    state.resources.food += production.food;
    state.resources.shards += production.shards;
    state.structure_health =
        (state.structure_health + production.repair).clamp(0.0, state.max_structure_health);

    let consumed = state.population.total * constants.food_consumption_per_person;
    state.resources.food = (state.resources.food - consumed).max(0.0);

    tracing::debug!(
        cycle = state.cycle,
        food = production.food,
        repair = production.repair,
        shards = production.shards,
        research = production.research,
        consumed,
        "production applied"
    );
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{base_content, base_state};
    use crate::TechId;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn base_yields_from_role_counts() {
        let content = base_content();
        let state = base_state(&content);
        let production = calculate_production(&state, &content.constants);
        // 5 farmers, 2 miners, 3 soldiers, 0 scientists
        assert!(close(production.food, 25.0));
        assert!(close(production.repair, 10.0));
        assert!(close(production.shards, 1.0));
        assert!(close(production.research, 0.0));
    }

    #[test]
    fn food_tiers_compound() {
        let content = base_content();
        let mut state = base_state(&content);
        state.population.farmers = 8;
        state.techs.get_mut(&TechId::CropRotation).unwrap().unlocked = true;
        let one_tier = calculate_production(&state, &content.constants).food;
        assert!(close(one_tier, 50.0)); // 8 * 5 * 1.25

        state.techs.get_mut(&TechId::HeavyPlow).unwrap().unlocked = true;
        let two_tiers = calculate_production(&state, &content.constants).food;
        assert!(close(two_tiers, 62.0)); // floor(8 * 5 * 1.5625) = floor(62.5)
    }

    #[test]
    fn fortify_halves_repair_and_floors() {
        let content = base_content();
        let mut state = base_state(&content);
        state.population.miners = 3;
        state.techs.get_mut(&TechId::Masonry).unwrap().unlocked = true;
        state.stance = DefenseStance::Fortify;
        let production = calculate_production(&state, &content.constants);
        // 3 * 5 * 1.25 * 0.5 = 9.375
        assert!(close(production.repair, 9.0));
    }

    #[test]
    fn sally_forth_does_not_touch_repair() {
        let content = base_content();
        let mut state = base_state(&content);
        state.stance = DefenseStance::SallyForth;
        let production = calculate_production(&state, &content.constants);
        assert!(close(production.repair, 10.0));
    }

    #[test]
    fn shards_are_floored_per_miner_pair() {
        let content = base_content();
        let mut state = base_state(&content);
        state.population.miners = 5;
        let production = calculate_production(&state, &content.constants);
        assert!(close(production.shards, 2.0));
    }

    #[test]
    fn research_stays_fractional_with_boost() {
        let content = base_content();
        let mut state = base_state(&content);
        state.population.scientists = 3;
        state.techs.get_mut(&TechId::ArcaneStudies).unwrap().unlocked = true;
        let production = calculate_production(&state, &content.constants);
        assert!(close(production.research, 18.75));
    }

    #[test]
    fn consumption_never_drives_food_negative() {
        let content = base_content();
        let mut state = base_state(&content);
        state.resources.food = 2.0;
        state.population.farmers = 0;
        let production = calculate_production(&state, &content.constants);
        let next = apply_production(state, &production, &content.constants);
        assert!(close(next.resources.food, 0.0));
    }

    #[test]
    fn repair_clamps_at_max_structure() {
        let content = base_content();
        let mut state = base_state(&content);
        state.structure_health = 95.0;
        let production = calculate_production(&state, &content.constants);
        let next = apply_production(state, &production, &content.constants);
        assert!(close(next.structure_health, 100.0));
    }
}
