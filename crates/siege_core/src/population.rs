//! Population dynamics driven by this cycle's food balance.

use crate::{Constants, GameState};

/// Births minus deaths for one cycle.
///
/// Natality rises with food surplus per head; mortality is flat. A starving
/// stockpile (`food_stock <= 0`) turns any positive result into a fixed decline.
pub fn growth_delta(total: f64, food_produced: f64, food_stock: f64, constants: &Constants) -> f64 {
    let surplus = food_produced - total * constants.food_consumption_per_person;
    let surplus_per_capita = surplus / total.max(1.0);
    let natality = constants.base_natality + surplus_per_capita.max(0.0) * constants.natality_per_surplus;
    let delta = surplus * natality - total * constants.mortality;
    if food_stock <= 0.0 && delta > 0.0 {
        return -total * constants.starvation_decline;
    }
    delta
}

pub(crate) fn grow_population(
    mut state: GameState,
    food_produced: f64,
    constants: &Constants,
) -> GameState {
    let total = state.population.total;
    let delta = growth_delta(total, food_produced, state.resources.food, constants);
    state.population.total = (total + delta).clamp(0.0, constants.max_population);

    let capacity = constants.event_log_capacity;
    if delta > 0.1 {
        crate::push_log(
            &mut state.event_log,
            capacity,
            format!("Population grew by {delta:.1}."),
        );
    } else if delta < -0.1 {
        crate::push_log(
            &mut state.event_log,
            capacity,
            format!("Population declined by {:.1}.", delta.abs()),
        );
    }
    tracing::debug!(
        cycle = state.cycle,
        delta,
        total = state.population.total,
        "population updated"
    );
    state
}
