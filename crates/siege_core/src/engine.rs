use crate::allocation::assign_roles;
use crate::combat::{recover_hero, resolve_combat};
use crate::population::grow_population;
use crate::production::{apply_production, calculate_production};
use crate::research::advance_research;
use crate::terminal::evaluate_terminal;
use crate::threat::escalate_threat;
use crate::{Event, GameContent, GameState, Transition};

/// Resolve one cycle.
///
/// Order of operations:
/// 1. Assign roles from the allocation policy.
/// 2. Produce food, repair, shards and research; feed the population.
/// 3. Route research points into the active project.
/// 4. Resolve the attack against the garrison.
/// 5. Escalate the threat for the next cycle.
/// 6. Grow or shrink the population from this cycle's food.
/// 7. Tick the hero cooldown.
/// 8. Evaluate loss conditions and the final-stand countdown.
/// 9. Re-assign roles against the new total and increment the cycle.
///
/// A finished game is returned unchanged with no events.
pub fn advance_cycle(state: &GameState, content: &GameContent) -> Transition {
    if state.game_over {
        return Transition::unchanged(state);
    }
    let constants = &content.constants;
    let mut events = Vec::new();

    let mut next = state.clone();
    let cycle = next.cycle;
    events.push(crate::emit(&mut next.counters, cycle, Event::CycleAdvanced));

    let next = assign_roles(next);
    let production = calculate_production(&next, constants);
    let next = apply_production(next, &production, constants);
    let next = advance_research(next, production.research, constants, &mut events);
    let next = resolve_combat(next, constants, &mut events);
    let next = escalate_threat(next, constants);
    let next = grow_population(next, production.food, constants);
    let next = recover_hero(next, constants);
    let next = evaluate_terminal(next, constants, &mut events);

    let mut next = assign_roles(next);
    next.cycle += 1;

    tracing::debug!(
        cycle = next.cycle,
        population = next.population.total,
        structure = next.structure_health,
        threat = next.threat_strength,
        events = events.len(),
        "cycle resolved"
    );
    Transition {
        state: next,
        events,
    }
}
