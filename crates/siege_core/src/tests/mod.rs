use super::*;
use crate::test_fixtures::{base_content, base_state};

mod properties;

// --- Shared test helpers ------------------------------------------------

fn test_content() -> GameContent {
    base_content()
}

fn test_state(content: &GameContent) -> GameState {
    base_state(content)
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn unlock(state: &mut GameState, tech_id: TechId) {
    if let Some(tech) = state.techs.get_mut(&tech_id) {
        tech.unlocked = true;
    }
}

fn assigned(population: &Population) -> u32 {
    population.farmers + population.miners + population.soldiers + population.scientists
}

/// Advance `cycles` times, collecting every event.
fn run(
    state: &GameState,
    content: &GameContent,
    cycles: usize,
) -> (GameState, Vec<EventEnvelope>) {
    let mut state = state.clone();
    let mut events = Vec::new();
    for _ in 0..cycles {
        let t = advance_cycle(&state, content);
        state = t.state;
        events.extend(t.events);
    }
    (state, events)
}
