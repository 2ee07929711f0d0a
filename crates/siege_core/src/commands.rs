//! Player commands other than advancing the cycle.
//!
//! Commands never fail: anything the fortress cannot afford or is not allowed
//! to do returns the input unchanged with no events. Once the game is over
//! every command is a no-op.

use crate::{
    AllocationPolicy, Command, Constants, DefenseStance, Event, GameContent, GameState, TechEffect,
    TechId, Transition,
};

/// Store a new allocation policy as given; the resolver clamps what it reads.
pub fn set_allocation(state: &GameState, policy: AllocationPolicy) -> GameState {
    let mut next = state.clone();
    if !state.game_over {
        next.allocation = policy;
    }
    next
}

pub fn set_stance(state: &GameState, stance: DefenseStance) -> GameState {
    let mut next = state.clone();
    if !state.game_over {
        next.stance = stance;
    }
    next
}

/// Select the single active research project. Progress on a replaced
/// selection is kept but stops accruing.
pub fn start_research(state: &GameState, tech_id: TechId, constants: &Constants) -> Transition {
    if state.game_over {
        return Transition::unchanged(state);
    }
    let Some(tech) = state.techs.get(&tech_id) else {
        return Transition::unchanged(state);
    };
    if tech.unlocked {
        return Transition::unchanged(state);
    }

    let mut next = state.clone();
    next.active_research_id = Some(tech_id);
    crate::push_log(
        &mut next.event_log,
        constants.event_log_capacity,
        format!("Started research on {}.", tech.name),
    );
    let event = crate::emit(
        &mut next.counters,
        next.cycle,
        Event::ResearchStarted { tech_id },
    );
    Transition {
        state: next,
        events: vec![event],
    }
}

pub fn banish_threat(state: &GameState, constants: &Constants) -> Transition {
    if state.game_over || state.resources.shards < constants.banish_cost_shards {
        return Transition::unchanged(state);
    }

    let mut next = state.clone();
    next.resources.shards -= constants.banish_cost_shards;
    next.threat_strength = (next.threat_strength - constants.banish_threat_reduction).max(0.0);
    crate::push_log(
        &mut next.event_log,
        constants.event_log_capacity,
        "Shards were spent to drive back the horde. Threat reduced.".to_string(),
    );
    let remaining = next.threat_strength;
    let event = crate::emit(
        &mut next.counters,
        next.cycle,
        Event::ThreatBanished { remaining },
    );
    Transition {
        state: next,
        events: vec![event],
    }
}

/// Whether the tech carrying the ignition effect has been researched.
fn ignition_unlocked(state: &GameState) -> bool {
    state
        .techs
        .values()
        .any(|tech| tech.unlocked && matches!(tech.effect, TechEffect::Ignition))
}

/// Start the final stand: pay the shard cost, begin the countdown and spike
/// the threat.
pub fn ignite_core(state: &GameState, constants: &Constants) -> Transition {
    if state.game_over
        || state.final_stand.active
        || !ignition_unlocked(state)
        || state.resources.shards < constants.ignition_cost_shards
    {
        return Transition::unchanged(state);
    }

    let mut next = state.clone();
    next.resources.shards -= constants.ignition_cost_shards;
    next.final_stand.active = true;
    next.final_stand.turns_remaining = constants.final_stand_cycles;
    next.threat_strength += constants.ignition_threat_spike;

    let capacity = constants.event_log_capacity;
    for line in [
        format!("SURVIVE FOR {} CYCLES.", constants.final_stand_cycles),
        "The core is charging. The horde howls in anger.".to_string(),
        "THE IGNITION PROTOCOL HAS BEGUN!".to_string(),
    ] {
        crate::push_log(&mut next.event_log, capacity, line);
    }
    let event = crate::emit(&mut next.counters, next.cycle, Event::CoreIgnited);
    tracing::info!(
        cycle = next.cycle,
        turns = constants.final_stand_cycles,
        "core ignited"
    );
    Transition {
        state: next,
        events: vec![event],
    }
}

/// Dispatch a [`Command`] value to its operation.
pub fn apply_command(state: &GameState, command: &Command, content: &GameContent) -> Transition {
    let constants = &content.constants;
    match command {
        Command::SetAllocation { policy } => Transition {
            state: set_allocation(state, *policy),
            events: Vec::new(),
        },
        Command::SetStance { stance } => Transition {
            state: set_stance(state, *stance),
            events: Vec::new(),
        },
        Command::StartResearch { tech_id } => start_research(state, *tech_id, constants),
        Command::BanishThreat => banish_threat(state, constants),
        Command::IgniteCore => ignite_core(state, constants),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{base_content, base_state};

    #[test]
    fn allocation_is_stored_verbatim() {
        let content = base_content();
        let state = base_state(&content);
        let policy = AllocationPolicy::new(80, 30, 20);
        let next = set_allocation(&state, policy);
        assert_eq!(next.allocation, policy);
        assert_eq!(next.population, state.population);
    }

    #[test]
    fn stance_is_replaced() {
        let content = base_content();
        let state = base_state(&content);
        let next = set_stance(&state, DefenseStance::Fortify);
        assert_eq!(next.stance, DefenseStance::Fortify);
        assert_eq!(state.stance, DefenseStance::Standard);
    }

    #[test]
    fn start_research_selects_and_logs() {
        let content = base_content();
        let state = base_state(&content);
        let t = start_research(&state, TechId::Masonry, &content.constants);
        assert_eq!(t.state.active_research_id, Some(TechId::Masonry));
        assert_eq!(t.state.event_log[0], "Started research on Masonry.");
        assert_eq!(t.events.len(), 1);
    }

    #[test]
    fn switching_research_keeps_old_progress() {
        let content = base_content();
        let mut state = base_state(&content);
        state.active_research_id = Some(TechId::Masonry);
        state.research_progress.insert(TechId::Masonry, 30.0);
        let t = start_research(&state, TechId::CropRotation, &content.constants);
        assert_eq!(t.state.active_research_id, Some(TechId::CropRotation));
        assert!((t.state.research_progress[&TechId::Masonry] - 30.0).abs() < 1e-9);
    }

    #[test]
    fn start_research_on_unlocked_tech_is_noop() {
        let content = base_content();
        let mut state = base_state(&content);
        state.techs.get_mut(&TechId::Masonry).unwrap().unlocked = true;
        let t = start_research(&state, TechId::Masonry, &content.constants);
        assert_eq!(t.state, state);
        assert!(t.events.is_empty());
    }

    #[test]
    fn banish_requires_shards() {
        let content = base_content();
        let mut state = base_state(&content);
        state.resources.shards = 50.0;
        let t = banish_threat(&state, &content.constants);
        assert_eq!(t.state, state);
        assert!(t.events.is_empty());

        state.resources.shards = 150.0;
        let t = banish_threat(&state, &content.constants);
        assert!((t.state.resources.shards - 50.0).abs() < 1e-9);
        assert!((t.state.threat_strength - 3.0).abs() < 1e-9);
    }

    #[test]
    fn banish_floors_threat_at_zero() {
        let content = base_content();
        let mut state = base_state(&content);
        state.resources.shards = 100.0;
        state.threat_strength = 1.5;
        let t = banish_threat(&state, &content.constants);
        assert!(t.state.threat_strength.abs() < 1e-9);
        assert!(matches!(
            t.events[0].event,
            Event::ThreatBanished { remaining } if remaining.abs() < 1e-9
        ));
    }

    #[test]
    fn ignite_starts_final_stand() {
        let content = base_content();
        let mut state = base_state(&content);
        state.techs.get_mut(&TechId::CoreStabilization).unwrap().unlocked = true;
        state.resources.shards = 2500.0;
        let t = ignite_core(&state, &content.constants);
        assert!((t.state.resources.shards - 500.0).abs() < 1e-9);
        assert!(t.state.final_stand.active);
        assert_eq!(t.state.final_stand.turns_remaining, 10);
        assert!((t.state.threat_strength - 25.0).abs() < 1e-9);
        assert_eq!(t.state.event_log[0], "THE IGNITION PROTOCOL HAS BEGUN!");
        assert!(matches!(t.events[0].event, Event::CoreIgnited));
    }

    #[test]
    fn ignite_noops_without_prerequisites() {
        let content = base_content();
        let mut state = base_state(&content);
        state.resources.shards = 2500.0;
        assert_eq!(ignite_core(&state, &content.constants).state, state);

        state.techs.get_mut(&TechId::CoreStabilization).unwrap().unlocked = true;
        state.resources.shards = 1999.0;
        assert_eq!(ignite_core(&state, &content.constants).state, state);

        state.resources.shards = 4000.0;
        state.final_stand.active = true;
        state.final_stand.turns_remaining = 4;
        assert_eq!(ignite_core(&state, &content.constants).state, state);
    }

    #[test]
    fn commands_are_inert_after_game_over() {
        let content = base_content();
        let mut state = base_state(&content);
        state.game_over = true;
        state.resources.shards = 500.0;
        for command in [
            Command::SetAllocation {
                policy: AllocationPolicy::new(10, 10, 10),
            },
            Command::SetStance {
                stance: DefenseStance::SallyForth,
            },
            Command::StartResearch {
                tech_id: TechId::Masonry,
            },
            Command::BanishThreat,
            Command::IgniteCore,
        ] {
            let t = apply_command(&state, &command, &content);
            assert_eq!(t.state, state, "{command:?}");
            assert!(t.events.is_empty());
        }
    }
}
