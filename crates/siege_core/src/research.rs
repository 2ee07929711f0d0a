use crate::{calculate_production, Constants, Event, GameState, NotificationKind};

/// Route this cycle's research points into the active project.
///
/// Without an active project the points are discarded: scientists only work
/// toward an explicit directive.
pub(crate) fn advance_research(
    mut state: GameState,
    points: f64,
    constants: &Constants,
    events: &mut Vec<crate::EventEnvelope>,
) -> GameState {
    let Some(tech_id) = state.active_research_id else {
        return state;
    };
    let Some(tech) = state.techs.get(&tech_id) else {
        state.active_research_id = None;
        return state;
    };
    if tech.unlocked {
        // Unlocked progress is frozen; a stale selection from a save just clears.
        state.active_research_id = None;
        return state;
    }
    let cost = tech.cost;
    let name = tech.name.clone();

    let progress = state.research_progress.entry(tech_id).or_insert(0.0);
    *progress += points.max(0.0);
    if *progress < cost {
        return state;
    }

    if let Some(tech) = state.techs.get_mut(&tech_id) {
        tech.unlocked = true;
    }
    state.active_research_id = None;
    crate::push_log(
        &mut state.event_log,
        constants.event_log_capacity,
        format!("Research complete: {name}!"),
    );
    crate::notify(
        &mut state,
        NotificationKind::ResearchComplete,
        "RESEARCH COMPLETE",
        format!("{name} has been unlocked."),
    );
    events.push(crate::emit(
        &mut state.counters,
        state.cycle,
        Event::ResearchCompleted { tech_id },
    ));
    tracing::info!(cycle = state.cycle, tech = %tech_id, "research complete");
    state
}

/// Cycles until the active project completes at the current research rate.
/// `None` while idle or when nobody is researching.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn research_eta(state: &GameState, constants: &Constants) -> Option<u32> {
    let tech_id = state.active_research_id?;
    let tech = state.techs.get(&tech_id)?;
    let rate = calculate_production(state, constants).research;
    if rate <= 0.0 {
        return None;
    }
    let progress = state.research_progress.get(&tech_id).copied().unwrap_or(0.0);
    let remaining = (tech.cost - progress).max(0.0);
    Some((remaining / rate).ceil().max(1.0) as u32)
}
