//! Terminal-state evaluator and the final-stand countdown.

use crate::{Constants, DefeatCause, Event, EventEnvelope, GameState, Notification, NotificationKind};

/// Loss checks first, then one tick of an active final stand.
///
/// A collapse in the same cycle the countdown would finish is still a loss.
pub(crate) fn evaluate_terminal(
    mut state: GameState,
    constants: &Constants,
    events: &mut Vec<EventEnvelope>,
) -> GameState {
    let cycle = state.cycle;
    let capacity = constants.event_log_capacity;

    if let Some(cause) = collapse(&mut state) {
        let message = match cause {
            DefeatCause::WallsFallen => "The walls have fallen.",
            DefeatCause::Extinction => "Everyone is dead.",
        };
        state.game_over = true;
        crate::push_log(&mut state.event_log, capacity, message.to_string());
        crate::notify(
            &mut state,
            NotificationKind::Defeat,
            "DEFEAT",
            message.to_string(),
        );
        events.push(crate::emit(&mut state.counters, cycle, Event::Defeat { cause }));
        tracing::info!(cycle, ?cause, "fortress lost");
        return state;
    }

    if !state.final_stand.active {
        return state;
    }

    state.final_stand.turns_remaining = state.final_stand.turns_remaining.saturating_sub(1);
    state.threat_strength += constants.final_stand_threat_escalation;
    let turns_remaining = state.final_stand.turns_remaining;

    if turns_remaining > 0 {
        crate::push_log(
            &mut state.event_log,
            capacity,
            format!("Core ignition: {turns_remaining} cycles remaining."),
        );
        events.push(crate::emit(
            &mut state.counters,
            cycle,
            Event::FinalStandTick { turns_remaining },
        ));
        return state;
    }

    state.victory = true;
    state.game_over = true;
    for line in [
        "The shadows burn away. The siege is broken.",
        "The core flares to life and floods the valley with fire.",
        "CORE IGNITION SUCCESSFUL!",
    ] {
        crate::push_log(&mut state.event_log, capacity, line.to_string());
    }
    crate::notify(
        &mut state,
        NotificationKind::Victory,
        "VICTORY",
        "The fortress endured the final stand.".to_string(),
    );
    events.push(crate::emit(&mut state.counters, cycle, Event::Victory));
    tracing::info!(cycle, "final stand survived");
    state
}

/// Clamp a collapsed wall or population to zero and report which failed.
/// Walls take precedence when both fail together.
fn collapse(state: &mut GameState) -> Option<DefeatCause> {
    let mut cause = None;
    if state.population.total <= 0.0 {
        state.population.total = 0.0;
        cause = Some(DefeatCause::Extinction);
    }
    if state.structure_health <= 0.0 {
        state.structure_health = 0.0;
        cause = Some(DefeatCause::WallsFallen);
    }
    cause
}

/// Why the game was lost, for game-over screens. `None` while running or
/// after a victory.
pub fn defeat_cause(state: &GameState) -> Option<DefeatCause> {
    if !state.game_over || state.victory {
        return None;
    }
    if state.structure_health <= 0.0 {
        Some(DefeatCause::WallsFallen)
    } else if state.population.total <= 0.0 {
        Some(DefeatCause::Extinction)
    } else {
        None
    }
}

/// Notifications raised by the cycle that was just resolved.
pub fn recent_notifications(state: &GameState) -> Vec<&Notification> {
    let resolved = state.cycle.saturating_sub(1);
    state
        .notifications
        .iter()
        .filter(|n| n.cycle == resolved)
        .collect()
}
