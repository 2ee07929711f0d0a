//! `siege_core`: deterministic fortress-siege turn engine.
//!
//! No IO, no clocks, no randomness. Every operation takes a snapshot by
//! reference and returns a brand-new one; the input is never mutated.

mod allocation;
mod combat;
mod commands;
mod engine;
pub mod metrics;
mod population;
mod production;
pub mod pure;
mod research;
mod start;
mod terminal;
mod threat;
mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod test_fixtures;

pub use allocation::role_counts;
pub use combat::defense_power;
pub use commands::{
    apply_command, banish_threat, ignite_core, set_allocation, set_stance, start_research,
};
pub use engine::advance_cycle;
pub use metrics::{compute_metrics, MetricsSnapshot};
pub use population::growth_delta;
pub use production::{calculate_production, Production};
pub use research::research_eta;
pub use start::new_game;
pub use terminal::{defeat_cause, recent_notifications};
pub use threat::scout_report;
pub use types::*;

pub(crate) fn emit(counters: &mut Counters, cycle: u64, event: Event) -> EventEnvelope {
    let id = EventId(format!("evt_{:06}", counters.next_event_id));
    counters.next_event_id += 1;
    EventEnvelope { id, cycle, event }
}

/// Prepend to the event log, dropping the oldest entries past `capacity`.
pub(crate) fn push_log(log: &mut std::collections::VecDeque<String>, capacity: usize, entry: String) {
    log.push_front(entry);
    log.truncate(capacity);
}

pub(crate) fn notify(state: &mut GameState, kind: NotificationKind, title: &str, message: String) {
    let prefix = match kind {
        NotificationKind::ResearchComplete => "res",
        NotificationKind::Attack => "att",
        NotificationKind::Victory => "win",
        NotificationKind::Defeat => "def",
        NotificationKind::Generic => "gen",
    };
    let id = NotificationId(format!(
        "{prefix}-{}-{}",
        state.cycle, state.counters.next_notification_id
    ));
    state.counters.next_notification_id += 1;
    state.notifications.push(Notification {
        id,
        kind,
        title: title.to_string(),
        message,
        cycle: state.cycle,
    });
}

#[cfg(test)]
mod tests;
