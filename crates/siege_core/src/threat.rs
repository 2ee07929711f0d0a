//! Threat escalator.

use crate::{Constants, GameState};

/// Display band around the true threat; `low` is floored and `high` ceiled.
pub fn scout_report(threat_strength: f64, constants: &Constants) -> String {
    let low = (threat_strength * constants.scout_band_low).floor();
    let high = (threat_strength * constants.scout_band_high).ceil();
    format!("Scouts report {low}-{high} hostiles gathering.")
}

/// Additive growth, then difficulty-scaled compounding, then a small capped
/// damping from scientists.
pub(crate) fn escalate_threat(mut state: GameState, constants: &Constants) -> GameState {
    let flat = constants.threat_flat_growth_base
        + state.cycle as f64 * constants.threat_flat_growth_per_cycle;
    let rate = constants.threat_growth_rates.rate(state.difficulty);
    let grown = (state.threat_strength + flat) * (1.0 + rate);
    let mitigation = (grown * constants.threat_mitigation_cap_fraction)
        .min(f64::from(state.population.scientists) * constants.threat_mitigation_per_scientist);

    state.threat_strength = (grown - mitigation).max(0.0);
    state.scout_report = scout_report(state.threat_strength, constants);
    crate::push_log(
        &mut state.event_log,
        constants.event_log_capacity,
        state.scout_report.clone(),
    );
    tracing::debug!(
        cycle = state.cycle,
        flat,
        rate,
        mitigation,
        threat = state.threat_strength,
        "threat escalated"
    );
    state
}
