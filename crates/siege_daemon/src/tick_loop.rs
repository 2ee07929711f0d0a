use crate::state::{persist, EventTx, SharedSim, SimState};
use siege_control::CommandSource;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One autopilot turn: its commands, then a cycle. Returns every event.
pub fn autoplay_turn(sim: &mut SimState) -> Vec<siege_core::EventEnvelope> {
    let commands = sim.autopilot.generate_commands(&sim.game_state, &sim.content);
    let mut events = Vec::new();
    for command in &commands {
        let transition = siege_core::apply_command(&sim.game_state, command, &sim.content);
        events.extend(sim.commit(transition));
    }
    let transition = siege_core::advance_cycle(&sim.game_state, &sim.content);
    events.extend(sim.commit(transition));
    events
}

/// Let the autopilot play at a fixed pace until the game ends.
pub async fn run_autoplay(
    sim: SharedSim,
    event_tx: EventTx,
    paused: Arc<AtomicBool>,
    cycles_per_sec: f64,
) {
    let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / cycles_per_sec));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        if paused.load(Ordering::Relaxed) {
            continue;
        }
        let (events, over, pending) = {
            let mut guard = sim.lock();
            if guard.game_state.game_over {
                (Vec::new(), true, None)
            } else {
                let events = autoplay_turn(&mut guard);
                (events, guard.game_state.game_over, guard.pending_save())
            }
        };
        persist(pending).await;
        if !events.is_empty() {
            let _ = event_tx.send(events);
        }
        if over {
            tracing::info!("game over, autoplay stopped");
            break;
        }
    }
}
