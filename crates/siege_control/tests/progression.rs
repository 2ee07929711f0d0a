//! Progression regression tests.
//!
//! These run the full cycle loop with the autopilot against the shipped content
//! and check that early milestones land inside expected cycle windows. They
//! catch balance regressions from content edits.

use siege_control::{AutopilotController, CommandSource};
use siege_core::*;
use siege_world::{build_initial_state, load_content};

fn content_dir() -> String {
    let manifest = std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
    format!("{manifest}/../../content")
}

/// Autopilot loop; returns the final state and every event.
fn play(
    content: &GameContent,
    difficulty: Difficulty,
    cycles: usize,
) -> (GameState, Vec<EventEnvelope>) {
    let mut state = build_initial_state(content, difficulty);
    let mut autopilot = AutopilotController::default();
    let mut events = Vec::new();
    for _ in 0..cycles {
        for command in autopilot.generate_commands(&state, content) {
            let t = apply_command(&state, &command, content);
            state = t.state;
            events.extend(t.events);
        }
        let t = advance_cycle(&state, content);
        state = t.state;
        events.extend(t.events);
    }
    (state, events)
}

#[test]
fn first_tech_unlocks_within_ten_cycles() {
    let content = load_content(&content_dir()).unwrap();
    let (state, events) = play(&content, Difficulty::Recruit, 10);

    assert!(!state.game_over, "fortress fell early: {:?}", state.event_log);
    let first = events.iter().find_map(|e| match e.event {
        Event::ResearchCompleted { tech_id } => Some(tech_id),
        _ => None,
    });
    assert_eq!(first, Some(TechId::CropRotation));
}

#[test]
fn research_never_idles_while_techs_remain() {
    let content = load_content(&content_dir()).unwrap();
    let mut state = build_initial_state(&content, Difficulty::Recruit);
    let mut autopilot = AutopilotController::default();
    for _ in 0..10 {
        for command in autopilot.generate_commands(&state, &content) {
            state = apply_command(&state, &command, &content).state;
        }
        let locked_left = state.techs.values().any(|t| !t.unlocked);
        assert!(!locked_left || state.active_research_id.is_some());
        state = advance_cycle(&state, &content).state;
    }
}

#[test]
fn autopilot_runs_are_deterministic() {
    let content = load_content(&content_dir()).unwrap();
    let (a, events_a) = play(&content, Difficulty::Veteran, 25);
    let (b, events_b) = play(&content, Difficulty::Veteran, 25);
    assert_eq!(a, b);
    assert_eq!(events_a, events_b);
}

#[test]
fn harder_difficulty_faces_stronger_threat() {
    let content = load_content(&content_dir()).unwrap();
    let (recruit, _) = play(&content, Difficulty::Recruit, 5);
    let (legend, _) = play(&content, Difficulty::Legend, 5);
    assert!(legend.threat_strength > recruit.threat_strength);
}
