//! Integration test: research the full catalog → ignite the core → survive the final stand.

use siege_core::test_fixtures::{base_content, base_state};
use siege_core::*;

fn next_locked_tech(state: &GameState) -> Option<TechId> {
    TechId::ALL
        .iter()
        .copied()
        .find(|id| !state.techs[id].unlocked)
}

#[test]
fn full_campaign_reaches_victory() {
    let content = base_content();
    let mut state = base_state(&content);
    state.difficulty = Difficulty::Recruit;
    state.allocation = AllocationPolicy::new(40, 10, 20);
    state.population = role_counts(400.0, &state.allocation);
    state.resources.shards = 2000.0;

    let mut completed = Vec::new();
    for _ in 0..40 {
        if state.game_over {
            break;
        }
        if state.active_research_id.is_none() {
            if let Some(tech_id) = next_locked_tech(&state) {
                state = start_research(&state, tech_id, &content.constants).state;
            } else if !state.final_stand.active {
                let t = ignite_core(&state, &content.constants);
                assert!(matches!(t.events[0].event, Event::CoreIgnited));
                state = t.state;
            }
        }
        let t = advance_cycle(&state, &content);
        completed.extend(t.events.iter().filter_map(|e| match e.event {
            Event::ResearchCompleted { tech_id } => Some(tech_id),
            _ => None,
        }));
        state = t.state;
    }

    assert_eq!(completed, TechId::ALL.to_vec());
    assert!(state.game_over, "campaign should finish within 40 cycles");
    assert!(state.victory, "garrison should survive: {:?}", state.event_log);
    assert!(state.structure_health > 0.0);
    assert_eq!(defeat_cause(&state), None);
}

#[test]
fn snapshot_survives_json() {
    let content = base_content();
    let state = advance_cycle(&base_state(&content), &content).state;

    let json = serde_json::to_string(&state).unwrap();
    assert!(json.contains("\"stance\":\"STANDARD\""));
    assert!(json.contains("\"CORE_STABILIZATION\""));
    let restored: GameState = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, state);
}
