//! Invariants checked over random command/advance sequences.

use super::*;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Action {
    Advance,
    Command(Command),
}

fn stance() -> impl Strategy<Value = DefenseStance> {
    prop::sample::select(DefenseStance::ALL)
}

fn tech_id() -> impl Strategy<Value = TechId> {
    prop::sample::select(TechId::ALL)
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        4 => Just(Action::Advance),
        1 => (0u32..=120, 0u32..=120, 0u32..=120).prop_map(|(f, m, s)| {
            Action::Command(Command::SetAllocation {
                policy: AllocationPolicy::new(f, m, s),
            })
        }),
        1 => stance().prop_map(|stance| Action::Command(Command::SetStance { stance })),
        1 => tech_id().prop_map(|tech_id| Action::Command(Command::StartResearch { tech_id })),
        1 => Just(Action::Command(Command::BanishThreat)),
        1 => Just(Action::Command(Command::IgniteCore)),
    ]
}

fn starting_state() -> impl Strategy<Value = GameState> {
    (
        prop::sample::select(Difficulty::ALL),
        0.0f64..3000.0,
        0.0f64..200.0,
        1.0f64..600.0,
        any::<bool>(),
    )
        .prop_map(|(difficulty, shards, threat, population, capstone)| {
            let content = test_content();
            let mut state = new_game(difficulty, &content);
            state.resources.shards = shards;
            state.threat_strength = threat;
            state.population = role_counts(population, &state.allocation);
            if capstone {
                unlock(&mut state, TechId::CoreStabilization);
            }
            state
        })
}

fn check_bounds(state: &GameState, constants: &Constants) -> Result<(), TestCaseError> {
    prop_assert!(state.structure_health >= 0.0);
    prop_assert!(state.structure_health <= state.max_structure_health);
    prop_assert!(state.population.total >= 0.0);
    prop_assert!(state.population.total <= constants.max_population);
    prop_assert!(state.threat_strength >= 0.0);
    prop_assert!(state.resources.food >= 0.0);
    prop_assert!(state.resources.shards >= 0.0);
    prop_assert!(!state.victory || state.game_over);
    Ok(())
}

fn check_research(before: &GameState, after: &GameState) -> Result<(), TestCaseError> {
    for (id, tech) in &before.techs {
        if tech.unlocked {
            prop_assert!(after.techs[id].unlocked, "{id} was re-locked");
        } else {
            prop_assert!(after.research_progress[id] >= before.research_progress[id]);
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_invariants_hold_over_any_sequence(
        start in starting_state(),
        actions in prop::collection::vec(action(), 1..60),
    ) {
        let content = test_content();
        let constants = &content.constants;
        let mut state = start;

        for action in actions {
            let before = state.clone();
            let t = match &action {
                Action::Advance => advance_cycle(&state, &content),
                Action::Command(command) => apply_command(&state, command, &content),
            };
            state = t.state;

            check_bounds(&state, constants)?;
            check_research(&before, &state)?;

            if before.game_over {
                prop_assert_eq!(&state, &before);
                prop_assert!(t.events.is_empty());
                continue;
            }
            if let Action::Advance = action {
                prop_assert_eq!(state.cycle, before.cycle + 1);
                let headcount = f64::from(assigned(&state.population));
                prop_assert!((headcount - state.population.total.floor()).abs() < 1e-9);
            } else {
                prop_assert_eq!(state.cycle, before.cycle);
            }
        }
    }

    #[test]
    fn prop_role_counts_conserve_headcount(
        total in -10.0f64..2000.0,
        farmers in 0u32..=200,
        miners in 0u32..=200,
        soldiers in 0u32..=200,
    ) {
        let pop = role_counts(total, &AllocationPolicy::new(farmers, miners, soldiers));
        let expected = total.max(0.0).floor();
        prop_assert!((f64::from(assigned(&pop)) - expected).abs() < 1e-9);
    }
}
