use std::collections::{BTreeMap, VecDeque};

use crate::{
    role_counts, Counters, DefenseStance, Difficulty, FinalStand, GameContent, GameState, Hero,
    HeroStatus, MetaState, Resources, Tech, SCHEMA_VERSION,
};

/// Fresh snapshot at cycle 1 built from the content's start conditions and
/// tech catalog.
pub fn new_game(difficulty: Difficulty, content: &GameContent) -> GameState {
    let start = &content.constants.start;

    let techs: BTreeMap<_, _> = content
        .techs
        .iter()
        .map(|def| {
            (
                def.id,
                Tech {
                    name: def.name.clone(),
                    description: def.description.clone(),
                    cost: def.cost,
                    effect: def.effect,
                    unlocked: false,
                },
            )
        })
        .collect();
    let research_progress = techs.keys().map(|id| (*id, 0.0)).collect();

    let mut event_log = VecDeque::new();
    for line in ["Welcome to the fortress.", "The siege has begun. Survive."] {
        crate::push_log(
            &mut event_log,
            content.constants.event_log_capacity,
            line.to_string(),
        );
    }

    GameState {
        meta: MetaState {
            schema_version: SCHEMA_VERSION,
            content_version: content.content_version.clone(),
        },
        cycle: 1,
        stance: DefenseStance::Standard,
        resources: Resources {
            food: start.food,
            shards: start.shards,
        },
        population: role_counts(start.population, &start.allocation),
        allocation: start.allocation,
        active_research_id: None,
        research_progress,
        techs,
        structure_health: start.structure_health,
        max_structure_health: start.structure_health,
        threat_strength: start.threat_strength,
        scout_report: "Scouts report minimal activity.".to_string(),
        hero: Hero {
            level: 1,
            xp: 0.0,
            might: start.hero_might,
            status: HeroStatus::Ready,
            cooldown: 0,
        },
        difficulty,
        final_stand: FinalStand {
            active: false,
            turns_remaining: 0,
        },
        event_log,
        notifications: Vec::new(),
        game_over: false,
        victory: false,
        counters: Counters {
            next_event_id: 0,
            next_notification_id: 0,
        },
    }
}
