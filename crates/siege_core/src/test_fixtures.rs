//! Shared test fixtures for `siege_core` and downstream crates.
//!
//! `base_content()` carries the shipped catalog and default constants so tests
//! need no files. `base_state()` is a fresh Veteran game built from it.

use crate::{Constants, Difficulty, GameContent, GameState, TechDef, TechEffect, TechId};

fn tech(id: TechId, name: &str, description: &str, cost: f64, effect: TechEffect) -> TechDef {
    TechDef {
        id,
        name: name.to_string(),
        description: description.to_string(),
        cost,
        effect,
    }
}

pub fn base_content() -> GameContent {
    GameContent {
        content_version: "test".to_string(),
        techs: vec![
            tech(
                TechId::CropRotation,
                "Crop Rotation",
                "+25% food (tier 1)",
                50.0,
                TechEffect::FoodYield { multiplier: 1.25 },
            ),
            tech(
                TechId::HeavyPlow,
                "Heavy Plow",
                "+25% food (tier 2)",
                120.0,
                TechEffect::FoodYield { multiplier: 1.25 },
            ),
            tech(
                TechId::Masonry,
                "Masonry",
                "+25% repair (tier 1)",
                80.0,
                TechEffect::RepairYield { multiplier: 1.25 },
            ),
            tech(
                TechId::ObsidianWalls,
                "Obsidian Walls",
                "+50% repair (tier 2)",
                150.0,
                TechEffect::RepairYield { multiplier: 1.5 },
            ),
            tech(
                TechId::SteelWeapons,
                "Steel Weapons",
                "+25% soldier defense",
                100.0,
                TechEffect::Defense { multiplier: 1.25 },
            ),
            tech(
                TechId::IronArmor,
                "Iron Armor",
                "+20% soldier defense",
                120.0,
                TechEffect::Defense { multiplier: 1.2 },
            ),
            tech(
                TechId::ArcaneStudies,
                "Arcane Studies",
                "+25% research",
                150.0,
                TechEffect::ResearchYield { multiplier: 1.25 },
            ),
            tech(
                TechId::CoreStabilization,
                "Core Stabilization",
                "Allows igniting the core and starting the final stand",
                500.0,
                TechEffect::Ignition,
            ),
        ],
        constants: Constants::default(),
    }
}

pub fn base_state(content: &GameContent) -> GameState {
    crate::new_game(Difficulty::Veteran, content)
}
