//! Content loading, initial state and persistence shared between siege_cli,
//! siege_daemon and siege_bench.

use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use siege_core::{Constants, Difficulty, GameContent, GameState, TechDef, TechEffect, TechId};
use std::collections::HashSet;
use std::path::Path;

mod metrics_writer;
mod save;

pub use metrics_writer::MetricsFileWriter;
pub use save::{SaveStore, SAVE_FILE_NAME};

#[derive(Deserialize)]
struct TechsFile {
    content_version: String,
    techs: Vec<TechDef>,
}

/// Validates the loaded catalog and constants, reporting the first authoring error.
///
/// Catches mistakes like a missing or duplicated tech, a multiplier that would
/// shrink output, or a capstone that no longer unlocks the ignition.
pub fn validate_content(content: &GameContent) -> Result<()> {
    let mut seen: HashSet<TechId> = HashSet::new();
    for tech in &content.techs {
        ensure!(seen.insert(tech.id), "tech '{}' is defined twice", tech.id);
        ensure!(
            tech.cost > 0.0,
            "tech '{}' has non-positive cost: {}",
            tech.id,
            tech.cost
        );
        ensure!(!tech.name.trim().is_empty(), "tech '{}' has an empty name", tech.id);
        match tech.effect {
            TechEffect::FoodYield { multiplier }
            | TechEffect::RepairYield { multiplier }
            | TechEffect::ResearchYield { multiplier }
            | TechEffect::Defense { multiplier } => {
                ensure!(
                    multiplier >= 1.0,
                    "tech '{}' multiplier {multiplier} would reduce output",
                    tech.id
                );
            }
            TechEffect::Ignition => {}
        }
    }
    for id in TechId::ALL {
        ensure!(seen.contains(id), "tech catalog is missing '{id}'");
    }
    ensure!(
        content
            .techs
            .iter()
            .any(|t| t.id == TechId::CoreStabilization && matches!(t.effect, TechEffect::Ignition)),
        "'{}' must carry the IGNITION effect",
        TechId::CoreStabilization
    );

    validate_constants(&content.constants)
}

fn validate_constants(c: &Constants) -> Result<()> {
    ensure!(c.max_population > 0.0, "max_population must be positive");
    ensure!(c.event_log_capacity > 0, "event_log_capacity must be positive");
    ensure!(c.final_stand_cycles > 0, "final_stand_cycles must be positive");
    ensure!(
        c.scout_band_low <= 1.0 && c.scout_band_high >= 1.0,
        "scout band {}..{} must bracket the true threat",
        c.scout_band_low,
        c.scout_band_high
    );
    let start = &c.start;
    ensure!(
        start.population > 0.0 && start.population <= c.max_population,
        "start population {} outside 1..={}",
        start.population,
        c.max_population
    );
    ensure!(
        start.allocation.farmers + start.allocation.miners + start.allocation.soldiers <= 100,
        "start allocation exceeds 100%"
    );
    ensure!(start.structure_health > 0.0, "start structure_health must be positive");
    Ok(())
}

pub fn load_content(content_dir: &str) -> Result<GameContent> {
    let dir = Path::new(content_dir);
    let constants: Constants = serde_json::from_str(
        &std::fs::read_to_string(dir.join("constants.json")).context("reading constants.json")?,
    )
    .context("parsing constants.json")?;
    let techs_file: TechsFile = serde_json::from_str(
        &std::fs::read_to_string(dir.join("techs.json")).context("reading techs.json")?,
    )
    .context("parsing techs.json")?;
    let content = GameContent {
        content_version: techs_file.content_version,
        techs: techs_file.techs,
        constants,
    };
    validate_content(&content).with_context(|| format!("validating content in {content_dir}"))?;
    tracing::info!(
        content_version = %content.content_version,
        techs = content.techs.len(),
        "content loaded"
    );
    Ok(content)
}

pub fn build_initial_state(content: &GameContent, difficulty: Difficulty) -> GameState {
    let state = siege_core::new_game(difficulty, content);
    tracing::info!(%difficulty, cycle = state.cycle, "new game");
    state
}

/// Write `run_info.json` describing a headless run.
pub fn write_run_info(
    dir: &Path,
    run_id: &str,
    difficulty: Difficulty,
    content_version: &str,
    args: serde_json::Value,
) -> Result<()> {
    let info = serde_json::json!({
        "run_id": run_id,
        "difficulty": difficulty,
        "start_time": chrono::Utc::now().to_rfc3339(),
        "content_version": content_version,
        "args": args,
    });
    let path = dir.join("run_info.json");
    let file =
        std::fs::File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(file, &info)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
