use serde::Serialize;
use siege_core::{DefeatCause, Difficulty, MetricsSnapshot};
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Victory,
    Defeat,
    /// Cycle budget ran out with the siege still going.
    Holding,
}

#[derive(Debug, Serialize)]
pub struct RunResult {
    pub run_schema_version: u32,
    pub run_status: String,
    pub run_id: String,
    pub git_sha: String,
    pub git_dirty: bool,
    pub difficulty: Difficulty,
    pub scenario_name: String,
    pub scenario_params: serde_json::Value,
    pub cycle_start: u64,
    pub cycle_end: u64,
    pub total_cycles: u64,
    pub wall_time_ms: u64,
    pub outcome: Outcome,
    pub defeat_cause: Option<DefeatCause>,
    pub first_research_cycle: Option<u64>,
    pub ignition_cycle: Option<u64>,
    pub summary_metrics: Option<SummaryMetrics>,
    pub metrics_path: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryMetrics {
    pub population_total: f64,
    pub soldiers: u32,
    pub scientists: u32,
    pub food: f64,
    pub shards: f64,
    pub structure_health: f64,
    pub threat_strength: f64,
    pub defense_power: f64,
    pub techs_unlocked: u32,
    pub hero_level: u32,
}

impl SummaryMetrics {
    pub fn from_snapshot(snapshot: &MetricsSnapshot) -> Self {
        Self {
            population_total: snapshot.population_total,
            soldiers: snapshot.soldiers,
            scientists: snapshot.scientists,
            food: snapshot.food,
            shards: snapshot.shards,
            structure_health: snapshot.structure_health,
            threat_strength: snapshot.threat_strength,
            defense_power: snapshot.defense_power,
            techs_unlocked: snapshot.techs_unlocked,
            hero_level: snapshot.hero_level,
        }
    }
}

impl RunResult {
    /// Write JSON atomically: write to `.tmp` then rename.
    pub fn write_atomic(&self, path: &Path) -> anyhow::Result<()> {
        let tmp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self)?;
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

pub fn outcome_of(snapshot: &MetricsSnapshot) -> Outcome {
    match (snapshot.game_over, snapshot.victory) {
        (true, true) => Outcome::Victory,
        (true, false) => Outcome::Defeat,
        (false, _) => Outcome::Holding,
    }
}

pub fn git_sha() -> String {
    env!("GIT_SHA").to_string()
}

pub fn git_dirty() -> bool {
    env!("GIT_DIRTY") == "true"
}
