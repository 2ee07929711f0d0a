use anyhow::{bail, Context, Result};
use serde::Deserialize;
use siege_control::AutopilotConfig;
use siege_core::Difficulty;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub cycles: u64,
    #[serde(default = "default_metrics_every")]
    pub metrics_every: u64,
    /// One autopilot run per entry; the engine is deterministic, so repeats add nothing.
    pub difficulties: Vec<Difficulty>,
    #[serde(default = "default_content_dir")]
    pub content_dir: String,
    #[serde(default)]
    pub overrides: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub autopilot: AutopilotConfig,
}

fn default_metrics_every() -> u64 {
    1
}

fn default_content_dir() -> String {
    "./content".to_string()
}

pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading scenario file: {}", path.display()))?;
    let scenario: Scenario = serde_json::from_str(&json)
        .with_context(|| format!("parsing scenario file: {}", path.display()))?;
    if scenario.name.is_empty() {
        bail!("scenario 'name' must not be empty");
    }
    if scenario.cycles == 0 {
        bail!("scenario 'cycles' must be > 0");
    }
    if scenario.metrics_every == 0 {
        bail!("scenario 'metrics_every' must be > 0");
    }
    if scenario.difficulties.is_empty() {
        bail!("scenario 'difficulties' must list at least one difficulty");
    }
    Ok(scenario)
}
