use anyhow::{bail, Result};
use siege_core::Constants;
use std::collections::HashMap;

const VALID_KEYS: &[&str] = &[
    "food_yield_per_farmer",
    "repair_yield_per_miner",
    "research_yield_per_scientist",
    "shard_yield_per_miner",
    "food_consumption_per_person",
    "defense_per_soldier",
    "sally_attrition_rate",
    "threat_flat_growth_base",
    "threat_flat_growth_per_cycle",
    "max_population",
    "banish_cost_shards",
    "banish_threat_reduction",
    "ignition_cost_shards",
    "ignition_threat_spike",
    "final_stand_cycles",
    "final_stand_threat_escalation",
];

/// Patch balance constants by name. Every key must be known and typed right.
pub fn apply_overrides(
    constants: &mut Constants,
    overrides: &HashMap<String, serde_json::Value>,
) -> Result<()> {
    for (key, value) in overrides {
        let slot = match key.as_str() {
            "food_yield_per_farmer" => &mut constants.food_yield_per_farmer,
            "repair_yield_per_miner" => &mut constants.repair_yield_per_miner,
            "research_yield_per_scientist" => &mut constants.research_yield_per_scientist,
            "shard_yield_per_miner" => &mut constants.shard_yield_per_miner,
            "food_consumption_per_person" => &mut constants.food_consumption_per_person,
            "defense_per_soldier" => &mut constants.defense_per_soldier,
            "sally_attrition_rate" => &mut constants.sally_attrition_rate,
            "threat_flat_growth_base" => &mut constants.threat_flat_growth_base,
            "threat_flat_growth_per_cycle" => &mut constants.threat_flat_growth_per_cycle,
            "max_population" => &mut constants.max_population,
            "banish_cost_shards" => &mut constants.banish_cost_shards,
            "banish_threat_reduction" => &mut constants.banish_threat_reduction,
            "ignition_cost_shards" => &mut constants.ignition_cost_shards,
            "ignition_threat_spike" => &mut constants.ignition_threat_spike,
            "final_stand_threat_escalation" => &mut constants.final_stand_threat_escalation,
            "final_stand_cycles" => {
                constants.final_stand_cycles = as_u32(key, value)?;
                continue;
            }
            _ => bail!(
                "unknown override key '{key}'. Valid keys: {}",
                VALID_KEYS.join(", ")
            ),
        };
        *slot = as_f64(key, value)?;
    }
    Ok(())
}

fn as_f64(key: &str, value: &serde_json::Value) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| anyhow::anyhow!("override '{key}': expected a number, got {value}"))
}

fn as_u32(key: &str, value: &serde_json::Value) -> Result<u32> {
    let val = value.as_u64().ok_or_else(|| {
        anyhow::anyhow!("override '{key}': expected a positive integer, got {value}")
    })?;
    u32::try_from(val)
        .map_err(|_| anyhow::anyhow!("override '{key}': value {val} exceeds u32 range"))
}
