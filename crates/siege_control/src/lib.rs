use serde::{Deserialize, Serialize};
use siege_core::{
    calculate_production, defense_power, AllocationPolicy, Command, DefenseStance, GameContent,
    GameState, TechEffect, TechId,
};

pub trait CommandSource {
    fn generate_commands(&mut self, state: &GameState, content: &GameContent) -> Vec<Command>;
}

/// Tunables for [`AutopilotController`]. Percentages are allocation shares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutopilotConfig {
    /// Research order; locked techs are picked first to last.
    pub research_priority: Vec<TechId>,
    pub base_farmers: u32,
    pub base_miners: u32,
    pub base_soldiers: u32,
    /// Extra farmer share while food production trails consumption.
    pub food_shift: u32,
    /// Extra soldier share while projected defense trails the next attack.
    pub defense_shift: u32,
    /// Miners are never trimmed below this share; shards fund the endgame.
    pub min_miners: u32,
    /// Fortify while structure is below this fraction of its maximum.
    pub fortify_below: f64,
    /// Banish only while holding this many multiples of the banish cost.
    pub banish_reserve: f64,
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        Self {
            research_priority: vec![
                TechId::CropRotation,
                TechId::Masonry,
                TechId::SteelWeapons,
                TechId::ArcaneStudies,
                TechId::HeavyPlow,
                TechId::IronArmor,
                TechId::ObsidianWalls,
                TechId::CoreStabilization,
            ],
            base_farmers: 40,
            base_miners: 20,
            base_soldiers: 25,
            food_shift: 10,
            defense_shift: 10,
            min_miners: 15,
            fortify_below: 0.5,
            banish_reserve: 3.0,
        }
    }
}

/// Plays the fortress:
/// 1. Keep a research project active, following the priority order.
/// 2. Rebalance roles toward farmers on a food deficit and soldiers when the
///    garrison cannot hold the next attack, keeping a minimum miner share.
/// 3. Fortify while the walls are under half strength.
/// 4. Spend spare shards on banishing until the capstone is researched.
/// 5. Ignite the core as soon as it is affordable.
#[derive(Debug, Clone, Default)]
pub struct AutopilotController {
    pub config: AutopilotConfig,
}

impl AutopilotController {
    pub fn new(config: AutopilotConfig) -> Self {
        Self { config }
    }

    fn next_research(&self, state: &GameState) -> Option<TechId> {
        self.config
            .research_priority
            .iter()
            .chain(TechId::ALL)
            .copied()
            .find(|id| state.techs.get(id).is_some_and(|t| !t.unlocked))
    }

    fn target_allocation(&self, state: &GameState, content: &GameContent) -> AllocationPolicy {
        let c = &self.config;
        let constants = &content.constants;
        let production = calculate_production(state, constants);
        let consumption = state.population.total * constants.food_consumption_per_person;
        let food_deficit = production.food < consumption;
        let defense_short = defense_power(state, constants) < state.threat_strength.floor();

        let farmers = (c.base_farmers + if food_deficit { c.food_shift } else { 0 }).min(100);
        let soldiers =
            (c.base_soldiers + if defense_short { c.defense_shift } else { 0 }).min(100 - farmers);
        let miners = c
            .base_miners
            .min(100 - farmers - soldiers)
            .max(c.min_miners.min(100 - farmers));
        // Keeping the miner floor may push the total past 100; soldiers give way.
        let soldiers = soldiers.min(100 - farmers - miners);
        AllocationPolicy::new(farmers, miners, soldiers)
    }
}

fn capstone_unlocked(state: &GameState) -> bool {
    state
        .techs
        .values()
        .any(|t| t.unlocked && matches!(t.effect, TechEffect::Ignition))
}

impl CommandSource for AutopilotController {
    fn generate_commands(&mut self, state: &GameState, content: &GameContent) -> Vec<Command> {
        if state.game_over {
            return Vec::new();
        }
        let constants = &content.constants;
        let mut commands = Vec::new();

        // Priority 1: research never idles.
        if state.active_research_id.is_none() {
            if let Some(tech_id) = self.next_research(state) {
                commands.push(Command::StartResearch { tech_id });
            }
        }

        // Priority 2: allocation.
        let policy = self.target_allocation(state, content);
        if policy != state.allocation {
            commands.push(Command::SetAllocation { policy });
        }

        // Priority 3: stance.
        let stance = if state.structure_health < state.max_structure_health * self.config.fortify_below
        {
            DefenseStance::Fortify
        } else {
            DefenseStance::Standard
        };
        if stance != state.stance {
            commands.push(Command::SetStance { stance });
        }

        // Priority 4/5: shards.
        let capstone = capstone_unlocked(state);
        if capstone {
            if !state.final_stand.active && state.resources.shards >= constants.ignition_cost_shards
            {
                commands.push(Command::IgniteCore);
            }
        } else if state.resources.shards >= constants.banish_cost_shards * self.config.banish_reserve
        {
            commands.push(Command::BanishThreat);
        }

        if !commands.is_empty() {
            tracing::debug!(cycle = state.cycle, count = commands.len(), "autopilot commands");
        }
        commands
    }
}
