//! State-only forms of every operation, for callers that do not consume the
//! event feed. Each returns exactly `Transition::state` of its counterpart.

use crate::{Command, Constants, GameContent, GameState, TechId};

pub use crate::commands::{set_allocation, set_stance};

pub fn advance_cycle(state: &GameState, content: &GameContent) -> GameState {
    crate::advance_cycle(state, content).state
}

pub fn start_research(state: &GameState, tech_id: TechId, constants: &Constants) -> GameState {
    crate::start_research(state, tech_id, constants).state
}

pub fn banish_threat(state: &GameState, constants: &Constants) -> GameState {
    crate::banish_threat(state, constants).state
}

pub fn ignite_core(state: &GameState, constants: &Constants) -> GameState {
    crate::ignite_core(state, constants).state
}

pub fn apply_command(state: &GameState, command: &Command, content: &GameContent) -> GameState {
    crate::apply_command(state, command, content).state
}
