//! Allocation resolver: percentage policy to integer head-counts.

use crate::{AllocationPolicy, GameState, Population};

impl AllocationPolicy {
    pub const fn new(farmers: u32, miners: u32, soldiers: u32) -> Self {
        Self {
            farmers,
            miners,
            soldiers,
        }
    }

    /// Implicit scientist share. Zero when the other roles claim 100% or more.
    pub fn scientists(&self) -> u32 {
        100u32.saturating_sub(
            self.farmers
                .saturating_add(self.miners)
                .saturating_add(self.soldiers),
        )
    }

    /// Policy the resolver actually applies: shares fit inside 100%, with any
    /// excess trimmed from soldiers first, then miners, then farmers.
    pub fn clamped(&self) -> Self {
        let farmers = self.farmers.min(100);
        let miners = self.miners.min(100 - farmers);
        let soldiers = self.soldiers.min(100 - farmers - miners);
        Self {
            farmers,
            miners,
            soldiers,
        }
    }
}

/// Split `total` into role counts. Scientists absorb the remainder, so the four
/// counts always sum to `floor(total)`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn role_counts(total: f64, policy: &AllocationPolicy) -> Population {
    let total = total.max(0.0);
    let policy = policy.clamped();
    let headcount = total.floor() as u32;
    let share = |pct: u32| (total * f64::from(pct) / 100.0).floor() as u32;

    // Cap against what is left so float rounding can never over-assign.
    let farmers = share(policy.farmers).min(headcount);
    let miners = share(policy.miners).min(headcount - farmers);
    let soldiers = share(policy.soldiers).min(headcount - farmers - miners);
    let scientists = headcount - farmers - miners - soldiers;

    Population {
        total,
        farmers,
        miners,
        soldiers,
        scientists,
    }
}

pub(crate) fn assign_roles(mut state: GameState) -> GameState {
    state.population = role_counts(state.population.total, &state.allocation);
    state
}
