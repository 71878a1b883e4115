//! Power-meter rules: regeneration and the ability-cost precondition

use crate::game::combatant::{Combatant, ControlState};

/// Meter ceiling
pub const POWER_MAX: f32 = 25.0;
/// Baseline gain per second
pub const POWER_REGEN_PER_SEC: f32 = 5.0;
/// Gain per second while riding a loop or charge dashing
pub const POWER_REGEN_LOOP_PER_SEC: f32 = 10.0;

/// Power-meter bookkeeping
pub struct PowerSystem;

impl PowerSystem {
    /// Per-second gain for the combatant's current state
    pub fn regen_rate(combatant: &Combatant) -> f32 {
        match combatant.control {
            ControlState::NormalLoop { .. }
            | ControlState::BlueLoop { .. }
            | ControlState::ChargeDashing { .. } => POWER_REGEN_LOOP_PER_SEC,
            _ => POWER_REGEN_PER_SEC,
        }
    }

    /// Tick regeneration; dead tops gain nothing
    pub fn regen(combatant: &mut Combatant, dt: f32) {
        if combatant.is_dead {
            return;
        }
        combatant.power = (combatant.power + Self::regen_rate(combatant) * dt).min(POWER_MAX);
    }

    /// Cost precondition plus immediate deduction. Leaves the meter untouched
    /// and returns false when the combatant cannot afford the ability.
    pub fn try_spend(combatant: &mut Combatant, cost: f32) -> bool {
        if combatant.power < cost {
            return false;
        }
        combatant.power = (combatant.power - cost).max(0.0);
        true
    }
}
