//! Single-player opponent. Rolls ability trials each tick and otherwise
//! chases the human combatant.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use crate::game::abilities::{AbilitySystem, DodgeSide, OpponentView};
use crate::game::combatant::Combatant;
use crate::game::events::AbilityKind;

pub const AI_ULTIMATE_CHANCE: f64 = 0.015;
pub const AI_HEAVY_CHANCE: f64 = 0.02;
pub const AI_DODGE_CHANCE: f64 = 0.025;
/// Dodge trials only run inside this range
pub const AI_DODGE_RANGE: f32 = 50.0;
pub const AI_CHASE_SPEED: f32 = 180.0;
pub const AI_CHASE_ACCEL: f32 = 380.0;
/// Magnitude of the per-tick heading perturbation
pub const AI_JITTER: f32 = 0.4;

pub struct AiController;

impl AiController {
    /// One decision tick: Bernoulli ability trials gated by the same
    /// predicates as player activations, then bounded pursuit when no
    /// ability holds control. Returns the ability it activated, if any.
    pub fn act(
        c: &mut Combatant,
        opponent: &OpponentView,
        now: f32,
        dt: f32,
        rng: &mut impl Rng,
    ) -> Option<AbilityKind> {
        if c.is_dead || c.control.owns_control() {
            return None;
        }
        let distance = (opponent.position - c.position).length();

        if AbilitySystem::ultimate_ready(c, distance, now)
            && rng.gen_bool(AI_ULTIMATE_CHANCE)
            && AbilitySystem::try_ultimate_attack(c, opponent, now)
        {
            return Some(AbilityKind::UltimateAttack);
        }
        if AbilitySystem::heavy_ready(c, now)
            && rng.gen_bool(AI_HEAVY_CHANCE)
            && AbilitySystem::try_heavy_attack(c, Vec2::ZERO, opponent, now)
        {
            return Some(AbilityKind::HeavyAttack);
        }
        if distance < AI_DODGE_RANGE
            && AbilitySystem::dodge_ready(c, now)
            && rng.gen_bool(AI_DODGE_CHANCE)
        {
            let side = if rng.gen_bool(0.5) {
                DodgeSide::Left
            } else {
                DodgeSide::Right
            };
            if AbilitySystem::try_dodge(c, side, now) {
                return Some(match side {
                    DodgeSide::Left => AbilityKind::DodgeLeft,
                    DodgeSide::Right => AbilityKind::DodgeRight,
                });
            }
        }

        Self::chase(c, opponent, dt, rng);
        None
    }

    /// Bounded pursuit with a jittered heading so the chase never tracks
    /// perfectly.
    fn chase(c: &mut Combatant, opponent: &OpponentView, dt: f32, rng: &mut impl Rng) {
        let to_target = (opponent.position - c.position).normalize_or_zero();
        let jitter = Vec2::from_angle(rng.gen_range(0.0..TAU)) * AI_JITTER;
        let desired = (to_target + jitter).normalize_or_zero() * AI_CHASE_SPEED;
        let step = (desired - c.velocity).clamp_length_max(AI_CHASE_ACCEL * dt);
        c.velocity += step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::combatant::ControlState;
    use crate::game::loadout::{CatalogResolver, LoadoutResolver};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const DT: f32 = 1.0 / 60.0;

    fn ai_combatant() -> Combatant {
        let loadout = CatalogResolver.resolve("attack").unwrap();
        Combatant::new(&loadout, Vec2::ZERO, false)
    }

    fn human_at(x: f32, y: f32) -> OpponentView {
        OpponentView {
            position: Vec2::new(x, y),
            alive: true,
        }
    }

    #[test]
    fn test_chase_accelerates_toward_opponent() {
        let mut ai = ai_combatant();
        ai.power = 0.0; // no trials can pass
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        AiController::act(&mut ai, &human_at(200.0, 0.0), 0.0, DT, &mut rng);
        assert!(ai.velocity.x > 0.0);
        assert!(ai.speed() <= AI_CHASE_ACCEL * DT + 1e-3);
    }

    #[test]
    fn test_chase_speed_stays_bounded() {
        let mut ai = ai_combatant();
        ai.power = 0.0;
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for _ in 0..600 {
            AiController::act(&mut ai, &human_at(500.0, 120.0), 0.0, DT, &mut rng);
            assert!(ai.speed() <= AI_CHASE_SPEED + 0.5);
        }
    }

    #[test]
    fn test_ultimate_fires_eventually_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut activations = 0;
        for _ in 0..2000 {
            let mut ai = ai_combatant();
            ai.power = 25.0;
            if AiController::act(&mut ai, &human_at(100.0, 0.0), 10.0, DT, &mut rng)
                == Some(AbilityKind::UltimateAttack)
            {
                activations += 1;
            }
        }
        // 1.5% per trial over 2000 independent ticks
        assert!(activations > 0);
        assert!(activations < 200);
    }

    #[test]
    fn test_dodge_needs_close_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        for _ in 0..500 {
            let mut ai = ai_combatant();
            ai.power = 10.0; // enough for dodge, not heavy
            let kind = AiController::act(&mut ai, &human_at(200.0, 0.0), 10.0, DT, &mut rng);
            assert!(kind != Some(AbilityKind::DodgeLeft));
            assert!(kind != Some(AbilityKind::DodgeRight));
            assert!(!matches!(ai.control, ControlState::Dodging { .. }));
        }
    }

    #[test]
    fn test_dead_ai_does_nothing() {
        let mut ai = ai_combatant();
        ai.mark_spin_out();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert!(AiController::act(&mut ai, &human_at(10.0, 0.0), 0.0, DT, &mut rng).is_none());
        assert_eq!(ai.velocity, Vec2::ZERO);
    }
}
