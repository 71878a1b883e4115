//! Ability activation and control-state advancement for one combatant

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use tracing::debug;

use crate::game::arena::{Arena, BoundaryKind};
use crate::game::cinematic::CinematicKind;
use crate::game::combatant::{Combatant, ControlState, DASH_MAX_ACCEL, NORMAL_MAX_ACCEL};
use crate::game::events::{LoopKind, MatchEvent};
use crate::game::power::PowerSystem;
use crate::game::PlayerSlot;

pub const DODGE_COST: f32 = 10.0;
pub const DODGE_IMPULSE: f32 = 400.0;
pub const DODGE_TRAVEL: f32 = 50.0;
pub const DODGE_COOLDOWN: f32 = 2.0;

pub const HEAVY_ATTACK_COST: f32 = 15.0;
pub const HEAVY_ATTACK_SPEED: f32 = 350.0;
pub const HEAVY_ATTACK_DISTANCE: f32 = 100.0;
/// Shared by heavy and ultimate attacks
pub const ATTACK_COOLDOWN: f32 = 5.0;

pub const ULTIMATE_ATTACK_COST: f32 = 25.0;
pub const ULTIMATE_ATTACK_SPEED: f32 = 500.0;
pub const ULTIMATE_ATTACK_DISTANCE: f32 = 150.0;
pub const ULTIMATE_MIN_RANGE: f32 = 60.0;
pub const ULTIMATE_MAX_RANGE: f32 = 150.0;

pub const CINEMATIC_COST: f32 = 25.0;
pub const CINEMATIC_COOLDOWN: f32 = 10.0;

/// How close to a ring a top must drift to get pulled onto it
pub const LOOP_ENTRY_TOLERANCE: f32 = 5.0;
pub const NORMAL_LOOP_DURATION: f32 = 2.0;
pub const NORMAL_LOOP_OMEGA: f32 = TAU / NORMAL_LOOP_DURATION;
pub const NORMAL_LOOP_LAUNCH_SPEED: f32 = 300.0;
pub const NORMAL_LOOP_COOLDOWN: f32 = 5.0;

pub const BLUE_LOOP_OMEGA: f32 = TAU / 1.0;
pub const BLUE_LOOP_COOLDOWN: f32 = 3.0;
/// Fixed charge points on the blue loop
pub const CHARGE_POINTS_DEG: [f32; 3] = [30.0, 150.0, 270.0];
/// Human pick window before a point is assigned at random
pub const CHARGE_SELECT_WINDOW: f32 = 1.0;
pub const CHARGE_ALIGN_TOLERANCE_DEG: f32 = 5.0;

pub const CHARGE_DASH_SPEED: f32 = 350.0;
pub const CHARGE_DASH_DURATION: f32 = 3.0;
/// Distance from the outer boundary at which a dash is re-aimed at center
pub const DASH_BOUNDARY_MARGIN: f32 = 20.0;

pub const BOUNCE_SPIN_BASE: f32 = 8.0;
pub const BOUNCE_SPIN_PER_ACCEL: f32 = 0.7;
/// A wall bounce never leaves spin below this
pub const BOUNCE_MIN_SPIN: f32 = 50.0;
pub const RESPAWN_INSET: f32 = 10.0;
pub const RESPAWN_SPEED_MIN: f32 = 60.0;
pub const RESPAWN_SPEED_MAX: f32 = 90.0;

/// Free-movement ease rate per point of acceleration cap
pub const ACCEL_EASE_FACTOR: f32 = 0.4;
/// Velocity multiplier per tick when steering is idle
pub const IDLE_FRICTION: f32 = 0.9;

/// Dodge direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DodgeSide {
    Left,
    Right,
}

/// Read-only facts about the opposing top
#[derive(Debug, Clone, Copy)]
pub struct OpponentView {
    pub position: Vec2,
    pub alive: bool,
}

impl OpponentView {
    pub fn of(c: &Combatant) -> Self {
        Self {
            position: c.position,
            alive: c.is_active(),
        }
    }
}

/// What a boundary crossing did to the combatant
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundaryOutcome {
    Bounced { spin_cost: f32 },
    Exited,
}

/// The per-combatant state machine. All activations are silent no-ops when
/// their preconditions fail; the caller has already consumed the trigger.
pub struct AbilitySystem;

impl AbilitySystem {
    pub fn dodge_ready(c: &Combatant, now: f32) -> bool {
        !c.control.owns_control() && now >= c.cooldowns.dodge && c.power >= DODGE_COST
    }

    pub fn heavy_ready(c: &Combatant, now: f32) -> bool {
        !c.control.owns_control() && now >= c.cooldowns.attack && c.power >= HEAVY_ATTACK_COST
    }

    pub fn ultimate_ready(c: &Combatant, opponent_distance: f32, now: f32) -> bool {
        !c.control.owns_control()
            && now >= c.cooldowns.attack
            && c.power >= ULTIMATE_ATTACK_COST
            && (ULTIMATE_MIN_RANGE..=ULTIMATE_MAX_RANGE).contains(&opponent_distance)
    }

    pub fn cinematic_ready(c: &Combatant, opponent: &OpponentView, now: f32) -> bool {
        !c.control.owns_control()
            && now >= c.cooldowns.cinematic
            && c.power >= CINEMATIC_COST
            && opponent.alive
    }

    /// Sideways burst. Steering stays locked until 50 units of travel.
    pub fn try_dodge(c: &mut Combatant, side: DodgeSide, now: f32) -> bool {
        if !Self::dodge_ready(c, now) || !PowerSystem::try_spend(c, DODGE_COST) {
            return false;
        }
        let impulse = match side {
            DodgeSide::Left => -DODGE_IMPULSE,
            DodgeSide::Right => DODGE_IMPULSE,
        };
        c.velocity.x += impulse;
        c.control = ControlState::Dodging { traveled: 0.0 };
        c.tally.abilities_used += 1;
        debug!(name = %c.name, ?side, "dodge");
        true
    }

    /// Straight-line strike toward the steering direction, or toward the
    /// opponent when the player is not steering.
    pub fn try_heavy_attack(
        c: &mut Combatant,
        input_dir: Vec2,
        opponent: &OpponentView,
        now: f32,
    ) -> bool {
        if !Self::heavy_ready(c, now) || !PowerSystem::try_spend(c, HEAVY_ATTACK_COST) {
            return false;
        }
        let dir = if input_dir != Vec2::ZERO {
            input_dir
        } else {
            (opponent.position - c.position).normalize_or_zero()
        };
        let dir = if dir == Vec2::ZERO { Vec2::X } else { dir };
        c.velocity = dir * HEAVY_ATTACK_SPEED;
        c.control = ControlState::HeavyAttack {
            start: c.position,
            target_distance: HEAVY_ATTACK_DISTANCE,
        };
        c.tally.abilities_used += 1;
        debug!(name = %c.name, "heavy attack");
        true
    }

    /// AI-only ranged strike
    pub fn try_ultimate_attack(c: &mut Combatant, opponent: &OpponentView, now: f32) -> bool {
        let to_opponent = opponent.position - c.position;
        let distance = to_opponent.length();
        if !Self::ultimate_ready(c, distance, now)
            || !PowerSystem::try_spend(c, ULTIMATE_ATTACK_COST)
        {
            return false;
        }
        c.velocity = to_opponent / distance * ULTIMATE_ATTACK_SPEED;
        c.control = ControlState::UltimateAttack {
            start: c.position,
            target_distance: ULTIMATE_ATTACK_DISTANCE,
        };
        c.tally.abilities_used += 1;
        debug!(name = %c.name, "ultimate attack");
        true
    }

    /// Hand control to the cinematic director; the chosen script kind is
    /// picked at random. Returns the kind on success so the caller can start
    /// the script and show the banner.
    pub fn try_cinematic(
        c: &mut Combatant,
        opponent: &OpponentView,
        now: f32,
        rng: &mut impl Rng,
    ) -> Option<CinematicKind> {
        if !Self::cinematic_ready(c, opponent, now) || !PowerSystem::try_spend(c, CINEMATIC_COST) {
            return None;
        }
        let kind = if rng.gen_bool(0.5) {
            CinematicKind::Barrage
        } else {
            CinematicKind::TimeSkip
        };
        c.control = ControlState::Cinematic { kind };
        c.tally.abilities_used += 1;
        debug!(name = %c.name, ?kind, "cinematic move");
        Some(kind)
    }

    /// Script finished: release control and start the long cooldown
    pub fn finish_cinematic(c: &mut Combatant, now: f32) {
        if matches!(c.control, ControlState::Cinematic { .. }) {
            c.control = ControlState::Free;
            c.cooldowns.cinematic = now + CINEMATIC_COOLDOWN;
        }
    }

    /// Free-movement steering: ease toward the input-scaled target velocity,
    /// or bleed speed through friction when idle.
    pub fn steer_free(c: &mut Combatant, direction: Vec2, dt: f32) {
        if direction != Vec2::ZERO {
            let target = direction * c.move_speed;
            let blend = (c.current_max_accel * ACCEL_EASE_FACTOR * dt).min(1.0);
            c.velocity += (target - c.velocity) * blend;
        } else {
            c.velocity *= IDLE_FRICTION;
        }
    }

    /// Ring capture: a free top drifting onto either ring gets pulled into
    /// the corresponding loop. The AI picks its blue-loop charge point
    /// immediately; humans get the selection window.
    pub fn maybe_enter_loop(
        c: &mut Combatant,
        arena: &Arena,
        is_human: bool,
        now: f32,
        rng: &mut impl Rng,
    ) -> Option<LoopKind> {
        if c.control.owns_control() {
            return None;
        }
        if now >= c.cooldowns.normal_loop
            && arena.on_ring_band(c.position, arena.normal_loop_radius, LOOP_ENTRY_TOLERANCE)
        {
            let angle = arena.polar_angle(c.position);
            c.position = arena.point_on_ring(arena.normal_loop_radius, angle);
            c.control = ControlState::NormalLoop {
                started_at: now,
                angle,
            };
            return Some(LoopKind::Normal);
        }
        if now >= c.cooldowns.blue_loop
            && arena.on_ring_band(c.position, arena.charge_dash_radius, LOOP_ENTRY_TOLERANCE)
        {
            let angle = arena.polar_angle(c.position);
            c.position = arena.point_on_ring(arena.charge_dash_radius, angle);
            let charge_point = if is_human {
                None
            } else {
                Some(random_charge_point(rng))
            };
            c.control = ControlState::BlueLoop {
                started_at: now,
                angle,
                charge_point,
            };
            return Some(LoopKind::Blue);
        }
        None
    }

    /// Advance whichever control-owning state is active. Cinematic moves are
    /// driven by the director, not here.
    #[allow(clippy::too_many_arguments)]
    pub fn advance(
        c: &mut Combatant,
        slot: PlayerSlot,
        arena: &Arena,
        input_dir: Vec2,
        is_human: bool,
        now: f32,
        dt: f32,
        rng: &mut impl Rng,
        events: &mut Vec<MatchEvent>,
    ) {
        match c.control.clone() {
            ControlState::Free | ControlState::Cinematic { .. } => {}

            ControlState::Dodging { traveled } => {
                let traveled = traveled + c.speed() * dt;
                if traveled >= DODGE_TRAVEL {
                    c.control = ControlState::Free;
                    c.cooldowns.dodge = now + DODGE_COOLDOWN;
                } else {
                    c.control = ControlState::Dodging { traveled };
                }
            }

            ControlState::HeavyAttack {
                start,
                target_distance,
            } => {
                Self::advance_attack(c, start, target_distance, HEAVY_ATTACK_SPEED, now);
            }

            ControlState::UltimateAttack {
                start,
                target_distance,
            } => {
                Self::advance_attack(c, start, target_distance, ULTIMATE_ATTACK_SPEED, now);
            }

            ControlState::NormalLoop { started_at, angle } => {
                let sign = c.spin_direction.sign();
                if now - started_at >= NORMAL_LOOP_DURATION {
                    let tangent = tangent_at(angle, sign);
                    let boosted = (c.acceleration * 2.0).clamp(NORMAL_MAX_ACCEL, DASH_MAX_ACCEL);
                    c.current_max_accel = c.current_max_accel.max(boosted);
                    c.velocity = tangent * NORMAL_LOOP_LAUNCH_SPEED;
                    c.control = ControlState::Free;
                    c.cooldowns.normal_loop = now + NORMAL_LOOP_COOLDOWN;
                } else {
                    let angle = angle + sign * NORMAL_LOOP_OMEGA * dt;
                    c.position = arena.point_on_ring(arena.normal_loop_radius, angle);
                    c.velocity =
                        tangent_at(angle, sign) * NORMAL_LOOP_OMEGA * arena.normal_loop_radius;
                    c.control = ControlState::NormalLoop { started_at, angle };
                }
            }

            ControlState::BlueLoop {
                started_at,
                angle,
                charge_point,
            } => {
                let sign = c.spin_direction.sign();
                let in_window = now - started_at <= CHARGE_SELECT_WINDOW;

                let charge_point = match charge_point {
                    Some(point) => Some(point),
                    None if is_human && in_window && input_dir != Vec2::ZERO => {
                        let picked = nearest_charge_point(input_dir.y.atan2(input_dir.x));
                        events.push(MatchEvent::ChargePointAssigned {
                            slot,
                            angle_deg: picked.to_degrees(),
                            auto: false,
                        });
                        Some(picked)
                    }
                    None if !in_window => {
                        let picked = random_charge_point(rng);
                        events.push(MatchEvent::ChargePointAssigned {
                            slot,
                            angle_deg: picked.to_degrees(),
                            auto: true,
                        });
                        Some(picked)
                    }
                    None => None,
                };

                let aligned = charge_point.is_some_and(|point| {
                    angular_difference(angle, point) <= CHARGE_ALIGN_TOLERANCE_DEG.to_radians()
                });
                if aligned {
                    c.velocity = (arena.center - c.position).normalize_or_zero() * CHARGE_DASH_SPEED;
                    c.current_max_accel = DASH_MAX_ACCEL;
                    c.control = ControlState::ChargeDashing { started_at: now };
                    c.cooldowns.blue_loop = now + BLUE_LOOP_COOLDOWN;
                } else {
                    let angle = angle + sign * BLUE_LOOP_OMEGA * dt;
                    c.position = arena.point_on_ring(arena.charge_dash_radius, angle);
                    c.velocity =
                        tangent_at(angle, sign) * BLUE_LOOP_OMEGA * arena.charge_dash_radius;
                    c.control = ControlState::BlueLoop {
                        started_at,
                        angle,
                        charge_point,
                    };
                }
            }

            ControlState::ChargeDashing { started_at } => {
                if now - started_at >= CHARGE_DASH_DURATION {
                    c.control = ControlState::Free;
                    c.dash_ending = true;
                } else if arena.near_outer_boundary(c.position, DASH_BOUNDARY_MARGIN) {
                    c.velocity = (arena.center - c.position).normalize_or_zero() * CHARGE_DASH_SPEED;
                } else {
                    let heading = c.velocity.normalize_or_zero();
                    let heading = if heading == Vec2::ZERO {
                        (arena.center - c.position).normalize_or_zero()
                    } else {
                        heading
                    };
                    c.velocity = heading * CHARGE_DASH_SPEED;
                }
            }
        }
    }

    fn advance_attack(c: &mut Combatant, start: Vec2, target_distance: f32, speed: f32, now: f32) {
        let heading = c.velocity.normalize_or_zero();
        if heading == Vec2::ZERO || (c.position - start).length() >= target_distance {
            c.control = ControlState::Free;
            c.cooldowns.attack = now + ATTACK_COOLDOWN;
        } else {
            c.velocity = heading * speed;
        }
    }

    /// Outer-boundary rule: wall arcs bounce the top back in at a spin cost,
    /// exit arcs eliminate it. The one-tick respawn grace skips the check.
    pub fn resolve_boundary(
        c: &mut Combatant,
        arena: &Arena,
        rng: &mut impl Rng,
    ) -> Option<BoundaryOutcome> {
        if c.is_dead {
            return None;
        }
        if c.just_respawned {
            c.just_respawned = false;
            return None;
        }
        let (kind, angle) = arena.check_boundary(c.position)?;
        match kind {
            BoundaryKind::Exit => {
                c.mark_exited();
                debug!(name = %c.name, "rang out");
                Some(BoundaryOutcome::Exited)
            }
            BoundaryKind::Wall => {
                if matches!(c.control, ControlState::ChargeDashing { .. }) {
                    c.dash_ending = true;
                }
                let spin_cost = BOUNCE_SPIN_BASE + BOUNCE_SPIN_PER_ACCEL * c.acceleration;
                c.spin = (c.spin - spin_cost).max(BOUNCE_MIN_SPIN);
                c.position = arena.point_on_ring(arena.inner_radius - RESPAWN_INSET, angle);
                let speed = rng.gen_range(RESPAWN_SPEED_MIN..=RESPAWN_SPEED_MAX);
                c.velocity = (arena.center - c.position).normalize_or_zero() * speed;
                c.just_respawned = true;
                c.control = ControlState::Free;
                c.tally.wall_bounces += 1;
                debug!(name = %c.name, spin_cost, "wall bounce");
                Some(BoundaryOutcome::Bounced { spin_cost })
            }
        }
    }
}

/// Unit tangent on a centered ring at `angle`, in the traversal sense `sign`
fn tangent_at(angle: f32, sign: f32) -> Vec2 {
    Vec2::new(-angle.sin(), angle.cos()) * sign
}

/// Smallest absolute angular distance between two angles
fn angular_difference(a: f32, b: f32) -> f32 {
    let raw = (a - b).rem_euclid(TAU);
    raw.min(TAU - raw)
}

fn nearest_charge_point(input_angle: f32) -> f32 {
    let mut best = CHARGE_POINTS_DEG[0].to_radians();
    let mut best_dist = f32::MAX;
    for deg in CHARGE_POINTS_DEG {
        let point = deg.to_radians();
        let dist = angular_difference(input_angle, point);
        if dist < best_dist {
            best = point;
            best_dist = dist;
        }
    }
    best
}

fn random_charge_point(rng: &mut impl Rng) -> f32 {
    CHARGE_POINTS_DEG[rng.gen_range(0..CHARGE_POINTS_DEG.len())].to_radians()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::loadout::{CatalogResolver, LoadoutResolver, SpinDirection};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    fn test_combatant() -> Combatant {
        let loadout = CatalogResolver.resolve("balance").unwrap();
        Combatant::new(&loadout, Vec2::ZERO, true)
    }

    fn opponent_at(x: f32, y: f32) -> OpponentView {
        OpponentView {
            position: Vec2::new(x, y),
            alive: true,
        }
    }

    /// Step the state machine plus a bare position integration, without the
    /// rest of the engine.
    fn step(c: &mut Combatant, arena: &Arena, dt: f32, now: f32, events: &mut Vec<MatchEvent>) {
        let mut r = rng();
        AbilitySystem::advance(
            c,
            PlayerSlot::One,
            arena,
            Vec2::ZERO,
            true,
            now,
            dt,
            &mut r,
            events,
        );
        c.position += c.velocity * dt;
    }

    #[test]
    fn test_dodge_left_contract() {
        let mut c = test_combatant();
        c.power = 10.0;
        assert!(AbilitySystem::try_dodge(&mut c, DodgeSide::Left, 0.0));
        assert_eq!(c.power, 0.0);
        assert_eq!(c.velocity.x, -DODGE_IMPULSE);
        assert_eq!(c.velocity.y, 0.0);
        assert!(c.control_flags().is_dodging);

        let arena = Arena::default();
        let dt = 1.0 / 60.0;
        let mut now = 0.0;
        let mut events = Vec::new();
        let mut ticks = 0;
        while c.control_flags().is_dodging && ticks < 60 {
            now += dt;
            step(&mut c, &arena, dt, now, &mut events);
            ticks += 1;
            let traveled = ticks as f32 * DODGE_IMPULSE * dt;
            if traveled < DODGE_TRAVEL {
                assert!(c.control_flags().is_dodging, "ended early at {traveled}");
            }
        }
        assert!(!c.control_flags().is_dodging);
        assert!(c.cooldowns.dodge > 0.0);
    }

    #[test]
    fn test_dodge_requires_power() {
        let mut c = test_combatant();
        c.power = 9.9;
        assert!(!AbilitySystem::try_dodge(&mut c, DodgeSide::Right, 0.0));
        assert_eq!(c.power, 9.9);
        assert_eq!(c.control, ControlState::Free);
    }

    #[test]
    fn test_dodge_respects_cooldown() {
        let mut c = test_combatant();
        c.power = 25.0;
        c.cooldowns.dodge = 5.0;
        assert!(!AbilitySystem::try_dodge(&mut c, DodgeSide::Right, 4.9));
        assert!(AbilitySystem::try_dodge(&mut c, DodgeSide::Right, 5.0));
    }

    #[test]
    fn test_heavy_attack_follows_input_direction() {
        let mut c = test_combatant();
        c.power = 15.0;
        let opponent = opponent_at(0.0, 100.0);
        assert!(AbilitySystem::try_heavy_attack(
            &mut c,
            Vec2::X,
            &opponent,
            0.0
        ));
        assert_eq!(c.velocity, Vec2::X * HEAVY_ATTACK_SPEED);
        assert_eq!(c.power, 0.0);
    }

    #[test]
    fn test_heavy_attack_falls_back_toward_opponent() {
        let mut c = test_combatant();
        c.power = 15.0;
        let opponent = opponent_at(0.0, 100.0);
        assert!(AbilitySystem::try_heavy_attack(
            &mut c,
            Vec2::ZERO,
            &opponent,
            0.0
        ));
        assert!(c.velocity.y > 0.0);
        assert_eq!(c.velocity.x, 0.0);
    }

    #[test]
    fn test_heavy_attack_ends_at_target_distance() {
        let mut c = test_combatant();
        c.power = 15.0;
        let arena = Arena::default();
        let opponent = opponent_at(200.0, 0.0);
        AbilitySystem::try_heavy_attack(&mut c, Vec2::X, &opponent, 0.0);

        let dt = 1.0 / 60.0;
        let mut now = 0.0;
        let mut events = Vec::new();
        for _ in 0..60 {
            now += dt;
            step(&mut c, &arena, dt, now, &mut events);
            if !c.control_flags().heavy_attack_active {
                break;
            }
        }
        assert!(!c.control_flags().heavy_attack_active);
        assert!(c.position.x >= HEAVY_ATTACK_DISTANCE);
        assert_eq!(c.cooldowns.attack, now + ATTACK_COOLDOWN);
    }

    #[test]
    fn test_ultimate_requires_range() {
        let mut close = test_combatant();
        close.power = 25.0;
        assert!(!AbilitySystem::try_ultimate_attack(
            &mut close,
            &opponent_at(30.0, 0.0),
            0.0
        ));

        let mut ranged = test_combatant();
        ranged.power = 25.0;
        assert!(AbilitySystem::try_ultimate_attack(
            &mut ranged,
            &opponent_at(100.0, 0.0),
            0.0
        ));
        assert_eq!(ranged.velocity, Vec2::X * ULTIMATE_ATTACK_SPEED);
    }

    #[test]
    fn test_cinematic_needs_living_opponent() {
        let mut c = test_combatant();
        c.power = 25.0;
        let dead = OpponentView {
            position: Vec2::new(50.0, 0.0),
            alive: false,
        };
        assert!(AbilitySystem::try_cinematic(&mut c, &dead, 0.0, &mut rng()).is_none());
        assert_eq!(c.power, 25.0);

        let alive = opponent_at(50.0, 0.0);
        let kind = AbilitySystem::try_cinematic(&mut c, &alive, 0.0, &mut rng());
        assert!(kind.is_some());
        assert_eq!(c.power, 0.0);
        assert!(c.control_flags().cinematic_active);
    }

    #[test]
    fn test_finish_cinematic_sets_long_cooldown() {
        let mut c = test_combatant();
        c.control = ControlState::Cinematic {
            kind: CinematicKind::Barrage,
        };
        AbilitySystem::finish_cinematic(&mut c, 12.0);
        assert_eq!(c.control, ControlState::Free);
        assert_eq!(c.cooldowns.cinematic, 12.0 + CINEMATIC_COOLDOWN);
    }

    #[test]
    fn test_idle_steering_applies_friction() {
        let mut c = test_combatant();
        c.velocity = Vec2::new(100.0, 0.0);
        AbilitySystem::steer_free(&mut c, Vec2::ZERO, 1.0 / 60.0);
        assert_eq!(c.velocity.x, 90.0);
    }

    #[test]
    fn test_steering_eases_toward_target() {
        let mut c = test_combatant();
        for _ in 0..240 {
            AbilitySystem::steer_free(&mut c, Vec2::X, 1.0 / 60.0);
        }
        assert!(c.velocity.x > c.move_speed * 0.8);
        assert!(c.velocity.x <= c.move_speed);
    }

    #[test]
    fn test_normal_loop_entry_snaps_to_ring() {
        let arena = Arena::default();
        let mut c = test_combatant();
        c.position = arena.point_on_ring(arena.normal_loop_radius + 3.0, 1.0);
        let kind = AbilitySystem::maybe_enter_loop(&mut c, &arena, true, 0.0, &mut rng());
        assert_eq!(kind, Some(LoopKind::Normal));
        assert!(
            (arena.distance_from_center(c.position) - arena.normal_loop_radius).abs() < 1e-3
        );
        assert!(c.control_flags().is_in_normal_loop);
    }

    #[test]
    fn test_normal_loop_entry_respects_cooldown() {
        let arena = Arena::default();
        let mut c = test_combatant();
        c.cooldowns.normal_loop = 10.0;
        c.position = arena.point_on_ring(arena.normal_loop_radius, 1.0);
        assert!(AbilitySystem::maybe_enter_loop(&mut c, &arena, true, 5.0, &mut rng()).is_none());
    }

    #[test]
    fn test_normal_loop_completes_one_revolution_and_launches() {
        let arena = Arena::default();
        let mut c = test_combatant();
        c.spin_direction = SpinDirection::Left;
        c.position = arena.point_on_ring(arena.normal_loop_radius, 0.0);
        AbilitySystem::maybe_enter_loop(&mut c, &arena, true, 0.0, &mut rng());

        let dt = 1.0 / 60.0;
        let mut now = 0.0;
        let mut events = Vec::new();
        let mut r = rng();
        let mut last_angle = 0.0;
        while c.control_flags().is_in_normal_loop && now < 3.0 {
            now += dt;
            AbilitySystem::advance(
                &mut c,
                PlayerSlot::One,
                &arena,
                Vec2::ZERO,
                true,
                now,
                dt,
                &mut r,
                &mut events,
            );
            if let ControlState::NormalLoop { angle, .. } = c.control {
                last_angle = angle;
            }
        }
        assert!(!c.control_flags().is_in_normal_loop);
        // one full revolution at ω=2π/2s
        assert!((last_angle - TAU).abs() < 0.2);
        assert!((c.speed() - NORMAL_LOOP_LAUNCH_SPEED).abs() < 1.0);
        assert_eq!(c.cooldowns.normal_loop, now + NORMAL_LOOP_COOLDOWN);
    }

    #[test]
    fn test_blue_loop_human_pick_from_steering() {
        let arena = Arena::default();
        let mut c = test_combatant();
        c.position = arena.point_on_ring(arena.charge_dash_radius, 0.0);
        AbilitySystem::maybe_enter_loop(&mut c, &arena, true, 0.0, &mut rng());
        assert!(c.charge_point().is_none());

        let mut events = Vec::new();
        let steer = Vec2::new(30f32.to_radians().cos(), 30f32.to_radians().sin());
        AbilitySystem::advance(
            &mut c,
            PlayerSlot::One,
            &arena,
            steer,
            true,
            0.1,
            1.0 / 60.0,
            &mut rng(),
            &mut events,
        );
        assert_eq!(c.charge_point(), Some(30f32.to_radians()));
        assert!(matches!(
            events.as_slice(),
            [MatchEvent::ChargePointAssigned { auto: false, .. }]
        ));
    }

    #[test]
    fn test_blue_loop_random_pick_after_window() {
        let arena = Arena::default();
        let mut c = test_combatant();
        c.position = arena.point_on_ring(arena.charge_dash_radius, 0.0);
        AbilitySystem::maybe_enter_loop(&mut c, &arena, true, 0.0, &mut rng());

        let mut events = Vec::new();
        AbilitySystem::advance(
            &mut c,
            PlayerSlot::One,
            &arena,
            Vec2::ZERO,
            true,
            CHARGE_SELECT_WINDOW + 0.1,
            1.0 / 60.0,
            &mut rng(),
            &mut events,
        );
        assert!(c.charge_point().is_some() || c.control_flags().is_charge_dashing);
        assert!(matches!(
            events.as_slice(),
            [MatchEvent::ChargePointAssigned { auto: true, .. }]
        ));
    }

    #[test]
    fn test_ai_blue_loop_picks_immediately() {
        let arena = Arena::default();
        let mut c = test_combatant();
        c.position = arena.point_on_ring(arena.charge_dash_radius, 2.0);
        AbilitySystem::maybe_enter_loop(&mut c, &arena, false, 0.0, &mut rng());
        assert!(c.charge_point().is_some());
    }

    #[test]
    fn test_blue_loop_alignment_starts_dash_toward_center() {
        let arena = Arena::default();
        let mut c = test_combatant();
        // already at the charge point, selection pre-made
        let point = 30f32.to_radians();
        c.position = arena.point_on_ring(arena.charge_dash_radius, point);
        c.control = ControlState::BlueLoop {
            started_at: 0.0,
            angle: point,
            charge_point: Some(point),
        };
        let mut events = Vec::new();
        AbilitySystem::advance(
            &mut c,
            PlayerSlot::One,
            &arena,
            Vec2::ZERO,
            true,
            0.1,
            1.0 / 60.0,
            &mut rng(),
            &mut events,
        );
        assert!(c.control_flags().is_charge_dashing);
        assert_eq!(c.current_max_accel, DASH_MAX_ACCEL);
        assert_eq!(c.cooldowns.blue_loop, 0.1 + BLUE_LOOP_COOLDOWN);
        let toward_center = (arena.center - c.position).normalize_or_zero();
        assert!(c.velocity.normalize_or_zero().dot(toward_center) > 0.99);
    }

    #[test]
    fn test_dash_redirects_near_boundary_and_expires() {
        let arena = Arena::default();
        let mut c = test_combatant();
        c.position = arena.point_on_ring(arena.outer_radius - 10.0, 0.5);
        c.velocity = Vec2::new(350.0, 0.0);
        c.control = ControlState::ChargeDashing { started_at: 0.0 };

        let mut events = Vec::new();
        AbilitySystem::advance(
            &mut c,
            PlayerSlot::One,
            &arena,
            Vec2::ZERO,
            true,
            0.1,
            1.0 / 60.0,
            &mut rng(),
            &mut events,
        );
        let toward_center = (arena.center - c.position).normalize_or_zero();
        assert!(c.velocity.normalize_or_zero().dot(toward_center) > 0.99);

        AbilitySystem::advance(
            &mut c,
            PlayerSlot::One,
            &arena,
            Vec2::ZERO,
            true,
            CHARGE_DASH_DURATION + 0.1,
            1.0 / 60.0,
            &mut rng(),
            &mut events,
        );
        assert!(!c.control_flags().is_charge_dashing);
        assert!(c.dash_ending);
    }

    #[test]
    fn test_wall_crossing_bounces() {
        let arena = Arena::default();
        let mut c = test_combatant();
        c.spin = 100.0;
        c.acceleration = 10.0;
        c.position = arena.point_on_ring(arena.outer_radius + 1.0, 45f32.to_radians());
        c.velocity = Vec2::new(200.0, 200.0);

        let outcome = AbilitySystem::resolve_boundary(&mut c, &arena, &mut rng());
        let Some(BoundaryOutcome::Bounced { spin_cost }) = outcome else {
            panic!("expected a bounce, got {outcome:?}");
        };
        assert!(!c.is_dead);
        assert_eq!(spin_cost, BOUNCE_SPIN_BASE + BOUNCE_SPIN_PER_ACCEL * 10.0);
        assert_eq!(c.spin, 100.0 - spin_cost);
        let r = arena.distance_from_center(c.position);
        assert!((r - (arena.inner_radius - RESPAWN_INSET)).abs() < 1e-3);
        let inward_speed = c.speed();
        assert!((RESPAWN_SPEED_MIN..=RESPAWN_SPEED_MAX).contains(&inward_speed));
        assert!(c.just_respawned);
    }

    #[test]
    fn test_bounce_floors_remaining_spin() {
        let arena = Arena::default();
        let mut c = test_combatant();
        c.spin = 52.0;
        c.acceleration = 25.0;
        c.position = arena.point_on_ring(arena.outer_radius + 1.0, 45f32.to_radians());
        AbilitySystem::resolve_boundary(&mut c, &arena, &mut rng());
        assert_eq!(c.spin, BOUNCE_MIN_SPIN);
    }

    #[test]
    fn test_exit_crossing_eliminates() {
        let arena = Arena::default();
        let mut c = test_combatant();
        c.position = arena.point_on_ring(arena.outer_radius + 1.0, 90f32.to_radians());
        c.velocity = Vec2::new(0.0, 300.0);

        let outcome = AbilitySystem::resolve_boundary(&mut c, &arena, &mut rng());
        assert_eq!(outcome, Some(BoundaryOutcome::Exited));
        assert!(c.is_dead);
        assert!(c.is_out_of_bounds);
        assert_eq!(c.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_respawn_grace_covers_exactly_one_check() {
        let arena = Arena::default();
        let mut c = test_combatant();
        c.just_respawned = true;
        c.position = arena.point_on_ring(arena.outer_radius + 1.0, 90f32.to_radians());
        assert!(AbilitySystem::resolve_boundary(&mut c, &arena, &mut rng()).is_none());
        assert!(!c.is_dead);
        assert!(!c.just_respawned, "grace is consumed by the skipped check");

        // still outside on the next tick: the exit applies
        let outcome = AbilitySystem::resolve_boundary(&mut c, &arena, &mut rng());
        assert_eq!(outcome, Some(BoundaryOutcome::Exited));
    }

    #[test]
    fn test_triggers_ignored_while_state_owned() {
        let mut c = test_combatant();
        c.power = 25.0;
        c.control = ControlState::Dodging { traveled: 0.0 };
        assert!(!AbilitySystem::try_heavy_attack(
            &mut c,
            Vec2::X,
            &opponent_at(100.0, 0.0),
            0.0
        ));
        assert_eq!(c.power, 25.0);
    }
}
