//! Combatant data and the per-tick background rules shared by every state

use std::f32::consts::TAU;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::abilities::{HEAVY_ATTACK_DISTANCE, ULTIMATE_ATTACK_DISTANCE};
use crate::game::cinematic::CinematicKind;
use crate::game::loadout::{CombatantLoadout, SpinDirection};

/// Acceleration cap outside of a charge dash
pub const NORMAL_MAX_ACCEL: f32 = 15.0;
/// Acceleration cap while charge dashing
pub const DASH_MAX_ACCEL: f32 = 25.0;
/// Derived acceleration: one point per this many units/s of speed
pub const ACCEL_SPEED_RATIO: f32 = 20.0;
/// Velocity-proportional regain working against cap decay
pub const ACCEL_REGAIN_PER_SPEED: f32 = 0.005;
/// Cap decay rate right after a dash ends
pub const ACCEL_DECAY_DASH_END: f32 = 6.0;
/// Cap decay rate during the opening seconds of a match
pub const ACCEL_DECAY_EARLY: f32 = 2.0;
/// Cap decay rate for the rest of the match
pub const ACCEL_DECAY_LATE: f32 = 4.0;
/// Length of the early-match window with the softer decay
pub const EARLY_MATCH_SECS: f32 = 5.0;

/// Baseline spin decay per second
pub const SPIN_DECAY_PER_SEC: f32 = 0.35;
/// Extra spin decay per unit of speed (movement drag)
pub const SPIN_DRAG_FACTOR: f32 = 0.008;
/// Rotation-rate scale: a top at spin 2000 would turn 20 revolutions/s
pub const ROTATION_REVS_AT_REF_SPIN: f32 = 20.0;
const ROTATION_REF_SPIN: f32 = 2000.0;

/// The single control-owning state a combatant can be in. Exactly one
/// variant holds at a time, which is what keeps the mutually-exclusive
/// flag invariant structural.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlState {
    Free,
    Dodging {
        traveled: f32,
    },
    HeavyAttack {
        start: Vec2,
        target_distance: f32,
    },
    UltimateAttack {
        start: Vec2,
        target_distance: f32,
    },
    NormalLoop {
        started_at: f32,
        angle: f32,
    },
    BlueLoop {
        started_at: f32,
        angle: f32,
        charge_point: Option<f32>,
    },
    ChargeDashing {
        started_at: f32,
    },
    Cinematic {
        kind: CinematicKind,
    },
}

impl ControlState {
    /// Whether the state suppresses regular player steering
    pub fn owns_control(&self) -> bool {
        !matches!(self, ControlState::Free)
    }

    /// Rebuild a control state from wire flags. Progress fields that never
    /// travel over the wire are seeded from the combatant's position; the
    /// remote combatant is not advanced locally, so they are display-only.
    pub fn from_flags(
        flags: &ControlFlags,
        loop_angle: Option<f32>,
        charge_point: Option<f32>,
        position: Vec2,
        now: f32,
    ) -> Self {
        let angle = loop_angle.unwrap_or(0.0);
        if flags.is_dodging {
            ControlState::Dodging { traveled: 0.0 }
        } else if flags.heavy_attack_active {
            ControlState::HeavyAttack {
                start: position,
                target_distance: HEAVY_ATTACK_DISTANCE,
            }
        } else if flags.ultimate_attack_active {
            ControlState::UltimateAttack {
                start: position,
                target_distance: ULTIMATE_ATTACK_DISTANCE,
            }
        } else if flags.is_in_normal_loop {
            ControlState::NormalLoop {
                started_at: now,
                angle,
            }
        } else if flags.is_in_blue_loop {
            ControlState::BlueLoop {
                started_at: now,
                angle,
                charge_point,
            }
        } else if flags.is_charge_dashing {
            ControlState::ChargeDashing { started_at: now }
        } else if flags.cinematic_active {
            ControlState::Cinematic {
                kind: CinematicKind::default(),
            }
        } else {
            ControlState::Free
        }
    }
}

/// Boolean expansion of [`ControlState`] for snapshots and the wire
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlFlags {
    pub is_dodging: bool,
    pub heavy_attack_active: bool,
    pub ultimate_attack_active: bool,
    pub is_in_normal_loop: bool,
    pub is_in_blue_loop: bool,
    pub is_charge_dashing: bool,
    pub cinematic_active: bool,
}

impl ControlFlags {
    /// Number of flags set; the invariant keeps this ≤ 1
    pub fn count_active(&self) -> usize {
        [
            self.is_dodging,
            self.heavy_attack_active,
            self.ultimate_attack_active,
            self.is_in_normal_loop,
            self.is_in_blue_loop,
            self.is_charge_dashing,
            self.cinematic_active,
        ]
        .iter()
        .filter(|f| **f)
        .count()
    }
}

/// Ability-readiness deadlines, in match-time seconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Cooldowns {
    pub dodge: f32,
    /// Shared by heavy and ultimate attacks
    pub attack: f32,
    pub normal_loop: f32,
    pub blue_loop: f32,
    pub cinematic: f32,
}

/// Per-match counters reported in the end-of-match summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatantTally {
    pub abilities_used: u32,
    pub collisions: u32,
    pub wall_bounces: u32,
}

/// One of the two battling tops
#[derive(Debug, Clone)]
pub struct Combatant {
    pub id: Uuid,
    pub loadout_id: String,
    pub name: String,
    pub is_local_player: bool,

    pub position: Vec2,
    pub velocity: Vec2,
    /// Visual rotation of the top itself, radians in [0, 2π)
    pub rotation: f32,

    /// Vitality; the top dies when this reaches 0
    pub spin: f32,
    pub max_spin: f32,
    /// Ability resource, bounded [0, POWER_MAX]
    pub power: f32,

    pub mass: f32,
    pub radius: f32,
    pub move_speed: f32,
    pub spin_direction: SpinDirection,

    /// Live cap on the derived acceleration stat
    pub current_max_accel: f32,
    /// Derived each tick from speed, clamped to the cap
    pub acceleration: f32,
    /// Steeper cap decay while a finished dash winds down
    pub dash_ending: bool,

    pub control: ControlState,
    pub cooldowns: Cooldowns,

    pub is_dead: bool,
    pub is_out_of_bounds: bool,
    /// One-tick grace after a wall bounce
    pub just_respawned: bool,

    /// Receipt stamp of the last applied network snapshot (remote side only)
    pub last_network_update: Option<u64>,

    pub tally: CombatantTally,
}

impl Combatant {
    pub fn new(loadout: &CombatantLoadout, spawn: Vec2, is_local_player: bool) -> Self {
        let stats = &loadout.stats;
        Self {
            id: Uuid::new_v4(),
            loadout_id: loadout.loadout_id.clone(),
            name: loadout.display_name.clone(),
            is_local_player,
            position: spawn,
            velocity: Vec2::ZERO,
            rotation: 0.0,
            spin: stats.max_spin,
            max_spin: stats.max_spin,
            power: 0.0,
            mass: stats.mass,
            radius: stats.radius,
            move_speed: stats.move_speed,
            spin_direction: stats.spin_direction,
            current_max_accel: NORMAL_MAX_ACCEL,
            acceleration: 0.0,
            dash_ending: false,
            control: ControlState::Free,
            cooldowns: Cooldowns::default(),
            is_dead: false,
            is_out_of_bounds: false,
            just_respawned: false,
            last_network_update: None,
            tally: CombatantTally::default(),
        }
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Alive and still inside the arena
    pub fn is_active(&self) -> bool {
        !self.is_dead && !self.is_out_of_bounds
    }

    pub fn control_flags(&self) -> ControlFlags {
        let mut flags = ControlFlags::default();
        match &self.control {
            ControlState::Free => {}
            ControlState::Dodging { .. } => flags.is_dodging = true,
            ControlState::HeavyAttack { .. } => flags.heavy_attack_active = true,
            ControlState::UltimateAttack { .. } => flags.ultimate_attack_active = true,
            ControlState::NormalLoop { .. } => flags.is_in_normal_loop = true,
            ControlState::BlueLoop { .. } => flags.is_in_blue_loop = true,
            ControlState::ChargeDashing { .. } => flags.is_charge_dashing = true,
            ControlState::Cinematic { .. } => flags.cinematic_active = true,
        }
        flags
    }

    /// Loop angle for snapshots, when riding either ring
    pub fn loop_angle(&self) -> Option<f32> {
        match &self.control {
            ControlState::NormalLoop { angle, .. } | ControlState::BlueLoop { angle, .. } => {
                Some(*angle)
            }
            _ => None,
        }
    }

    /// Selected blue-loop charge point, when riding it
    pub fn charge_point(&self) -> Option<f32> {
        match &self.control {
            ControlState::BlueLoop { charge_point, .. } => *charge_point,
            _ => None,
        }
    }

    /// Spin hit 0: the top falls over where it stands
    pub fn mark_spin_out(&mut self) {
        self.spin = 0.0;
        self.is_dead = true;
        self.velocity = Vec2::ZERO;
        self.control = ControlState::Free;
    }

    /// Crossed the boundary through an exit arc: permanently out
    pub fn mark_exited(&mut self) {
        self.is_dead = true;
        self.is_out_of_bounds = true;
        self.velocity = Vec2::ZERO;
        self.control = ControlState::Free;
    }

    /// Per-tick rules that run in every state: derived acceleration, cap
    /// decay/regain, rotation advance, and spin decay (suspended while the
    /// combatant rides the blue loop).
    pub fn apply_background(&mut self, dt: f32, match_elapsed: f32) {
        if self.is_dead {
            return;
        }

        self.acceleration = (self.speed() / ACCEL_SPEED_RATIO).min(self.current_max_accel);

        if matches!(self.control, ControlState::ChargeDashing { .. }) {
            // cap stays pinned for the duration of the dash
        } else if self.current_max_accel > NORMAL_MAX_ACCEL {
            let rate = if self.dash_ending {
                ACCEL_DECAY_DASH_END
            } else if match_elapsed < EARLY_MATCH_SECS {
                ACCEL_DECAY_EARLY
            } else {
                ACCEL_DECAY_LATE
            };
            let regain = self.speed() * ACCEL_REGAIN_PER_SPEED;
            let net = (rate - regain).max(0.0);
            self.current_max_accel = (self.current_max_accel - net * dt).max(NORMAL_MAX_ACCEL);
            if self.current_max_accel <= NORMAL_MAX_ACCEL {
                self.dash_ending = false;
            }
        } else {
            self.dash_ending = false;
        }

        let revs_per_sec = self.spin / ROTATION_REF_SPIN * ROTATION_REVS_AT_REF_SPIN;
        self.rotation =
            (self.rotation + self.spin_direction.sign() * revs_per_sec * TAU * dt).rem_euclid(TAU);

        if !matches!(self.control, ControlState::BlueLoop { .. }) {
            let decay = SPIN_DECAY_PER_SEC + SPIN_DRAG_FACTOR * self.speed();
            self.spin = (self.spin - decay * dt).max(0.0);
        }

        if self.spin <= 0.0 {
            self.mark_spin_out();
        }
    }
}
