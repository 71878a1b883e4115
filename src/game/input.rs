//! Input aggregation: reduces keys, pointer drags, and virtual buttons to a
//! single direction vector plus discrete ability triggers per tick

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Minimum drag length before a pointer drag steers
pub const DRAG_THRESHOLD: f32 = 10.0;
/// Minimum top-to-pointer distance before the bare pointer steers
pub const POINTER_THRESHOLD: f32 = 10.0;

/// Held direction keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKey {
    Up,
    Down,
    Left,
    Right,
}

/// Discrete ability triggers a player can press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbilityTrigger {
    DodgeLeft,
    DodgeRight,
    HeavyAttack,
    CinematicMove,
}

/// Pending trigger flags; auto-cleared once the state machine consumes them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerSet {
    pub dodge_left: bool,
    pub dodge_right: bool,
    pub heavy_attack: bool,
    pub cinematic_move: bool,
}

impl TriggerSet {
    pub fn set(&mut self, trigger: AbilityTrigger) {
        match trigger {
            AbilityTrigger::DodgeLeft => self.dodge_left = true,
            AbilityTrigger::DodgeRight => self.dodge_right = true,
            AbilityTrigger::HeavyAttack => self.heavy_attack = true,
            AbilityTrigger::CinematicMove => self.cinematic_move = true,
        }
    }

    pub fn any(&self) -> bool {
        self.dodge_left || self.dodge_right || self.heavy_attack || self.cinematic_move
    }
}

/// What the state machine consumes for one combatant each tick
#[derive(Debug, Clone, Copy, Default)]
pub struct InputIntent {
    /// Unit-length steering direction, or zero when idle
    pub direction: Vec2,
    pub triggers: TriggerSet,
}

/// Single-writer input cell. Platform event callbacks (key, pointer, virtual
/// button) write it between frames; the tick reads it exactly once at tick
/// start. Pointer coordinates are expected in world space.
#[derive(Debug, Default)]
pub struct InputAggregator {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
    drag: Option<(Vec2, Vec2)>,
    pointer: Option<Vec2>,
    triggers: TriggerSet,
}

impl InputAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: MoveKey) {
        self.set_key(key, true);
    }

    pub fn key_up(&mut self, key: MoveKey) {
        self.set_key(key, false);
    }

    fn set_key(&mut self, key: MoveKey, held: bool) {
        match key {
            MoveKey::Up => self.up = held,
            MoveKey::Down => self.down = held,
            MoveKey::Left => self.left = held,
            MoveKey::Right => self.right = held,
        }
    }

    pub fn drag_start(&mut self, at: Vec2) {
        self.drag = Some((at, at));
    }

    pub fn drag_move(&mut self, to: Vec2) {
        if let Some((origin, _)) = self.drag {
            self.drag = Some((origin, to));
        }
    }

    pub fn drag_end(&mut self) {
        self.drag = None;
    }

    pub fn pointer_moved(&mut self, at: Vec2) {
        self.pointer = Some(at);
    }

    pub fn pointer_left(&mut self) {
        self.pointer = None;
    }

    /// Press an ability trigger (key, mouse button, or virtual button)
    pub fn press(&mut self, trigger: AbilityTrigger) {
        self.triggers.set(trigger);
    }

    fn key_vector(&self) -> Vec2 {
        let x = (self.right as i8 - self.left as i8) as f32;
        let y = (self.up as i8 - self.down as i8) as f32;
        Vec2::new(x, y)
    }

    /// Resolve the steering direction for a combatant at `origin`.
    /// Priority: held keys, then an active drag past its threshold, then the
    /// bare pointer past its threshold. Unit length or zero.
    pub fn direction(&self, origin: Vec2) -> Vec2 {
        let keys = self.key_vector();
        if keys != Vec2::ZERO {
            return keys.normalize();
        }
        if let Some((start, current)) = self.drag {
            let delta = current - start;
            if delta.length() > DRAG_THRESHOLD {
                return delta.normalize();
            }
        }
        if let Some(pointer) = self.pointer {
            let delta = pointer - origin;
            if delta.length() > POINTER_THRESHOLD {
                return delta.normalize();
            }
        }
        Vec2::ZERO
    }

    /// Tick-start read: current direction plus pending triggers, which are
    /// cleared by this call.
    pub fn take_intent(&mut self, origin: Vec2) -> InputIntent {
        let intent = InputIntent {
            direction: self.direction(origin),
            triggers: self.triggers,
        };
        self.triggers = TriggerSet::default();
        intent
    }

    /// Drop pending triggers without honoring them (countdown phase)
    pub fn discard_triggers(&mut self) {
        self.triggers = TriggerSet::default();
    }
}
