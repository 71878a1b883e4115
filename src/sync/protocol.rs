//! Wire types for the peer sync channel
//! These are the message shapes exchanged between the two clients

use serde::{Deserialize, Serialize};

use crate::game::combatant::{Combatant, ControlFlags, ControlState};
use crate::game::input::TriggerSet;

/// State of one combatant as sent over the wire. Every field is optional so
/// that partial updates apply only what they carry; absent fields keep the
/// receiver's previous value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatantUpdate {
    /// Position X
    pub x: Option<f32>,
    /// Position Y
    pub y: Option<f32>,
    /// Current velocity X
    pub vel_x: Option<f32>,
    /// Current velocity Y
    pub vel_y: Option<f32>,
    /// Visual rotation in radians
    pub rotation: Option<f32>,
    /// Remaining spin
    pub spin: Option<f32>,
    /// Derived acceleration
    pub acceleration: Option<f32>,
    /// Acceleration cap
    pub current_max_accel: Option<f32>,
    /// Ability resource
    pub power: Option<f32>,
    /// Control-owning state flags
    pub flags: Option<ControlFlags>,
    /// Loop progress angle, when in a loop
    pub loop_angle: Option<f32>,
    /// Chosen blue-loop charge point, when any
    pub charge_point: Option<f32>,
    pub is_dead: Option<bool>,
    pub is_out_of_bounds: Option<bool>,
}

impl CombatantUpdate {
    /// Full extract of the locally-simulated combatant
    pub fn of(c: &Combatant) -> Self {
        Self {
            x: Some(c.position.x),
            y: Some(c.position.y),
            vel_x: Some(c.velocity.x),
            vel_y: Some(c.velocity.y),
            rotation: Some(c.rotation),
            spin: Some(c.spin),
            acceleration: Some(c.acceleration),
            current_max_accel: Some(c.current_max_accel),
            power: Some(c.power),
            flags: Some(c.control_flags()),
            loop_angle: c.loop_angle(),
            charge_point: c.charge_point(),
            is_dead: Some(c.is_dead),
            is_out_of_bounds: Some(c.is_out_of_bounds),
        }
    }

    /// Merge the carried fields into `c`. `now` seeds state timers when the
    /// flags rebuild a control state the receiver was not already in.
    pub fn apply_to(&self, c: &mut Combatant, now: f32) {
        if let Some(x) = self.x {
            c.position.x = x;
        }
        if let Some(y) = self.y {
            c.position.y = y;
        }
        if let Some(vx) = self.vel_x {
            c.velocity.x = vx;
        }
        if let Some(vy) = self.vel_y {
            c.velocity.y = vy;
        }
        if let Some(rotation) = self.rotation {
            c.rotation = rotation;
        }
        if let Some(spin) = self.spin {
            c.spin = spin;
        }
        if let Some(acceleration) = self.acceleration {
            c.acceleration = acceleration;
        }
        if let Some(cap) = self.current_max_accel {
            c.current_max_accel = cap;
        }
        if let Some(power) = self.power {
            c.power = power;
        }
        if let Some(dead) = self.is_dead {
            c.is_dead = dead;
        }
        if let Some(oob) = self.is_out_of_bounds {
            c.is_out_of_bounds = oob;
        }
        if let Some(flags) = self.flags {
            let loop_angle = self.loop_angle.or(c.loop_angle());
            let charge_point = self.charge_point.or(c.charge_point());
            c.control = ControlState::from_flags(&flags, loop_angle, charge_point, c.position, now);
        } else if let Some(angle) = self.loop_angle {
            // angle-only refresh of an in-progress loop
            let flags = c.control_flags();
            let charge_point = self.charge_point.or(c.charge_point());
            c.control = ControlState::from_flags(&flags, Some(angle), charge_point, c.position, now);
        }
    }
}

/// Steering and triggers as sent over the wire
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteInput {
    /// Steering direction X (unit or zero)
    pub dir_x: f32,
    /// Steering direction Y
    pub dir_y: f32,
    pub triggers: TriggerSet,
}

/// Messages exchanged between the two clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PeerMsg {
    /// Session opener
    Hello {
        /// 1-based player number of the sender
        player: u8,
        display_name: String,
        loadout_id: String,
    },

    /// Authoritative state of the sender's combatant
    State {
        /// Sender-side monotonic sequence; receivers drop anything stale
        seq: u64,
        /// Sender wall clock, unix milliseconds
        sent_at: u64,
        update: CombatantUpdate,
    },

    /// The sender's current steering and triggers
    Input { seq: u64, input: RemoteInput },

    /// Session close
    Bye,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::loadout::{CatalogResolver, LoadoutResolver};
    use glam::Vec2;

    #[test]
    fn test_state_msg_tag_shape() {
        let msg = PeerMsg::State {
            seq: 7,
            sent_at: 123,
            update: CombatantUpdate {
                x: Some(1.0),
                ..Default::default()
            },
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"state""#));
        assert!(json.contains(r#""seq":7"#));
        let back: PeerMsg = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_partial_update_decodes_missing_fields_as_none() {
        let update: CombatantUpdate = serde_json::from_str(r#"{"x": 4.0, "spin": 88.0}"#).unwrap();
        assert_eq!(update.x, Some(4.0));
        assert_eq!(update.spin, Some(88.0));
        assert_eq!(update.vel_x, None);
        assert_eq!(update.flags, None);
    }

    #[test]
    fn test_apply_preserves_fields_not_carried() {
        let loadout = CatalogResolver.resolve("defense").unwrap();
        let mut c = Combatant::new(&loadout, Vec2::new(5.0, 6.0), false);
        c.velocity = Vec2::new(10.0, 20.0);
        c.power = 14.0;

        let update = CombatantUpdate {
            x: Some(-3.0),
            spin: Some(42.0),
            ..Default::default()
        };
        update.apply_to(&mut c, 1.0);

        assert_eq!(c.position, Vec2::new(-3.0, 6.0));
        assert_eq!(c.spin, 42.0);
        assert_eq!(c.velocity, Vec2::new(10.0, 20.0));
        assert_eq!(c.power, 14.0);
    }

    #[test]
    fn test_apply_rebuilds_control_state_from_flags() {
        let loadout = CatalogResolver.resolve("attack").unwrap();
        let mut c = Combatant::new(&loadout, Vec2::ZERO, false);

        let mut flags = ControlFlags::default();
        flags.is_in_blue_loop = true;
        let update = CombatantUpdate {
            flags: Some(flags),
            loop_angle: Some(1.25),
            charge_point: Some(2.6),
            ..Default::default()
        };
        update.apply_to(&mut c, 3.0);

        assert!(c.control_flags().is_in_blue_loop);
        assert_eq!(c.loop_angle(), Some(1.25));
        assert_eq!(c.charge_point(), Some(2.6));
    }

    #[test]
    fn test_full_extract_applies_cleanly() {
        let loadout = CatalogResolver.resolve("balance").unwrap();
        let mut source = Combatant::new(&loadout, Vec2::new(30.0, -12.0), true);
        source.spin = 66.6;
        source.power = 9.0;
        source.rotation = 1.5;

        let mut target = Combatant::new(&loadout, Vec2::ZERO, false);
        CombatantUpdate::of(&source).apply_to(&mut target, 0.0);

        assert_eq!(target.position, source.position);
        assert_eq!(target.spin, source.spin);
        assert_eq!(target.power, source.power);
        assert_eq!(target.rotation, source.rotation);
    }
}
