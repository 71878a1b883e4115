//! Read-only per-tick views of the match, for rendering and outbound sync

use glam::Vec2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::cinematic::CinematicKind;
use crate::game::combatant::{Combatant, CombatantTally, ControlFlags, Cooldowns};
use crate::game::events::MatchEvent;
use crate::game::r#match::MatchState;
use crate::game::PlayerSlot;

/// Everything a renderer or the network layer needs to know about one top
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatantView {
    pub id: Uuid,
    pub loadout_id: String,
    pub name: String,
    pub is_local_player: bool,
    pub position: Vec2,
    pub velocity: Vec2,
    pub rotation: f32,
    pub spin: f32,
    pub max_spin: f32,
    pub power: f32,
    pub acceleration: f32,
    pub current_max_accel: f32,
    pub flags: ControlFlags,
    pub loop_angle: Option<f32>,
    pub charge_point: Option<f32>,
    pub is_dead: bool,
    pub is_out_of_bounds: bool,
    pub just_respawned: bool,
    pub cooldowns: Cooldowns,
    pub tally: CombatantTally,
}

impl CombatantView {
    pub fn of(c: &Combatant) -> Self {
        Self {
            id: c.id,
            loadout_id: c.loadout_id.clone(),
            name: c.name.clone(),
            is_local_player: c.is_local_player,
            position: c.position,
            velocity: c.velocity,
            rotation: c.rotation,
            spin: c.spin,
            max_spin: c.max_spin,
            power: c.power,
            acceleration: c.acceleration,
            current_max_accel: c.current_max_accel,
            flags: c.control_flags(),
            loop_angle: c.loop_angle(),
            charge_point: c.charge_point(),
            is_dead: c.is_dead,
            is_out_of_bounds: c.is_out_of_bounds,
            just_respawned: c.just_respawned,
            cooldowns: c.cooldowns,
            tally: c.tally,
        }
    }
}

/// One committed tick, safe to hand to consumers between frames
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub tick: u64,
    pub elapsed: f32,
    pub is_playing: bool,
    pub countdown_active: bool,
    pub countdown_value: u8,
    pub banner: Option<CinematicKind>,
    pub winner: Option<PlayerSlot>,
    pub combatants: Vec<CombatantView>,
    pub events: Vec<MatchEvent>,
}

impl MatchSnapshot {
    pub fn capture(state: &MatchState, events: Vec<MatchEvent>) -> Self {
        Self {
            tick: state.tick,
            elapsed: state.elapsed,
            is_playing: state.is_playing,
            countdown_active: state.countdown_active,
            countdown_value: state.countdown_value,
            banner: state.banner,
            winner: state.winner,
            combatants: state.combatants.iter().map(CombatantView::of).collect(),
            events,
        }
    }
}

/// Regulates how often full snapshots go out to consumers that do not want
/// one every tick (network senders, replay logs)
pub struct SnapshotBuilder {
    /// Tick counter since last snapshot
    ticks_since_snapshot: u32,
    /// Snapshot interval in ticks
    snapshot_interval: u32,
}

impl SnapshotBuilder {
    pub fn new(snapshot_interval: u32) -> Self {
        Self {
            ticks_since_snapshot: 0,
            snapshot_interval: snapshot_interval.max(1),
        }
    }

    /// Check if it's time to send a snapshot
    pub fn should_send(&mut self) -> bool {
        self.ticks_since_snapshot += 1;
        if self.ticks_since_snapshot >= self.snapshot_interval {
            self.ticks_since_snapshot = 0;
            true
        } else {
            false
        }
    }

    /// Force a snapshot on the next check (used after important events)
    pub fn force_next(&mut self) {
        self.ticks_since_snapshot = self.snapshot_interval;
    }

    pub fn build(&self, state: &MatchState, events: Vec<MatchEvent>) -> MatchSnapshot {
        MatchSnapshot::capture(state, events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::combatant::ControlState;
    use crate::game::loadout::{CatalogResolver, LoadoutResolver};

    #[test]
    fn test_view_mirrors_combatant() {
        let loadout = CatalogResolver.resolve("stamina").unwrap();
        let mut c = Combatant::new(&loadout, Vec2::new(10.0, -4.0), true);
        c.spin = 77.0;
        c.power = 12.5;
        c.control = ControlState::BlueLoop {
            started_at: 1.0,
            angle: 0.5,
            charge_point: Some(2.0),
        };

        let view = CombatantView::of(&c);
        assert_eq!(view.position, Vec2::new(10.0, -4.0));
        assert_eq!(view.spin, 77.0);
        assert_eq!(view.power, 12.5);
        assert!(view.flags.is_in_blue_loop);
        assert_eq!(view.flags.count_active(), 1);
        assert_eq!(view.loop_angle, Some(0.5));
        assert_eq!(view.charge_point, Some(2.0));
    }

    #[test]
    fn test_builder_cadence() {
        let mut builder = SnapshotBuilder::new(3);
        assert!(!builder.should_send());
        assert!(!builder.should_send());
        assert!(builder.should_send());
        assert!(!builder.should_send());
    }

    #[test]
    fn test_force_next_overrides_cadence() {
        let mut builder = SnapshotBuilder::new(100);
        builder.force_next();
        assert!(builder.should_send());
        assert!(!builder.should_send());
    }
}
