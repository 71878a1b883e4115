//! Cinematic move scripts. The engine only depends on the
//! [`CinematicDirector`] contract; [`BasicDirector`] is the built-in pair of
//! scripts used by the headless runner.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::game::arena::Arena;
use crate::game::combatant::Combatant;
use crate::game::PlayerSlot;

/// How long the announcement banner stays up before auto-hiding
pub const BANNER_DURATION: f32 = 2.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CinematicKind {
    #[default]
    Barrage,
    TimeSkip,
}

/// Tuning for the built-in scripts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CinematicConfig {
    pub barrage_strikes: u32,
    pub barrage_strike_duration: f32,
    pub strike_speed: f32,
    pub skip_windup: f32,
    pub skip_distance: f32,
    pub skip_strike_duration: f32,
}

impl Default for CinematicConfig {
    fn default() -> Self {
        Self {
            barrage_strikes: 3,
            barrage_strike_duration: 0.4,
            strike_speed: 450.0,
            skip_windup: 0.3,
            skip_distance: 40.0,
            skip_strike_duration: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CinematicStatus {
    Idle,
    Running,
    /// Returned exactly once, on the tick the script completes
    Finished,
}

/// Scripted-move collaborator. While a script runs it owns the actor's
/// velocity and position; the engine suspends both combatants' control input
/// and releases the actor when `advance` reports completion.
pub trait CinematicDirector {
    fn begin(&mut self, kind: CinematicKind, actor: PlayerSlot, now: f32);
    fn advance(
        &mut self,
        combatants: &mut [Combatant],
        arena: &Arena,
        now: f32,
        dt: f32,
    ) -> CinematicStatus;
    fn active(&self) -> bool;
    fn actor(&self) -> Option<PlayerSlot>;
    /// Drop any in-progress script without completing it
    fn cancel(&mut self);
}

#[derive(Debug, Clone)]
struct ActiveScript {
    kind: CinematicKind,
    actor: PlayerSlot,
    started_at: f32,
    strikes_fired: u32,
    skipped: bool,
}

/// Built-in scripts: a barrage of straight strikes, or a wind-up teleport
/// behind the opponent followed by a single strike through them.
#[derive(Debug, Default)]
pub struct BasicDirector {
    config: CinematicConfig,
    script: Option<ActiveScript>,
}

impl BasicDirector {
    pub fn new(config: CinematicConfig) -> Self {
        Self {
            config,
            script: None,
        }
    }
}

impl CinematicDirector for BasicDirector {
    fn begin(&mut self, kind: CinematicKind, actor: PlayerSlot, now: f32) {
        debug!(?kind, ?actor, "cinematic script started");
        self.script = Some(ActiveScript {
            kind,
            actor,
            started_at: now,
            strikes_fired: 0,
            skipped: false,
        });
    }

    fn advance(
        &mut self,
        combatants: &mut [Combatant],
        _arena: &Arena,
        now: f32,
        _dt: f32,
    ) -> CinematicStatus {
        let Some(mut script) = self.script.take() else {
            return CinematicStatus::Idle;
        };
        let actor_index = script.actor.index();
        let target_index = script.actor.other().index();
        let Some(target_pos) = combatants.get(target_index).map(|t| t.position) else {
            // missing combatant is a no-op for this tick, not a failure
            self.script = Some(script);
            return CinematicStatus::Running;
        };
        if combatants.get(actor_index).is_none() {
            self.script = Some(script);
            return CinematicStatus::Running;
        }

        let elapsed = now - script.started_at;
        let status = match script.kind {
            CinematicKind::Barrage => {
                let total =
                    self.config.barrage_strikes as f32 * self.config.barrage_strike_duration;
                if elapsed >= total {
                    CinematicStatus::Finished
                } else {
                    let due = (elapsed / self.config.barrage_strike_duration) as u32 + 1;
                    if script.strikes_fired < due.min(self.config.barrage_strikes) {
                        script.strikes_fired = due;
                        let actor = &mut combatants[actor_index];
                        let dir = (target_pos - actor.position).normalize_or_zero();
                        let dir = if dir == Vec2::ZERO { Vec2::X } else { dir };
                        actor.velocity = dir * self.config.strike_speed;
                    }
                    CinematicStatus::Running
                }
            }
            CinematicKind::TimeSkip => {
                if elapsed < self.config.skip_windup {
                    combatants[actor_index].velocity = Vec2::ZERO;
                    CinematicStatus::Running
                } else if !script.skipped {
                    script.skipped = true;
                    let actor = &mut combatants[actor_index];
                    let through = (target_pos - actor.position).normalize_or_zero();
                    let through = if through == Vec2::ZERO { Vec2::X } else { through };
                    actor.position = target_pos + through * self.config.skip_distance;
                    actor.velocity = -through * self.config.strike_speed;
                    CinematicStatus::Running
                } else if elapsed >= self.config.skip_windup + self.config.skip_strike_duration {
                    CinematicStatus::Finished
                } else {
                    CinematicStatus::Running
                }
            }
        };

        if status == CinematicStatus::Running {
            self.script = Some(script);
        }
        status
    }

    fn active(&self) -> bool {
        self.script.is_some()
    }

    fn actor(&self) -> Option<PlayerSlot> {
        self.script.as_ref().map(|s| s.actor)
    }

    fn cancel(&mut self) {
        self.script = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::loadout::{CatalogResolver, LoadoutResolver};

    fn pair() -> Vec<Combatant> {
        let a = CatalogResolver.resolve("attack").unwrap();
        let b = CatalogResolver.resolve("defense").unwrap();
        vec![
            Combatant::new(&a, Vec2::new(-60.0, 0.0), true),
            Combatant::new(&b, Vec2::new(60.0, 0.0), false),
        ]
    }

    #[test]
    fn test_barrage_strikes_toward_target_and_finishes() {
        let arena = Arena::default();
        let mut combatants = pair();
        let mut director = BasicDirector::default();
        director.begin(CinematicKind::Barrage, PlayerSlot::One, 0.0);
        assert!(director.active());

        let status = director.advance(&mut combatants, &arena, 0.016, 0.016);
        assert_eq!(status, CinematicStatus::Running);
        assert!(combatants[0].velocity.x > 0.0, "first strike aims right");

        let total = 3.0 * 0.4;
        let status = director.advance(&mut combatants, &arena, total + 0.01, 0.016);
        assert_eq!(status, CinematicStatus::Finished);
        assert!(!director.active());
    }

    #[test]
    fn test_time_skip_teleports_behind_target() {
        let arena = Arena::default();
        let mut combatants = pair();
        let mut director = BasicDirector::default();
        director.begin(CinematicKind::TimeSkip, PlayerSlot::One, 0.0);

        // wind-up pins the actor in place
        director.advance(&mut combatants, &arena, 0.1, 0.016);
        assert_eq!(combatants[0].velocity, Vec2::ZERO);

        director.advance(&mut combatants, &arena, 0.35, 0.016);
        let config = CinematicConfig::default();
        assert_eq!(
            combatants[0].position,
            Vec2::new(60.0 + config.skip_distance, 0.0)
        );
        assert!(combatants[0].velocity.x < 0.0, "strikes back through target");

        let status = director.advance(&mut combatants, &arena, 0.9, 0.016);
        assert_eq!(status, CinematicStatus::Finished);
    }

    #[test]
    fn test_advance_without_script_is_idle() {
        let arena = Arena::default();
        let mut combatants = pair();
        let mut director = BasicDirector::default();
        assert_eq!(
            director.advance(&mut combatants, &arena, 0.0, 0.016),
            CinematicStatus::Idle
        );
    }

    #[test]
    fn test_missing_combatant_is_a_no_op_tick() {
        let arena = Arena::default();
        let mut lone = pair();
        lone.truncate(1);
        let mut director = BasicDirector::default();
        director.begin(CinematicKind::Barrage, PlayerSlot::One, 0.0);
        let status = director.advance(&mut lone, &arena, 0.1, 0.016);
        assert_eq!(status, CinematicStatus::Running);
        assert!(director.active());
    }

    #[test]
    fn test_cancel_drops_script() {
        let mut director = BasicDirector::default();
        director.begin(CinematicKind::TimeSkip, PlayerSlot::Two, 1.0);
        director.cancel();
        assert!(!director.active());
        assert_eq!(director.actor(), None);
    }
}
