//! Pairwise contact orchestration. Detection and resolution are delegated to
//! the [`CollisionModel`] collaborator; this layer decides who participates,
//! keeps tallies, and forwards reports for network arbitration.

use glam::Vec2;
use serde::Serialize;
use tracing::trace;
use uuid::Uuid;

use crate::game::combatant::Combatant;
use crate::game::events::MatchEvent;
use crate::game::physics::CollisionModel;

/// One side of a resolved contact, with spin captured before and after
#[derive(Debug, Clone, Serialize)]
pub struct CollisionParticipant {
    pub id: Uuid,
    pub position: Vec2,
    pub velocity: Vec2,
    pub spin_before: f32,
    pub spin_after: f32,
}

/// Payload handed to the collision callback for network-layer arbitration
#[derive(Debug, Clone, Serialize)]
pub struct CollisionReport {
    pub force: f32,
    pub first: CollisionParticipant,
    pub second: CollisionParticipant,
}

pub struct CollisionOrchestrator;

impl CollisionOrchestrator {
    /// Check every unordered pair of alive, in-bounds combatants. Resolution
    /// always runs locally; the callback receives the report afterwards.
    pub fn run(
        combatants: &mut [Combatant],
        model: &dyn CollisionModel,
        mut on_collision: Option<&mut (dyn FnMut(&CollisionReport) + '_)>,
        events: &mut Vec<MatchEvent>,
    ) -> u32 {
        let mut contacts = 0;
        for i in 0..combatants.len() {
            for j in (i + 1)..combatants.len() {
                let (head, tail) = combatants.split_at_mut(j);
                let a = &mut head[i];
                let b = &mut tail[0];
                if !a.is_active() || !b.is_active() {
                    continue;
                }
                if !model.detect(a, b) {
                    continue;
                }

                let spin_before = (a.spin, b.spin);
                let force = model.resolve(a, b);
                a.tally.collisions += 1;
                b.tally.collisions += 1;
                contacts += 1;
                trace!(force, "contact resolved");
                events.push(MatchEvent::Collision { force });

                if let Some(callback) = on_collision.as_mut() {
                    let report = CollisionReport {
                        force,
                        first: CollisionParticipant {
                            id: a.id,
                            position: a.position,
                            velocity: a.velocity,
                            spin_before: spin_before.0,
                            spin_after: a.spin,
                        },
                        second: CollisionParticipant {
                            id: b.id,
                            position: b.position,
                            velocity: b.velocity,
                            spin_before: spin_before.1,
                            spin_after: b.spin,
                        },
                    };
                    callback(&report);
                }
            }
        }
        contacts
    }
}
