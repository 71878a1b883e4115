//! Physics collaborator contracts and their built-in implementations

use glam::Vec2;

use crate::game::arena::Arena;
use crate::game::combatant::Combatant;

/// Generic velocity drag applied by the default integrator, per second
pub const LINEAR_DRAG_PER_SEC: f32 = 0.1;
/// Contact bounciness of the default collision response
pub const RESTITUTION: f32 = 0.8;
/// Spin bled per unit of collision force
pub const SPIN_LOSS_PER_FORCE: f32 = 0.02;

/// Applies velocity to position each tick. No ability awareness; control
/// states steer by writing velocity before integration runs.
pub trait Integrator {
    fn integrate(&self, combatant: &mut Combatant, dt: f32, arena: &Arena);
}

/// Geometric contact test and response between two tops
pub trait CollisionModel {
    fn detect(&self, a: &Combatant, b: &Combatant) -> bool;

    /// Separate the pair and exchange momentum; mutates both velocities and
    /// spins and returns the scalar collision force.
    fn resolve(&self, a: &mut Combatant, b: &mut Combatant) -> f32;
}

/// Built-in integrator: drag, then position update
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultIntegrator;

impl Integrator for DefaultIntegrator {
    fn integrate(&self, combatant: &mut Combatant, dt: f32, _arena: &Arena) {
        if combatant.is_dead {
            return;
        }
        combatant.velocity *= (1.0 - LINEAR_DRAG_PER_SEC * dt).max(0.0);
        combatant.position += combatant.velocity * dt;
    }
}

/// Built-in circle-overlap collision model
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCollisionModel;

impl CollisionModel for DefaultCollisionModel {
    fn detect(&self, a: &Combatant, b: &Combatant) -> bool {
        let delta = b.position - a.position;
        let combined = a.radius + b.radius;
        delta.length_squared() <= combined * combined
    }

    fn resolve(&self, a: &mut Combatant, b: &mut Combatant) -> f32 {
        let delta = b.position - a.position;
        let dist = delta.length();
        let combined = a.radius + b.radius;

        if dist < 0.001 {
            // same position, push apart arbitrarily
            a.position.x -= a.radius;
            b.position.x += b.radius;
            return 0.0;
        }

        let overlap = combined - dist;
        if overlap <= 0.0 {
            return 0.0;
        }

        let normal = delta / dist;

        // Push apart by half the overlap each, with a small buffer
        let push = overlap / 2.0 + 0.1;
        a.position -= normal * push;
        b.position += normal * push;

        // Impulse along the contact normal when the pair is closing
        let closing = (b.velocity - a.velocity).dot(normal);
        if closing >= 0.0 {
            return 0.0;
        }
        let inv_mass = 1.0 / a.mass + 1.0 / b.mass;
        let impulse = -(1.0 + RESTITUTION) * closing / inv_mass;
        a.velocity -= normal * (impulse / a.mass);
        b.velocity += normal * (impulse / b.mass);

        // Grinding contact bleeds spin from both tops; a heavier opponent
        // hits harder
        let force = impulse.abs();
        a.spin = (a.spin - force * SPIN_LOSS_PER_FORCE * (b.mass / a.mass)).max(0.0);
        b.spin = (b.spin - force * SPIN_LOSS_PER_FORCE * (a.mass / b.mass)).max(0.0);
        force
    }
}
