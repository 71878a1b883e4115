//! Arena geometry and the partitioned outer boundary

use std::f32::consts::TAU;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Width of each wall/exit arc on the outer boundary, in degrees
pub const SEGMENT_ARC_DEG: f32 = 60.0;

/// Raw arena parameters as fetched by the embedder (transport lives outside
/// this crate)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaConfig {
    pub center_x: f32,
    pub center_y: f32,
    pub normal_loop_radius: f32,
    pub charge_dash_radius: f32,
    pub inner_radius: f32,
    pub outer_radius: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            center_x: 0.0,
            center_y: 0.0,
            normal_loop_radius: 120.0,
            charge_dash_radius: 170.0,
            inner_radius: 210.0,
            outer_radius: 250.0,
        }
    }
}

/// Arena config validation failure
#[derive(Debug, Error)]
pub enum ArenaError {
    #[error("arena radii must be positive")]
    NonPositiveRadius,
    #[error("arena radii must satisfy normal_loop < charge_dash < inner < outer")]
    RadiusOrdering,
}

/// Kind of outer-boundary arc a crossing lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryKind {
    /// Bounce back into the arena
    Wall,
    /// Elimination
    Exit,
}

/// Validated arena geometry: concentric functional rings around a center,
/// with the outer boundary alternating three 60° wall arcs and three 60°
/// exit arcs (wall first at 0°).
#[derive(Debug, Clone)]
pub struct Arena {
    pub center: Vec2,
    pub normal_loop_radius: f32,
    pub charge_dash_radius: f32,
    pub inner_radius: f32,
    pub outer_radius: f32,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            center: Vec2::ZERO,
            normal_loop_radius: 120.0,
            charge_dash_radius: 170.0,
            inner_radius: 210.0,
            outer_radius: 250.0,
        }
    }
}

impl Arena {
    /// Map a fetched config into a validated arena
    pub fn from_config(config: &ArenaConfig) -> Result<Self, ArenaError> {
        if config.normal_loop_radius <= 0.0 {
            return Err(ArenaError::NonPositiveRadius);
        }
        let ordered = config.normal_loop_radius < config.charge_dash_radius
            && config.charge_dash_radius < config.inner_radius
            && config.inner_radius < config.outer_radius;
        if !ordered {
            return Err(ArenaError::RadiusOrdering);
        }
        Ok(Self {
            center: Vec2::new(config.center_x, config.center_y),
            normal_loop_radius: config.normal_loop_radius,
            charge_dash_radius: config.charge_dash_radius,
            inner_radius: config.inner_radius,
            outer_radius: config.outer_radius,
        })
    }

    pub fn distance_from_center(&self, point: Vec2) -> f32 {
        (point - self.center).length()
    }

    /// Polar angle of a point around the center, normalized to [0, 2π)
    pub fn polar_angle(&self, point: Vec2) -> f32 {
        let d = point - self.center;
        d.y.atan2(d.x).rem_euclid(TAU)
    }

    /// Point on a centered ring at the given polar angle
    pub fn point_on_ring(&self, radius: f32, angle: f32) -> Vec2 {
        self.center + Vec2::new(angle.cos(), angle.sin()) * radius
    }

    /// Whether a point sits within `tolerance` units of the given ring radius
    pub fn on_ring_band(&self, point: Vec2, radius: f32, tolerance: f32) -> bool {
        (self.distance_from_center(point) - radius).abs() <= tolerance
    }

    /// Classify an outer-boundary polar angle (radians) as wall or exit arc
    pub fn boundary_kind(&self, angle: f32) -> BoundaryKind {
        let deg = angle.rem_euclid(TAU).to_degrees();
        let segment = (deg / SEGMENT_ARC_DEG) as u32 % 6;
        if segment % 2 == 0 {
            BoundaryKind::Wall
        } else {
            BoundaryKind::Exit
        }
    }

    /// Boundary crossing test. Returns the arc kind and crossing angle once a
    /// position has reached or passed the outer radius.
    pub fn check_boundary(&self, position: Vec2) -> Option<(BoundaryKind, f32)> {
        if self.distance_from_center(position) < self.outer_radius {
            return None;
        }
        let angle = self.polar_angle(position);
        Some((self.boundary_kind(angle), angle))
    }

    /// Whether a point is within `margin` units of the outer boundary
    pub fn near_outer_boundary(&self, position: Vec2, margin: f32) -> bool {
        self.distance_from_center(position) >= self.outer_radius - margin
    }
}
