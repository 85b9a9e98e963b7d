//! Rays and ray-cast results

use crate::foundation::math::{Vec3, DIRECTION_EPSILON};
use crate::world::collider::ColliderHandle;

/// A ray for ray casting and spatial queries
///
/// The direction is unit length by construction; the fallible constructors
/// reject near-zero directions so downstream tests never divide by zero.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// The origin point of the ray in world space
    pub origin: Vec3,
    /// The direction of the ray (unit length)
    pub direction: Vec3,
}

impl Ray {
    /// Creates a ray from an origin and a direction, normalizing the
    /// direction
    ///
    /// Returns `None` when the direction is too short to normalize.
    pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
        let length = direction.magnitude();
        if !length.is_finite() || length < DIRECTION_EPSILON {
            return None;
        }
        Some(Self {
            origin,
            direction: direction / length,
        })
    }

    /// Creates a ray passing from `origin` toward `target`
    ///
    /// Returns `None` when the two points (nearly) coincide.
    pub fn from_points(origin: Vec3, target: Vec3) -> Option<Self> {
        Self::new(origin, target - origin)
    }

    /// Get a point along the ray at distance `t`
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Result of a ray or shape cast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// The collider that was hit
    pub collider: ColliderHandle,
    /// The point of intersection in world space
    pub point: Vec3,
    /// The surface normal at the intersection point
    pub normal: Vec3,
    /// The distance from the ray origin to the hit point (always >= 0)
    pub distance: f32,
}
