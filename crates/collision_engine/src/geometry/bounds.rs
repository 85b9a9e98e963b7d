//! Axis-aligned and oriented bounding boxes
//!
//! The `Aabb` is the currency of the broad phase: every registered collider
//! caches one, the spatial hash buckets by them, and sweep queries inflate
//! them. The `Obb` exists only to be conservatively reduced to an `Aabb`.

use crate::foundation::math::{Mat3, Vec3};

/// An axis-aligned bounding box stored as center + half-extents
///
/// Half-extents are non-negative on every axis; the constructors enforce
/// this, so `min()`/`max()` are always ordered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Center of the box in world space
    pub center: Vec3,
    /// Half-size of the box along each axis (always >= 0)
    pub extents: Vec3,
}

impl Aabb {
    /// Create a new AABB from a center and half-extents
    ///
    /// Negative extents are taken as their absolute value.
    pub fn new(center: Vec3, extents: Vec3) -> Self {
        Self {
            center,
            extents: extents.abs(),
        }
    }

    /// Create an AABB from minimum and maximum corners
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self::new((min + max) * 0.5, (max - min) * 0.5)
    }

    /// Minimum corner of the box
    pub fn min(&self) -> Vec3 {
        self.center - self.extents
    }

    /// Maximum corner of the box
    pub fn max(&self) -> Vec3 {
        self.center + self.extents
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        let min = self.min();
        let max = self.max();
        point.x >= min.x && point.x <= max.x &&
        point.y >= min.y && point.y <= max.y &&
        point.z >= min.z && point.z <= max.z
    }

    /// Check if this AABB intersects another AABB
    pub fn intersects(&self, other: &Aabb) -> bool {
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());
        a_min.x <= b_max.x && a_max.x >= b_min.x &&
        a_min.y <= b_max.y && a_max.y >= b_min.y &&
        a_min.z <= b_max.z && a_max.z >= b_min.z
    }

    /// Smallest AABB enclosing both boxes
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::from_min_max(
            self.min().inf(&other.min()),
            self.max().sup(&other.max()),
        )
    }

    /// Return this box grown by `amount` on each axis (Minkowski-sum helper
    /// for sweep queries)
    pub fn inflated(&self, amount: Vec3) -> Aabb {
        Aabb::new(self.center, self.extents + amount.abs())
    }

    /// Closest point on or inside the box to `point`
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let min = self.min();
        let max = self.max();
        Vec3::new(
            point.x.clamp(min.x, max.x),
            point.y.clamp(min.y, max.y),
            point.z.clamp(min.z, max.z),
        )
    }

    /// Test ray intersection with this AABB using the slab method
    ///
    /// Per axis, the entry/exit parametric distances are intersected while
    /// tracking which axis produced the running entry distance; that axis
    /// (with the sign facing the ray) is the surface normal. Returns
    /// `(distance, normal)` of the entry point, with distance clamped to 0
    /// when the ray starts inside, or `None` when the intervals separate or
    /// the box is entirely behind the origin.
    pub fn intersect_ray(&self, origin: Vec3, direction: Vec3) -> Option<(f32, Vec3)> {
        let min = self.min();
        let max = self.max();

        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;
        let mut entry_axis = 0;
        let mut entry_sign = -1.0_f32;

        for axis in 0..3 {
            let o = origin[axis];
            let d = direction[axis];
            if d.abs() < f32::EPSILON {
                // Parallel to the slab: miss unless the origin lies inside it
                if o < min[axis] || o > max[axis] {
                    return None;
                }
                continue;
            }

            let inv_d = 1.0 / d;
            let mut t1 = (min[axis] - o) * inv_d;
            let mut t2 = (max[axis] - o) * inv_d;
            let mut sign = if d > 0.0 { -1.0 } else { 1.0 };
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
                sign = -sign;
            }

            if t1 > t_min {
                t_min = t1;
                entry_axis = axis;
                entry_sign = sign;
            }
            t_max = t_max.min(t2);

            if t_min > t_max {
                return None;
            }
        }

        if t_max < 0.0 {
            return None; // Box entirely behind the ray
        }

        let mut normal = Vec3::zeros();
        normal[entry_axis] = entry_sign;
        Some((t_min.max(0.0), normal))
    }
}

/// An oriented bounding box: center, half-size, and an orthonormal basis
///
/// Used only to derive a conservative world-space `Aabb`; narrow-phase tests
/// operate on the reduced box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obb {
    /// Center of the box in world space
    pub center: Vec3,
    /// Half-size along each local axis
    pub half_size: Vec3,
    /// Orthonormal orientation basis (columns are the local axes)
    pub basis: Mat3,
}

impl Obb {
    /// Create a new OBB from center, half-size, and orientation basis
    pub fn new(center: Vec3, half_size: Vec3, basis: Mat3) -> Self {
        Self {
            center,
            half_size: half_size.abs(),
            basis,
        }
    }

    /// Create an axis-aligned OBB (identity basis)
    pub fn axis_aligned(center: Vec3, half_size: Vec3) -> Self {
        Self::new(center, half_size, Mat3::identity())
    }

    /// Conservative enclosing AABB
    ///
    /// Each world-axis extent is the sum of the absolute basis-column
    /// projections scaled by the half-size, so the result encloses the OBB
    /// under any orientation.
    pub fn to_aabb(&self) -> Aabb {
        let extents = self.basis.abs() * self.half_size;
        Aabb::new(self.center, extents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_min_max_derivation() {
        let aabb = Aabb::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.5, 1.0, 1.5));
        assert_eq!(aabb.min(), Vec3::new(0.5, 1.0, 1.5));
        assert_eq!(aabb.max(), Vec3::new(1.5, 3.0, 4.5));
    }

    #[test]
    fn test_negative_extents_normalized() {
        let aabb = Aabb::new(Vec3::zeros(), Vec3::new(-1.0, 2.0, -3.0));
        assert_eq!(aabb.extents, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_intersects_touching_faces() {
        let a = Aabb::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let b = Aabb::new(Vec3::new(2.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let c = Aabb::new(Vec3::new(2.1, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        assert!(a.intersects(&b)); // Touching counts as overlap
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_ray_hits_front_face() {
        let aabb = Aabb::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let (distance, normal) = aabb
            .intersect_ray(Vec3::new(0.0, 0.0, -10.0), Vec3::new(0.0, 0.0, 1.0))
            .expect("ray should hit");
        assert_relative_eq!(distance, 9.0);
        assert_eq!(normal, Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_ray_misses_behind() {
        let aabb = Aabb::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let result = aabb.intersect_ray(Vec3::new(0.0, 0.0, -10.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(result.is_none());
    }

    #[test]
    fn test_ray_parallel_slab_outside() {
        let aabb = Aabb::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        // Parallel to X, offset above the box on Y
        let result = aabb.intersect_ray(Vec3::new(-10.0, 5.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(result.is_none());
    }

    #[test]
    fn test_ray_origin_inside_clamps_to_zero() {
        let aabb = Aabb::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let (distance, _) = aabb
            .intersect_ray(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0))
            .expect("ray from inside should report a hit");
        assert_relative_eq!(distance, 0.0);
    }

    #[test]
    fn test_obb_identity_matches_aabb() {
        let obb = Obb::axis_aligned(Vec3::new(1.0, 0.0, 0.0), Vec3::new(1.0, 2.0, 3.0));
        let aabb = obb.to_aabb();
        assert_eq!(aabb.center, Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(aabb.extents.x, 1.0);
        assert_relative_eq!(aabb.extents.y, 2.0);
        assert_relative_eq!(aabb.extents.z, 3.0);
    }

    #[test]
    fn test_obb_rotated_is_conservative() {
        // 45 degrees around Z: a unit box's XY extent grows to sqrt(2)
        let angle = std::f32::consts::FRAC_PI_4;
        let basis = Mat3::new(
            angle.cos(), -angle.sin(), 0.0,
            angle.sin(), angle.cos(), 0.0,
            0.0, 0.0, 1.0,
        );
        let obb = Obb::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0), basis);
        let aabb = obb.to_aabb();
        assert_relative_eq!(aabb.extents.x, 2.0_f32.sqrt(), epsilon = 1e-5);
        assert_relative_eq!(aabb.extents.y, 2.0_f32.sqrt(), epsilon = 1e-5);
        assert_relative_eq!(aabb.extents.z, 1.0);
    }
}
