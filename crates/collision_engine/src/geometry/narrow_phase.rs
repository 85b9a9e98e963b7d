//! Narrow-phase pairwise contact tests
//!
//! Pure functions with no shared state. Each test returns `Some(Contact)`
//! when the shapes touch and `None` otherwise; callers never see NaN or a
//! panic, even for zero-length capsule segments or coincident centers.
//!
//! Normal convention: every test reports a unit normal pointing from the
//! *second* shape toward the *first*, i.e. the direction that pushes the
//! first shape out of the second.

use crate::foundation::math::{Vec3, DIRECTION_EPSILON};
use crate::geometry::bounds::Aabb;

/// A single narrow-phase contact: world point, unit normal, and penetration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// World-space contact point
    pub point: Vec3,
    /// Unit contact normal
    pub normal: Vec3,
    /// Penetration depth (always >= 0)
    pub penetration: f32,
}

impl Contact {
    /// A zero contact for overlap-only detections where no narrow-phase
    /// geometry applies
    pub fn overlap_only(point: Vec3) -> Self {
        Self {
            point,
            normal: Vec3::zeros(),
            penetration: 0.0,
        }
    }

    /// The same contact seen from the other shape's side
    pub fn flipped(&self) -> Self {
        Self {
            point: self.point,
            normal: -self.normal,
            penetration: self.penetration,
        }
    }
}

/// Fallback normal for fully degenerate configurations (coincident centers)
fn degenerate_normal() -> Vec3 {
    Vec3::y()
}

/// AABB vs AABB contact using the minimum-translation-vector heuristic
///
/// Per axis the penetration is `min(a_max - b_min, b_max - a_min)`; the
/// contact normal is the axis and sign of minimum penetration, ties broken
/// in X, Y, Z order.
pub fn aabb_aabb(a: &Aabb, b: &Aabb) -> Option<Contact> {
    let (a_min, a_max) = (a.min(), a.max());
    let (b_min, b_max) = (b.min(), b.max());

    let mut min_penetration = f32::INFINITY;
    let mut min_axis = 0;
    for axis in 0..3 {
        let overlap = (a_max[axis] - b_min[axis]).min(b_max[axis] - a_min[axis]);
        if overlap < 0.0 {
            return None; // Separating axis
        }
        if overlap < min_penetration {
            min_penetration = overlap;
            min_axis = axis;
        }
    }

    let mut normal = Vec3::zeros();
    normal[min_axis] = if a.center[min_axis] >= b.center[min_axis] {
        1.0
    } else {
        -1.0
    };

    // Center of the overlap region
    let point = Vec3::new(
        0.5 * (a_min.x.max(b_min.x) + a_max.x.min(b_max.x)),
        0.5 * (a_min.y.max(b_min.y) + a_max.y.min(b_max.y)),
        0.5 * (a_min.z.max(b_min.z) + a_max.z.min(b_max.z)),
    );

    Some(Contact {
        point,
        normal,
        penetration: min_penetration,
    })
}

/// Sphere vs AABB contact via closest-point clamping
///
/// When the sphere center sits exactly on the closest point (center inside
/// the box), the normal falls back to the nearest face by per-face distance.
pub fn sphere_aabb(center: Vec3, radius: f32, aabb: &Aabb) -> Option<Contact> {
    if !radius.is_finite() || radius < 0.0 {
        return None;
    }

    let closest = aabb.closest_point(center);
    let delta = center - closest;
    let distance_sq = delta.magnitude_squared();
    if distance_sq > radius * radius {
        return None;
    }

    let distance = distance_sq.sqrt();
    if distance > DIRECTION_EPSILON {
        return Some(Contact {
            point: closest,
            normal: delta / distance,
            penetration: radius - distance,
        });
    }

    // Degenerate: center on the surface or inside the box. Push out through
    // the nearest face.
    let min = aabb.min();
    let max = aabb.max();
    let mut face_depth = f32::INFINITY;
    let mut normal = degenerate_normal();
    for axis in 0..3 {
        let to_max = max[axis] - center[axis];
        if to_max < face_depth {
            face_depth = to_max;
            normal = Vec3::zeros();
            normal[axis] = 1.0;
        }
        let to_min = center[axis] - min[axis];
        if to_min < face_depth {
            face_depth = to_min;
            normal = Vec3::zeros();
            normal[axis] = -1.0;
        }
    }

    Some(Contact {
        point: closest,
        normal,
        penetration: radius + face_depth.max(0.0),
    })
}

/// Capsule vs AABB contact
///
/// The capsule is reduced to the sphere at the segment point nearest the box
/// center, then tested as sphere-vs-AABB (same degenerate fallback).
pub fn capsule_aabb(start: Vec3, end: Vec3, radius: f32, aabb: &Aabb) -> Option<Contact> {
    let on_segment = closest_point_on_segment(start, end, aabb.center);
    sphere_aabb(on_segment, radius, aabb)
}

/// Capsule vs sphere contact
pub fn capsule_sphere(
    start: Vec3,
    end: Vec3,
    capsule_radius: f32,
    center: Vec3,
    sphere_radius: f32,
) -> Option<Contact> {
    let on_segment = closest_point_on_segment(start, end, center);
    contact_between_points(on_segment, center, capsule_radius + sphere_radius)
}

/// Capsule vs capsule contact via segment-segment closest points
pub fn capsule_capsule(
    start_a: Vec3,
    end_a: Vec3,
    radius_a: f32,
    start_b: Vec3,
    end_b: Vec3,
    radius_b: f32,
) -> Option<Contact> {
    let (on_a, on_b) = closest_points_on_segments(start_a, end_a, start_b, end_b);
    contact_between_points(on_a, on_b, radius_a + radius_b)
}

/// Sphere vs sphere contact
pub fn sphere_sphere(
    center_a: Vec3,
    radius_a: f32,
    center_b: Vec3,
    radius_b: f32,
) -> Option<Contact> {
    contact_between_points(center_a, center_b, radius_a + radius_b)
}

/// Build a contact from two closest points and the summed radii
///
/// The normal points from `on_b` toward `on_a`; coincident points fall back
/// to a fixed axis so penetration is still reported (never NaN).
fn contact_between_points(on_a: Vec3, on_b: Vec3, radii_sum: f32) -> Option<Contact> {
    if !radii_sum.is_finite() || radii_sum < 0.0 {
        return None;
    }

    let delta = on_a - on_b;
    let distance_sq = delta.magnitude_squared();
    if distance_sq > radii_sum * radii_sum {
        return None;
    }

    let distance = distance_sq.sqrt();
    let normal = if distance > DIRECTION_EPSILON {
        delta / distance
    } else {
        degenerate_normal()
    };

    Some(Contact {
        point: (on_a + on_b) * 0.5,
        normal,
        penetration: radii_sum - distance,
    })
}

/// Closest point on segment `[a, b]` to `point`
///
/// A zero-length segment degenerates to its start point.
pub fn closest_point_on_segment(a: Vec3, b: Vec3, point: Vec3) -> Vec3 {
    let ab = b - a;
    let length_sq = ab.magnitude_squared();
    if length_sq < DIRECTION_EPSILON * DIRECTION_EPSILON {
        return a;
    }
    let t = ((point - a).dot(&ab) / length_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Closest points between segments `[p1, q1]` and `[p2, q2]`
///
/// Ericson, Real-Time Collision Detection 5.1.9: solve for the clamped
/// parameters `s, t` in [0, 1] minimizing squared distance, explicitly
/// handling both segments degenerating to points, either one degenerating,
/// and the general case with re-clamping when the unclamped parameter of
/// one segment lands outside [0, 1].
pub fn closest_points_on_segments(p1: Vec3, q1: Vec3, p2: Vec3, q2: Vec3) -> (Vec3, Vec3) {
    const EPSILON: f32 = 1e-10;

    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.magnitude_squared();
    let e = d2.magnitude_squared();
    let f = d2.dot(&r);

    // Both segments degenerate to points
    if a <= EPSILON && e <= EPSILON {
        return (p1, p2);
    }

    let (s, t);
    if a <= EPSILON {
        // First segment is a point
        s = 0.0;
        t = (f / e).clamp(0.0, 1.0);
    } else {
        let c = d1.dot(&r);
        if e <= EPSILON {
            // Second segment is a point
            t = 0.0;
            s = (-c / a).clamp(0.0, 1.0);
        } else {
            // General non-degenerate case
            let b = d1.dot(&d2);
            let denom = a * e - b * b;

            let mut s_val = if denom > EPSILON {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                // Parallel segments: pick an arbitrary s (0) and let t follow
                0.0
            };

            let t_unclamped = (b * s_val + f) / e;
            let t_val = if t_unclamped < 0.0 {
                s_val = (-c / a).clamp(0.0, 1.0);
                0.0
            } else if t_unclamped > 1.0 {
                s_val = ((b - c) / a).clamp(0.0, 1.0);
                1.0
            } else {
                t_unclamped
            };

            s = s_val;
            t = t_val;
        }
    }

    (p1 + d1 * s, p2 + d2 * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_aabb_aabb_separated() {
        let a = Aabb::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let b = Aabb::new(Vec3::new(3.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        assert!(aabb_aabb(&a, &b).is_none());
    }

    #[test]
    fn test_aabb_aabb_minimum_axis_normal() {
        // Deep overlap on X and Z, shallow on Y: the MTV axis must be Y
        let a = Aabb::new(Vec3::new(0.0, 1.8, 0.0), Vec3::new(5.0, 1.0, 5.0));
        let b = Aabb::new(Vec3::zeros(), Vec3::new(5.0, 1.0, 5.0));
        let contact = aabb_aabb(&a, &b).expect("boxes overlap");
        assert_eq!(contact.normal, Vec3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(contact.penetration, 0.2, epsilon = 1e-5);
    }

    #[test]
    fn test_aabb_aabb_tie_breaks_x_first() {
        // Identical coincident boxes tie on every axis
        let a = Aabb::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let contact = aabb_aabb(&a, &a).expect("coincident boxes overlap");
        assert_eq!(contact.normal.x.abs(), 1.0);
        assert_eq!(contact.normal.y, 0.0);
        assert_eq!(contact.normal.z, 0.0);
    }

    #[test]
    fn test_sphere_aabb_outside_touching() {
        let aabb = Aabb::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let contact = sphere_aabb(Vec3::new(2.5, 0.0, 0.0), 2.0, &aabb).expect("overlapping");
        assert_eq!(contact.normal, Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(contact.penetration, 0.5, epsilon = 1e-5);
        assert_eq!(contact.point, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_sphere_aabb_separated() {
        let aabb = Aabb::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        assert!(sphere_aabb(Vec3::new(5.0, 0.0, 0.0), 1.0, &aabb).is_none());
    }

    #[test]
    fn test_sphere_aabb_center_inside_uses_nearest_face() {
        let aabb = Aabb::new(Vec3::zeros(), Vec3::new(2.0, 1.0, 2.0));
        // Center just under the +Y face
        let contact = sphere_aabb(Vec3::new(0.0, 0.9, 0.0), 0.5, &aabb).expect("inside");
        assert_eq!(contact.normal, Vec3::new(0.0, 1.0, 0.0));
        assert!(contact.penetration > 0.5);
        assert!(contact.normal.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_capsule_aabb_overlap() {
        let aabb = Aabb::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let contact = capsule_aabb(
            Vec3::new(0.0, 1.4, -2.0),
            Vec3::new(0.0, 1.4, 2.0),
            0.5,
            &aabb,
        )
        .expect("capsule rests on top of the box");
        assert_eq!(contact.normal, Vec3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(contact.penetration, 0.1, epsilon = 1e-5);
    }

    #[test]
    fn test_capsule_aabb_zero_length_segment() {
        let aabb = Aabb::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let point = Vec3::new(1.3, 0.0, 0.0);
        let contact = capsule_aabb(point, point, 0.5, &aabb).expect("degenerate capsule = sphere");
        assert_eq!(contact.normal, Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(contact.penetration, 0.2, epsilon = 1e-5);
    }

    #[test]
    fn test_capsule_sphere_reference_case() {
        // Capsule along +Y, sphere offset 0.4 on Z from the segment:
        // distance 0.4 < radii sum 0.8 -> penetration 0.4
        let contact = capsule_sphere(
            Vec3::zeros(),
            Vec3::new(0.0, 2.0, 0.0),
            0.5,
            Vec3::new(0.0, 1.0, 0.4),
            0.3,
        )
        .expect("overlapping");
        assert_relative_eq!(contact.penetration, 0.4, epsilon = 1e-5);
        assert_relative_eq!(contact.normal.z, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_capsule_sphere_separated() {
        let contact = capsule_sphere(
            Vec3::zeros(),
            Vec3::new(0.0, 2.0, 0.0),
            0.5,
            Vec3::new(0.0, 1.0, 2.0),
            0.3,
        );
        assert!(contact.is_none());
    }

    #[test]
    fn test_capsule_capsule_coincident_reports_full_penetration() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        let q = Vec3::new(1.0, 4.0, 3.0);
        let contact = capsule_capsule(p, q, 1.0, p, q, 1.0).expect("coincident capsules");
        assert_relative_eq!(contact.penetration, 2.0, epsilon = 1e-5);
        assert!(contact.normal.iter().all(|c| c.is_finite()));
        assert_relative_eq!(contact.normal.magnitude(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_capsule_capsule_crossed() {
        // Perpendicular segments crossing at distance 0.5 on Y
        let contact = capsule_capsule(
            Vec3::new(-2.0, 0.5, 0.0),
            Vec3::new(2.0, 0.5, 0.0),
            0.4,
            Vec3::new(0.0, 0.0, -2.0),
            Vec3::new(0.0, 0.0, 2.0),
            0.4,
        )
        .expect("crossing capsules");
        assert_relative_eq!(contact.penetration, 0.3, epsilon = 1e-5);
        assert_relative_eq!(contact.normal.y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_capsule_capsule_parallel_separated() {
        let contact = capsule_capsule(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(4.0, 0.0, 0.0),
            0.5,
            Vec3::new(0.0, 3.0, 0.0),
            Vec3::new(4.0, 3.0, 0.0),
            0.5,
        );
        assert!(contact.is_none());
    }

    #[test]
    fn test_capsule_capsule_degenerate_points() {
        // Both segments collapse to points: behaves as sphere-sphere
        let a = Vec3::zeros();
        let b = Vec3::new(1.5, 0.0, 0.0);
        let contact = capsule_capsule(a, a, 1.0, b, b, 1.0).expect("touching point capsules");
        assert_relative_eq!(contact.penetration, 0.5, epsilon = 1e-5);
        assert_relative_eq!(contact.normal.x, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_sphere_sphere() {
        let contact =
            sphere_sphere(Vec3::zeros(), 5.0, Vec3::new(8.0, 0.0, 0.0), 5.0).expect("overlap");
        assert_relative_eq!(contact.penetration, 2.0, epsilon = 1e-5);
        assert_relative_eq!(contact.normal.x, -1.0, epsilon = 1e-5);
        assert!(sphere_sphere(Vec3::zeros(), 1.0, Vec3::new(8.0, 0.0, 0.0), 1.0).is_none());
    }

    #[test]
    fn test_segment_segment_clamps_to_endpoints() {
        // Collinear segments end to end: closest points are the facing ends
        let (on_a, on_b) = closest_points_on_segments(
            Vec3::zeros(),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(5.0, 0.0, 0.0),
        );
        assert_eq!(on_a, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(on_b, Vec3::new(3.0, 0.0, 0.0));
    }
}
