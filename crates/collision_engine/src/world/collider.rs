//! Collider records, shapes, handles, and layer filtering

use slotmap::{new_key_type, Key};

use crate::foundation::math::Vec3;
use crate::geometry::bounds::Aabb;
use crate::geometry::narrow_phase::{self, Contact};
use crate::geometry::ray::Ray;

new_key_type! {
    /// Stable, generational handle to a registered collider
    pub struct ColliderHandle;
}

/// Reference to the external entity owning a collider
///
/// The entity/component framework lives outside this subsystem; all the
/// pipeline needs is a comparable identity to report in events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

/// Canonical unordered collider pair
///
/// Always stores the smaller handle first (by key identity), so `(A, B)`
/// and `(B, A)` hash and compare as the same pair. This gives the
/// enter/exit bookkeeping a deterministic ordering key instead of relying
/// on incidental hash ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderPair {
    /// Lower-keyed collider of the pair
    pub first: ColliderHandle,
    /// Higher-keyed collider of the pair
    pub second: ColliderHandle,
}

impl ColliderPair {
    /// Create a canonical pair from two handles in either order
    pub fn new(a: ColliderHandle, b: ColliderHandle) -> Self {
        if a.data().as_ffi() <= b.data().as_ffi() {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    /// Check whether the pair involves the given handle
    pub fn involves(&self, handle: ColliderHandle) -> bool {
        self.first == handle || self.second == handle
    }
}

/// World-space collision shape of a registered collider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderShape {
    /// A sphere at a world-space center
    Sphere {
        /// World-space center
        center: Vec3,
        /// Sphere radius
        radius: f32,
    },
    /// An axis-aligned box
    Box(Aabb),
    /// A capsule: a segment swept by a radius
    Capsule {
        /// World-space segment start
        start: Vec3,
        /// World-space segment end
        end: Vec3,
        /// Capsule radius
        radius: f32,
    },
}

impl ColliderShape {
    /// Create a sphere shape
    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Self::Sphere {
            center,
            radius: radius.abs(),
        }
    }

    /// Create an axis-aligned box shape from center and half-extents
    pub fn aabb(center: Vec3, extents: Vec3) -> Self {
        Self::Box(Aabb::new(center, extents))
    }

    /// Create a capsule shape
    pub fn capsule(start: Vec3, end: Vec3, radius: f32) -> Self {
        Self::Capsule {
            start,
            end,
            radius: radius.abs(),
        }
    }

    /// World AABB enclosing this shape
    pub fn bounds(&self) -> Aabb {
        match *self {
            Self::Sphere { center, radius } => Aabb::new(center, Vec3::repeat(radius)),
            Self::Box(aabb) => aabb,
            Self::Capsule { start, end, radius } => {
                Aabb::from_min_max(start.inf(&end), start.sup(&end))
                    .inflated(Vec3::repeat(radius))
            }
        }
    }
}

/// Narrow-phase contact between two world-space shapes
///
/// The returned normal points from `b` toward `a`. Every shape combination
/// is covered; `None` means the shapes do not touch (or the input was
/// degenerate), never an error.
pub fn shape_contact(a: &ColliderShape, b: &ColliderShape) -> Option<Contact> {
    use ColliderShape::{Box, Capsule, Sphere};
    match (*a, *b) {
        (Box(box_a), Box(box_b)) => narrow_phase::aabb_aabb(&box_a, &box_b),
        (Sphere { center, radius }, Box(aabb)) => narrow_phase::sphere_aabb(center, radius, &aabb),
        (Box(aabb), Sphere { center, radius }) => {
            narrow_phase::sphere_aabb(center, radius, &aabb).map(|c| c.flipped())
        }
        (Capsule { start, end, radius }, Box(aabb)) => {
            narrow_phase::capsule_aabb(start, end, radius, &aabb)
        }
        (Box(aabb), Capsule { start, end, radius }) => {
            narrow_phase::capsule_aabb(start, end, radius, &aabb).map(|c| c.flipped())
        }
        (
            Capsule { start, end, radius },
            Sphere {
                center,
                radius: sphere_radius,
            },
        ) => narrow_phase::capsule_sphere(start, end, radius, center, sphere_radius),
        (
            Sphere {
                center,
                radius: sphere_radius,
            },
            Capsule { start, end, radius },
        ) => narrow_phase::capsule_sphere(start, end, radius, center, sphere_radius)
            .map(|c| c.flipped()),
        (
            Capsule {
                start: start_a,
                end: end_a,
                radius: radius_a,
            },
            Capsule {
                start: start_b,
                end: end_b,
                radius: radius_b,
            },
        ) => narrow_phase::capsule_capsule(start_a, end_a, radius_a, start_b, end_b, radius_b),
        (
            Sphere {
                center: center_a,
                radius: radius_a,
            },
            Sphere {
                center: center_b,
                radius: radius_b,
            },
        ) => narrow_phase::sphere_sphere(center_a, radius_a, center_b, radius_b),
    }
}

/// Exact narrow-phase raycast hook supplied by the external shape layer
///
/// Returns `(distance, point, normal)` for a hit. When a collider carries
/// one (meshes, heightfields), queries prefer it over the raw AABB test.
pub type ExactRaycast = Box<dyn Fn(&Ray) -> Option<(f32, Vec3, Vec3)> + Send + Sync>;

/// A registered collidable shape
///
/// Owned by an external entity and referenced here by handle. The cached
/// world AABB always encloses the current shape; it is refreshed lazily
/// from the dirty flag before any broad-phase use.
pub struct Collider {
    shape: ColliderShape,
    /// Disabled colliders are silently skipped everywhere
    pub enabled: bool,
    /// Triggers report overlap without physical response
    pub is_trigger: bool,
    /// Layer index (0-31) used for `1 << layer` mask tests
    pub layer: u8,
    /// Which layers this collider interacts with during the step pipeline
    pub mask: u32,
    /// Owning entity; pairs with a detached collider are skipped
    pub owner: Option<EntityId>,
    /// Optional exact raycast hook for shapes with precise geometry
    pub exact_raycast: Option<ExactRaycast>,
    aabb: Aabb,
    dirty: bool,
}

impl Collider {
    /// Create a collider with default settings: enabled, not a trigger,
    /// layer 0, interacting with all layers, no owner
    pub fn new(shape: ColliderShape) -> Self {
        Self {
            shape,
            enabled: true,
            is_trigger: false,
            layer: 0,
            mask: CollisionLayers::ALL,
            owner: None,
            exact_raycast: None,
            aabb: shape.bounds(),
            dirty: false,
        }
    }

    /// Set the owning entity
    pub fn with_owner(mut self, owner: EntityId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Set the layer index (0-31)
    pub fn with_layer(mut self, layer: u8) -> Self {
        debug_assert!(layer < 32, "layer index must be 0-31");
        self.layer = layer & 31;
        self
    }

    /// Set the interaction mask
    pub fn with_mask(mut self, mask: u32) -> Self {
        self.mask = mask;
        self
    }

    /// Mark this collider as a trigger volume
    pub fn as_trigger(mut self) -> Self {
        self.is_trigger = true;
        self
    }

    /// Attach an exact raycast hook
    pub fn with_exact_raycast(mut self, hook: ExactRaycast) -> Self {
        self.exact_raycast = Some(hook);
        self
    }

    /// The collider's world-space shape
    pub fn shape(&self) -> &ColliderShape {
        &self.shape
    }

    /// Replace the shape and mark the cached bounds stale
    pub fn set_shape(&mut self, shape: ColliderShape) {
        self.shape = shape;
        self.dirty = true;
    }

    /// The `1 << layer` bit for mask tests
    pub fn layer_bit(&self) -> u32 {
        1 << u32::from(self.layer)
    }

    /// Whether the cached bounds are stale
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Cached world bounds as of the last refresh
    pub fn cached_bounds(&self) -> Aabb {
        self.aabb
    }

    /// Current world bounds: the cache when clean, recomputed when dirty
    pub fn bounds(&self) -> Aabb {
        if self.dirty {
            self.shape.bounds()
        } else {
            self.aabb
        }
    }

    /// Recompute the cached bounds and clear the dirty flag
    pub(crate) fn refresh_bounds(&mut self) -> Aabb {
        self.aabb = self.shape.bounds();
        self.dirty = false;
        self.aabb
    }
}

impl std::fmt::Debug for Collider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collider")
            .field("shape", &self.shape)
            .field("enabled", &self.enabled)
            .field("is_trigger", &self.is_trigger)
            .field("layer", &self.layer)
            .field("mask", &self.mask)
            .field("owner", &self.owner)
            .field("has_exact_raycast", &self.exact_raycast.is_some())
            .field("aabb", &self.aabb)
            .field("dirty", &self.dirty)
            .finish()
    }
}

/// Collision layer helpers for mask-based filtering
pub struct CollisionLayers;

impl CollisionLayers {
    /// No layers
    pub const NONE: u32 = 0;

    /// All layers
    pub const ALL: u32 = 0xFFFF_FFFF;

    /// Mask bit for a single layer index
    pub fn bit(layer: u8) -> u32 {
        1 << u32::from(layer & 31)
    }

    /// Build a mask from several layer indices
    pub fn mask(layers: &[u8]) -> u32 {
        layers.iter().fold(0, |acc, &layer| acc | Self::bit(layer))
    }

    /// Check if two colliders should interact based on layer and mask
    ///
    /// Each side's layer bit must be present in the other side's mask.
    pub fn should_collide(layer_a: u8, mask_a: u32, layer_b: u8, mask_b: u32) -> bool {
        (Self::bit(layer_a) & mask_b) != 0 && (Self::bit(layer_b) & mask_a) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use slotmap::SlotMap;

    #[test]
    fn test_pair_is_canonical() {
        let mut map: SlotMap<ColliderHandle, ()> = SlotMap::with_key();
        let a = map.insert(());
        let b = map.insert(());
        assert_eq!(ColliderPair::new(a, b), ColliderPair::new(b, a));
        assert!(ColliderPair::new(a, b).involves(a));
        assert!(ColliderPair::new(a, b).involves(b));
    }

    #[test]
    fn test_capsule_bounds_inflated_by_radius() {
        let shape = ColliderShape::capsule(Vec3::zeros(), Vec3::new(0.0, 2.0, 0.0), 0.5);
        let bounds = shape.bounds();
        assert_eq!(bounds.min(), Vec3::new(-0.5, -0.5, -0.5));
        assert_eq!(bounds.max(), Vec3::new(0.5, 2.5, 0.5));
    }

    #[test]
    fn test_dirty_bounds_follow_shape() {
        let mut collider = Collider::new(ColliderShape::sphere(Vec3::zeros(), 1.0));
        assert!(!collider.is_dirty());

        collider.set_shape(ColliderShape::sphere(Vec3::new(10.0, 0.0, 0.0), 1.0));
        assert!(collider.is_dirty());
        // bounds() never serves a stale cache
        assert_eq!(collider.bounds().center, Vec3::new(10.0, 0.0, 0.0));
        // cache still holds the old box until refreshed
        assert_eq!(collider.cached_bounds().center, Vec3::zeros());

        collider.refresh_bounds();
        assert!(!collider.is_dirty());
        assert_eq!(collider.cached_bounds().center, Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_shape_contact_flips_normals_consistently() {
        let sphere = ColliderShape::sphere(Vec3::new(2.5, 0.0, 0.0), 2.0);
        let aabb = ColliderShape::aabb(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));

        let forward = shape_contact(&sphere, &aabb).expect("overlap");
        let reversed = shape_contact(&aabb, &sphere).expect("overlap");
        assert_eq!(forward.normal, -reversed.normal);
        assert_relative_eq!(forward.penetration, reversed.penetration);
    }

    #[test]
    fn test_layer_mask_filtering() {
        assert!(CollisionLayers::should_collide(0, CollisionLayers::ALL, 5, CollisionLayers::ALL));
        // B's mask excludes A's layer
        assert!(!CollisionLayers::should_collide(0, CollisionLayers::ALL, 5, CollisionLayers::bit(7)));
        assert_eq!(CollisionLayers::mask(&[0, 3]), 0b1001);
    }
}
