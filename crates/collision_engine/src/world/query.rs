//! Spatial query façade: raycasts, shape casts, and overlap tests
//!
//! All queries are read-only snapshots of the registry as it stands when
//! called, including shape changes made since the last step. Shape casts and
//! overlap tests are conservative: they operate on world AABBs (a shape cast
//! is a Minkowski-inflated AABB ray test), so they can report hits a
//! precise-geometry test would reject, but never miss a true hit.

use std::collections::HashSet;

use crate::foundation::math::Vec3;
use crate::geometry::bounds::{Aabb, Obb};
use crate::geometry::ray::{Ray, RaycastHit};
use crate::world::collider::{Collider, ColliderHandle, ColliderShape};
use crate::world::collision_world::CollisionWorld;

/// How a query treats trigger colliders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerInteraction {
    /// Defer to the world's `queries_hit_triggers` setting
    #[default]
    UseGlobal,
    /// Report trigger colliders regardless of the global setting
    Include,
    /// Skip trigger colliders regardless of the global setting
    Ignore,
}

/// Layer and trigger filtering applied by every query
///
/// The default filter accepts every layer and defers trigger handling to the
/// world configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryFilter {
    /// Mask of layers the query considers; a collider passes when its
    /// `1 << layer` bit is set
    pub layer_mask: u32,
    /// Trigger handling policy
    pub triggers: TriggerInteraction,
}

impl Default for QueryFilter {
    fn default() -> Self {
        Self {
            layer_mask: u32::MAX,
            triggers: TriggerInteraction::UseGlobal,
        }
    }
}

impl QueryFilter {
    /// Filter restricted to the given layer mask
    pub fn layers(layer_mask: u32) -> Self {
        Self {
            layer_mask,
            ..Self::default()
        }
    }

    /// This filter with triggers always included
    pub fn including_triggers(mut self) -> Self {
        self.triggers = TriggerInteraction::Include;
        self
    }

    /// This filter with triggers always skipped
    pub fn ignoring_triggers(mut self) -> Self {
        self.triggers = TriggerInteraction::Ignore;
        self
    }

    /// Whether a collider passes this filter under the given global trigger
    /// policy
    fn accepts(&self, collider: &Collider, queries_hit_triggers: bool) -> bool {
        if !collider.enabled {
            return false;
        }
        if self.layer_mask & collider.layer_bit() == 0 {
            return false;
        }
        if collider.is_trigger {
            return match self.triggers {
                TriggerInteraction::UseGlobal => queries_hit_triggers,
                TriggerInteraction::Include => true,
                TriggerInteraction::Ignore => false,
            };
        }
        true
    }
}

impl CollisionWorld {
    /// Cast a ray, returning the nearest hit within `max_distance`
    ///
    /// Colliders carrying an exact raycast hook are tested through it; all
    /// others fall back to the slab test against their world AABB. A hook
    /// returning `None` is a miss even when the AABB would report a hit.
    pub fn raycast(
        &self,
        ray: &Ray,
        max_distance: f32,
        filter: QueryFilter,
    ) -> Option<RaycastHit> {
        self.ray_hits(ray, max_distance, filter)
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    /// Cast a ray, returning every hit sorted nearest-first
    pub fn raycast_all(
        &self,
        ray: &Ray,
        max_distance: f32,
        filter: QueryFilter,
    ) -> Vec<RaycastHit> {
        let mut hits: Vec<RaycastHit> = self.ray_hits(ray, max_distance, filter).collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    /// Cast a ray into a caller-owned buffer, returning the hit count
    ///
    /// The buffer is cleared and refilled (sorted nearest-first), reusing
    /// its allocation across calls.
    pub fn raycast_into(
        &self,
        ray: &Ray,
        max_distance: f32,
        filter: QueryFilter,
        out: &mut Vec<RaycastHit>,
    ) -> usize {
        out.clear();
        out.extend(self.ray_hits(ray, max_distance, filter));
        out.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        out.len()
    }

    fn ray_hits<'a>(
        &'a self,
        ray: &'a Ray,
        max_distance: f32,
        filter: QueryFilter,
    ) -> impl Iterator<Item = RaycastHit> + 'a {
        let queries_hit_triggers = self.config.queries_hit_triggers;
        self.colliders
            .iter()
            .filter(move |(_, collider)| filter.accepts(collider, queries_hit_triggers))
            .filter_map(move |(handle, collider)| {
                let hit = match &collider.exact_raycast {
                    Some(hook) => {
                        let (distance, point, normal) = hook(ray)?;
                        RaycastHit {
                            collider: handle,
                            point,
                            normal,
                            distance,
                        }
                    }
                    None => {
                        let (distance, normal) =
                            collider.bounds().intersect_ray(ray.origin, ray.direction)?;
                        RaycastHit {
                            collider: handle,
                            point: ray.point_at(distance),
                            normal,
                            distance,
                        }
                    }
                };
                (hit.distance <= max_distance).then_some(hit)
            })
    }

    /// Sweep a sphere along a direction, returning the nearest conservative
    /// hit
    ///
    /// Returns `None` for a near-zero direction.
    pub fn sphere_cast(
        &self,
        center: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        filter: QueryFilter,
    ) -> Option<RaycastHit> {
        self.shape_cast(
            Aabb::new(center, Vec3::repeat(radius.abs())),
            direction,
            max_distance,
            filter,
        )
    }

    /// Sweep an oriented box along a direction, returning the nearest
    /// conservative hit
    ///
    /// The box is reduced to its conservative enclosing AABB before the
    /// sweep. Returns `None` for a near-zero direction.
    pub fn box_cast(
        &self,
        obb: &Obb,
        direction: Vec3,
        max_distance: f32,
        filter: QueryFilter,
    ) -> Option<RaycastHit> {
        self.shape_cast(obb.to_aabb(), direction, max_distance, filter)
    }

    /// Sweep a capsule along a direction, returning the nearest conservative
    /// hit
    ///
    /// Returns `None` for a near-zero direction.
    pub fn capsule_cast(
        &self,
        start: Vec3,
        end: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        filter: QueryFilter,
    ) -> Option<RaycastHit> {
        self.shape_cast(
            ColliderShape::capsule(start, end, radius).bounds(),
            direction,
            max_distance,
            filter,
        )
    }

    /// Minkowski shape cast: each candidate's AABB is inflated by the moving
    /// shape's half-extents, then ray-tested from the moving shape's center.
    /// Hit distances are travel distances of the shape's center.
    fn shape_cast(
        &self,
        moving: Aabb,
        direction: Vec3,
        max_distance: f32,
        filter: QueryFilter,
    ) -> Option<RaycastHit> {
        let ray = Ray::new(moving.center, direction)?;
        let queries_hit_triggers = self.config.queries_hit_triggers;
        self.colliders
            .iter()
            .filter(|(_, collider)| filter.accepts(collider, queries_hit_triggers))
            .filter_map(|(handle, collider)| {
                let inflated = collider.bounds().inflated(moving.extents);
                let (distance, normal) = inflated.intersect_ray(ray.origin, ray.direction)?;
                (distance <= max_distance).then(|| RaycastHit {
                    collider: handle,
                    point: ray.point_at(distance),
                    normal,
                    distance,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    /// Colliders whose AABBs overlap a sphere's enclosing AABB
    pub fn overlap_sphere(
        &self,
        center: Vec3,
        radius: f32,
        filter: QueryFilter,
    ) -> Vec<ColliderHandle> {
        self.overlap_region(&Aabb::new(center, Vec3::repeat(radius.abs())), filter)
    }

    /// Colliders whose AABBs overlap an oriented box's conservative AABB
    pub fn overlap_box(&self, obb: &Obb, filter: QueryFilter) -> Vec<ColliderHandle> {
        self.overlap_region(&obb.to_aabb(), filter)
    }

    /// Colliders whose AABBs overlap a capsule's enclosing AABB
    pub fn overlap_capsule(
        &self,
        start: Vec3,
        end: Vec3,
        radius: f32,
        filter: QueryFilter,
    ) -> Vec<ColliderHandle> {
        self.overlap_region(&ColliderShape::capsule(start, end, radius).bounds(), filter)
    }

    /// Check whether any collider's AABB overlaps a sphere's enclosing AABB
    pub fn check_sphere(&self, center: Vec3, radius: f32, filter: QueryFilter) -> bool {
        self.region_occupied(&Aabb::new(center, Vec3::repeat(radius.abs())), filter)
    }

    /// Check whether any collider's AABB overlaps an oriented box's
    /// conservative AABB
    pub fn check_box(&self, obb: &Obb, filter: QueryFilter) -> bool {
        self.region_occupied(&obb.to_aabb(), filter)
    }

    /// Check whether any collider's AABB overlaps a capsule's enclosing AABB
    pub fn check_capsule(&self, start: Vec3, end: Vec3, radius: f32, filter: QueryFilter) -> bool {
        self.region_occupied(&ColliderShape::capsule(start, end, radius).bounds(), filter)
    }

    fn overlap_region(&self, region: &Aabb, filter: QueryFilter) -> Vec<ColliderHandle> {
        let queries_hit_triggers = self.config.queries_hit_triggers;
        self.region_candidates(region)
            .filter(|&(_, collider)| filter.accepts(collider, queries_hit_triggers))
            .filter(|(_, collider)| collider.bounds().intersects(region))
            .map(|(handle, _)| handle)
            .collect()
    }

    fn region_occupied(&self, region: &Aabb, filter: QueryFilter) -> bool {
        let queries_hit_triggers = self.config.queries_hit_triggers;
        self.region_candidates(region)
            .filter(|&(_, collider)| filter.accepts(collider, queries_hit_triggers))
            .any(|(_, collider)| collider.bounds().intersects(region))
    }

    /// Candidate colliders for a region query
    ///
    /// Above the broad-phase threshold the spatial hash narrows the set;
    /// dirty and hash-excluded colliders are merged back in since their
    /// indexed cells may be stale or absent. Below the threshold every
    /// collider is a candidate.
    fn region_candidates<'a>(
        &'a self,
        region: &Aabb,
    ) -> impl Iterator<Item = (ColliderHandle, &'a Collider)> + 'a {
        let narrowed = if self.colliders.len() >= self.config.broad_phase_threshold {
            let mut set = HashSet::new();
            self.hash.query_aabb(region, &mut set);
            set.extend(self.unhashed.iter().copied());
            for (handle, collider) in &self.colliders {
                if collider.is_dirty() {
                    set.insert(handle);
                }
            }
            Some(set)
        } else {
            None
        };

        self.colliders.iter().filter(move |(handle, _)| {
            narrowed
                .as_ref()
                .map_or(true, |set| set.contains(handle))
        })
    }
}
