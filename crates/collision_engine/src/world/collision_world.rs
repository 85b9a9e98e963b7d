//! The collision world: shape registry and per-step detection pipeline
//!
//! Each simulation step refreshes dirty bounds, gathers candidate pairs
//! through the broad phase, narrow-phase-tests them, and diffs the result
//! against the previous step's pairs to emit Enter/Stay/Exit events.
//!
//! Everything runs synchronously inside the caller's update: no threads, no
//! locks. Dispatch happens while the world is mutably borrowed, so listener
//! code cannot touch the registry; queue such changes and apply them after
//! the step returns.

use std::collections::{HashMap, HashSet};

use log::trace;
use slotmap::SlotMap;

use crate::foundation::math::Vec3;
use crate::geometry::manifold::ContactManifold;
use crate::geometry::narrow_phase::Contact;
use crate::spatial::SpatialHash;
use crate::world::collider::{
    shape_contact, Collider, ColliderHandle, ColliderPair, ColliderShape, CollisionLayers,
};
use crate::world::config::CollisionConfig;
use crate::world::events::{
    Collision, CollisionEvent, CollisionKind, CollisionListener, CollisionPhase,
};

/// Per-pair bookkeeping kept while the pair's AABBs overlap
struct PairState {
    /// Classification recorded at Enter time; Stay and Exit reuse it so an
    /// Enter/Exit pair can never mismatch after a mid-overlap trigger toggle
    kind: CollisionKind,
    manifold: ContactManifold,
}

/// The collision detection world
///
/// Owns the registry of active colliders, runs the per-step broad + narrow
/// phase pipeline, tracks pair state across steps, and answers the query
/// API. Worlds are independent; create as many as needed.
pub struct CollisionWorld {
    pub(crate) config: CollisionConfig,
    pub(crate) colliders: SlotMap<ColliderHandle, Collider>,
    pub(crate) hash: SpatialHash,
    /// Colliders excluded from the hash by the span safety limit; always
    /// brute-force tested
    pub(crate) unhashed: HashSet<ColliderHandle>,
    current_pairs: HashMap<ColliderPair, PairState>,
    previous_pairs: HashMap<ColliderPair, PairState>,
    events: Vec<CollisionEvent>,
}

impl CollisionWorld {
    /// Create an empty world with the given configuration
    pub fn new(config: CollisionConfig) -> Self {
        let hash = SpatialHash::new(config.cell_size, config.max_cells_per_axis);
        Self {
            config,
            colliders: SlotMap::with_key(),
            hash,
            unhashed: HashSet::new(),
            current_pairs: HashMap::new(),
            previous_pairs: HashMap::new(),
            events: Vec::new(),
        }
    }

    /// The world's configuration
    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    /// Register a collider, indexing it for the broad phase
    pub fn register(&mut self, collider: Collider) -> ColliderHandle {
        let handle = self.colliders.insert(collider);
        let aabb = self.colliders[handle].refresh_bounds();
        if !self.hash.insert(handle, &aabb) {
            self.unhashed.insert(handle);
        }
        handle
    }

    /// Unregister a collider, purging it from the hash and all pair state
    ///
    /// No Exit event fires for pairs the collider was part of; removal is a
    /// purge, not a separation.
    pub fn unregister(&mut self, handle: ColliderHandle) -> Option<Collider> {
        let collider = self.colliders.remove(handle)?;
        self.hash.remove(handle);
        self.unhashed.remove(&handle);
        self.current_pairs.retain(|pair, _| !pair.involves(handle));
        self.previous_pairs.retain(|pair, _| !pair.involves(handle));
        Some(collider)
    }

    /// Borrow a registered collider
    pub fn collider(&self, handle: ColliderHandle) -> Option<&Collider> {
        self.colliders.get(handle)
    }

    /// Mutably borrow a registered collider
    ///
    /// Shape changes through [`Collider::set_shape`] mark the bounds dirty;
    /// they are refreshed (and the hash reindexed) at the start of the next
    /// step.
    pub fn collider_mut(&mut self, handle: ColliderHandle) -> Option<&mut Collider> {
        self.colliders.get_mut(handle)
    }

    /// Replace a collider's world-space shape (convenience for
    /// [`Self::collider_mut`] + [`Collider::set_shape`])
    pub fn set_shape(&mut self, handle: ColliderHandle, shape: ColliderShape) {
        if let Some(collider) = self.colliders.get_mut(handle) {
            collider.set_shape(shape);
        }
    }

    /// Number of registered colliders
    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    /// Check whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// Check whether a handle refers to a live collider
    pub fn contains(&self, handle: ColliderHandle) -> bool {
        self.colliders.contains_key(handle)
    }

    /// Iterate all registered colliders
    pub fn iter(&self) -> impl Iterator<Item = (ColliderHandle, &Collider)> {
        self.colliders.iter()
    }

    /// Events produced by the most recent step, one entry per pair
    /// transition (the payload is the canonical first collider's view; use
    /// [`Collision::mirrored`] for the other side)
    pub fn events(&self) -> &[CollisionEvent] {
        &self.events
    }

    /// Take the buffered events, leaving the buffer empty
    pub fn take_events(&mut self) -> Vec<CollisionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Contact manifold for a currently overlapping pair
    pub fn manifold(&self, a: ColliderHandle, b: ColliderHandle) -> Option<&ContactManifold> {
        self.current_pairs
            .get(&ColliderPair::new(a, b))
            .map(|state| &state.manifold)
    }

    /// Pairs overlapping as of the most recent step
    pub fn overlapping_pairs(&self) -> impl Iterator<Item = ColliderPair> + '_ {
        self.current_pairs.keys().copied()
    }

    /// Remove every collider and all pair state
    pub fn clear(&mut self) {
        self.colliders.clear();
        self.hash.clear();
        self.unhashed.clear();
        self.current_pairs.clear();
        self.previous_pairs.clear();
        self.events.clear();
    }

    /// Run one detection step, buffering events for polling
    pub fn step(&mut self) {
        self.run_step(None);
    }

    /// Run one detection step, dispatching events to `listener` (mirrored,
    /// both participants) in addition to buffering them
    pub fn step_with(&mut self, listener: &mut dyn CollisionListener) {
        self.run_step(Some(listener));
    }

    fn run_step(&mut self, listener: Option<&mut dyn CollisionListener>) {
        self.refresh_dirty_bounds();

        std::mem::swap(&mut self.current_pairs, &mut self.previous_pairs);
        self.current_pairs.clear();
        self.events.clear();

        let mut candidates = HashSet::new();
        self.collect_candidates(&mut candidates);
        self.process_candidates(&candidates);
        self.emit_exits();

        if let Some(listener) = listener {
            for event in &self.events {
                event.dispatch_to(listener);
            }
        }

        trace!(
            "collision step: {} colliders, {} candidates, {} overlapping pairs, {} events",
            self.colliders.len(),
            candidates.len(),
            self.current_pairs.len(),
            self.events.len()
        );
    }

    /// Recompute cached bounds for dirty colliders and reindex them
    fn refresh_dirty_bounds(&mut self) {
        for (handle, collider) in &mut self.colliders {
            if !collider.is_dirty() {
                continue;
            }
            let aabb = collider.refresh_bounds();
            if self.hash.update(handle, &aabb) {
                self.unhashed.remove(&handle);
            } else {
                self.unhashed.insert(handle);
            }
        }
    }

    /// Gather the unordered candidate pair set for this step
    ///
    /// One broad-phase path per scene tier: the spatial hash once the
    /// registry reaches the configured threshold, a direct pairwise sweep
    /// below it. Hash-excluded oversized colliders are merged in by brute
    /// force. Both tiers feed the same AABB verification, so the semantic
    /// result is identical.
    fn collect_candidates(&self, out: &mut HashSet<ColliderPair>) {
        if self.colliders.len() >= self.config.broad_phase_threshold {
            self.hash.query_pairs(out);
            for &handle in &self.unhashed {
                for other in self.colliders.keys() {
                    if other != handle {
                        out.insert(ColliderPair::new(handle, other));
                    }
                }
            }
        } else {
            let handles: Vec<ColliderHandle> = self.colliders.keys().collect();
            for (i, &a) in handles.iter().enumerate() {
                for &b in &handles[i + 1..] {
                    out.insert(ColliderPair::new(a, b));
                }
            }
        }
    }

    /// Narrow-phase and classify candidates, recording pair state and
    /// emitting Enter/Stay events
    fn process_candidates(&mut self, candidates: &HashSet<ColliderPair>) {
        for &pair in candidates {
            let (Some(a), Some(b)) = (self.colliders.get(pair.first), self.colliders.get(pair.second))
            else {
                continue;
            };
            if !a.enabled || !b.enabled {
                continue;
            }
            let (Some(owner_a), Some(owner_b)) = (a.owner, b.owner) else {
                continue;
            };
            if !CollisionLayers::should_collide(a.layer, a.mask, b.layer, b.mask) {
                continue;
            }
            if !a.cached_bounds().intersects(&b.cached_bounds()) {
                continue;
            }

            // Pair existence is AABB overlap; narrow-phase geometry enriches
            // the payload when the shapes actually touch.
            let contact = shape_contact(a.shape(), b.shape()).unwrap_or_else(|| {
                Contact::overlap_only(
                    (a.cached_bounds().center + b.cached_bounds().center) * 0.5,
                )
            });

            let (phase, kind) = match self.previous_pairs.get(&pair) {
                Some(previous) => (CollisionPhase::Stay, previous.kind),
                None => (
                    CollisionPhase::Enter,
                    if a.is_trigger || b.is_trigger {
                        CollisionKind::Trigger
                    } else {
                        CollisionKind::Collision
                    },
                ),
            };

            let mut manifold = ContactManifold::new();
            manifold.add_contact(contact.into());
            self.current_pairs.insert(pair, PairState { kind, manifold });

            self.events.push(CollisionEvent {
                phase,
                kind,
                collision: Collision {
                    this: pair.first,
                    other: pair.second,
                    this_owner: owner_a,
                    other_owner: owner_b,
                    point: contact.point,
                    normal: contact.normal,
                    penetration: contact.penetration,
                },
            });
        }
    }

    /// Emit Exit events for pairs that overlapped last step but not this one
    fn emit_exits(&mut self) {
        for (pair, state) in &self.previous_pairs {
            if self.current_pairs.contains_key(pair) {
                continue;
            }
            let (Some(a), Some(b)) =
                (self.colliders.get(pair.first), self.colliders.get(pair.second))
            else {
                continue; // Unregistered pairs are purged, not exited
            };
            let (Some(owner_a), Some(owner_b)) = (a.owner, b.owner) else {
                continue;
            };

            self.events.push(CollisionEvent {
                phase: CollisionPhase::Exit,
                kind: state.kind,
                collision: Collision {
                    this: pair.first,
                    other: pair.second,
                    this_owner: owner_a,
                    other_owner: owner_b,
                    point: Vec3::zeros(),
                    normal: Vec3::zeros(),
                    penetration: 0.0,
                },
            });
        }
    }
}
