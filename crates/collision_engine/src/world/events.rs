//! Collision events and the dispatch capability interface
//!
//! Components that want collision callbacks implement [`CollisionListener`]
//! and receive mirrored notifications for both participants of a pair. The
//! world also buffers every event so polling callers can drain them after
//! the step instead.

use crate::foundation::math::Vec3;
use crate::world::collider::{ColliderHandle, EntityId};

/// Transition phase of a tracked pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollisionPhase {
    /// First step the pair's AABBs overlap
    Enter,
    /// Every subsequent overlapping step
    Stay,
    /// First step after the pair stops overlapping
    Exit,
}

/// Classification of a tracked pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollisionKind {
    /// Neither collider is a trigger
    Collision,
    /// At least one collider is a trigger (recorded at Enter time)
    Trigger,
}

/// Payload delivered with every collision callback
///
/// The pair is ordered from the receiver's point of view: `this` is the
/// collider the callback is about, `other` the one it touched. The normal
/// points from `other` toward `this`, so the mirrored payload carries the
/// exact negation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision {
    /// The receiving collider
    pub this: ColliderHandle,
    /// The other collider of the pair
    pub other: ColliderHandle,
    /// Entity owning `this`
    pub this_owner: EntityId,
    /// Entity owning `other`
    pub other_owner: EntityId,
    /// World-space contact point (zero for overlap-only detections)
    pub point: Vec3,
    /// Contact normal pointing from `other` toward `this` (zero for
    /// overlap-only detections)
    pub normal: Vec3,
    /// Penetration depth (zero for overlap-only detections)
    pub penetration: f32,
}

impl Collision {
    /// The same contact seen from the other participant: collider references
    /// swapped, normal negated
    pub fn mirrored(&self) -> Self {
        Self {
            this: self.other,
            other: self.this,
            this_owner: self.other_owner,
            other_owner: self.this_owner,
            point: self.point,
            normal: -self.normal,
            penetration: self.penetration,
        }
    }
}

/// A buffered collision event, stored from the first (canonical) collider's
/// point of view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    /// Enter, Stay, or Exit
    pub phase: CollisionPhase,
    /// Collision or Trigger (classification recorded at Enter)
    pub kind: CollisionKind,
    /// The contact payload; use [`Collision::mirrored`] for the second
    /// participant's view
    pub collision: Collision,
}

impl CollisionEvent {
    /// Dispatch this event to a listener, once for each participant
    ///
    /// The second dispatch receives the mirrored payload (swapped
    /// references, negated normal).
    pub fn dispatch_to(&self, listener: &mut dyn CollisionListener) {
        let mirrored = self.collision.mirrored();
        for collision in [&self.collision, &mirrored] {
            match (self.kind, self.phase) {
                (CollisionKind::Collision, CollisionPhase::Enter) => {
                    listener.on_collision_enter(collision);
                }
                (CollisionKind::Collision, CollisionPhase::Stay) => {
                    listener.on_collision_stay(collision);
                }
                (CollisionKind::Collision, CollisionPhase::Exit) => {
                    listener.on_collision_exit(collision);
                }
                (CollisionKind::Trigger, CollisionPhase::Enter) => {
                    listener.on_trigger_enter(collision);
                }
                (CollisionKind::Trigger, CollisionPhase::Stay) => {
                    listener.on_trigger_stay(collision);
                }
                (CollisionKind::Trigger, CollisionPhase::Exit) => {
                    listener.on_trigger_exit(collision);
                }
            }
        }
    }
}

/// Capability interface for components wanting collision callbacks
///
/// All hooks default to no-ops so implementors override only what they
/// need. Callbacks run inside the step while the world is mutably borrowed;
/// registry mutations must be queued and applied after the step returns.
/// A panicking listener aborts the remainder of the step's dispatch.
pub trait CollisionListener {
    /// Two non-trigger colliders started touching
    fn on_collision_enter(&mut self, _collision: &Collision) {}
    /// Two non-trigger colliders remain touching
    fn on_collision_stay(&mut self, _collision: &Collision) {}
    /// Two non-trigger colliders stopped touching
    fn on_collision_exit(&mut self, _collision: &Collision) {}
    /// A trigger pair started overlapping
    fn on_trigger_enter(&mut self, _collision: &Collision) {}
    /// A trigger pair remains overlapping
    fn on_trigger_stay(&mut self, _collision: &Collision) {}
    /// A trigger pair stopped overlapping
    fn on_trigger_exit(&mut self, _collision: &Collision) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn sample_collision() -> Collision {
        let mut map: SlotMap<ColliderHandle, ()> = SlotMap::with_key();
        Collision {
            this: map.insert(()),
            other: map.insert(()),
            this_owner: EntityId(1),
            other_owner: EntityId(2),
            point: Vec3::new(1.0, 2.0, 3.0),
            normal: Vec3::new(0.0, 1.0, 0.0),
            penetration: 0.25,
        }
    }

    #[test]
    fn test_mirrored_swaps_and_negates() {
        let collision = sample_collision();
        let mirrored = collision.mirrored();
        assert_eq!(mirrored.this, collision.other);
        assert_eq!(mirrored.other, collision.this);
        assert_eq!(mirrored.this_owner, collision.other_owner);
        assert_eq!(mirrored.normal, -collision.normal);
        assert_eq!(mirrored.point, collision.point);
        assert_eq!(mirrored.penetration, collision.penetration);
    }

    #[derive(Default)]
    struct CountingListener {
        enters: Vec<Collision>,
        trigger_exits: usize,
    }

    impl CollisionListener for CountingListener {
        fn on_collision_enter(&mut self, collision: &Collision) {
            self.enters.push(*collision);
        }
        fn on_trigger_exit(&mut self, _collision: &Collision) {
            self.trigger_exits += 1;
        }
    }

    #[test]
    fn test_dispatch_notifies_both_participants() {
        let event = CollisionEvent {
            phase: CollisionPhase::Enter,
            kind: CollisionKind::Collision,
            collision: sample_collision(),
        };
        let mut listener = CountingListener::default();
        event.dispatch_to(&mut listener);

        assert_eq!(listener.enters.len(), 2);
        assert_eq!(listener.enters[0].this, listener.enters[1].other);
        assert_eq!(listener.enters[0].normal, -listener.enters[1].normal);
    }

    #[test]
    fn test_dispatch_routes_by_kind_and_phase() {
        let event = CollisionEvent {
            phase: CollisionPhase::Exit,
            kind: CollisionKind::Trigger,
            collision: sample_collision(),
        };
        let mut listener = CountingListener::default();
        event.dispatch_to(&mut listener);
        assert!(listener.enters.is_empty());
        assert_eq!(listener.trigger_exits, 2);
    }
}
