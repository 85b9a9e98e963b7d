//! # Collision Engine
//!
//! The collision-detection and spatial-query core of a real-time 3D engine.
//!
//! ## Features
//!
//! - **Broad Phase**: Uniform spatial hash for large scenes, direct pairwise
//!   sweep for small ones
//! - **Narrow Phase**: Exact box/sphere/capsule contact tests with point,
//!   normal, and penetration depth
//! - **Pair Tracking**: Persistent Enter/Stay/Exit transitions across steps
//! - **Queries**: Ray casts, shape casts, and overlap tests with layer masks
//!   and trigger filtering
//!
//! ## Quick Start
//!
//! ```rust
//! use collision_engine::prelude::*;
//!
//! let mut world = CollisionWorld::new(CollisionConfig::default());
//!
//! let a = world.register(
//!     Collider::new(ColliderShape::sphere(Vec3::zeros(), 1.0)).with_owner(EntityId(1)),
//! );
//! let _b = world.register(
//!     Collider::new(ColliderShape::sphere(Vec3::new(1.5, 0.0, 0.0), 1.0))
//!         .with_owner(EntityId(2)),
//! );
//!
//! // Run one simulation step; enter/stay/exit events buffer in the world.
//! world.step();
//! assert!(world.events().iter().any(|e| e.phase == CollisionPhase::Enter));
//!
//! // On-demand queries run outside the step.
//! if let Some(ray) = Ray::from_points(Vec3::new(0.0, 0.0, -10.0), Vec3::zeros()) {
//!     let hit = world.raycast(&ray, f32::INFINITY, QueryFilter::default());
//!     assert_eq!(hit.map(|h| h.collider), Some(a));
//! }
//! ```

pub mod foundation;
pub mod geometry;
pub mod spatial;
pub mod world;

pub use geometry::bounds::{Aabb, Obb};
pub use geometry::manifold::{ContactManifold, ContactPoint};
pub use geometry::narrow_phase::Contact;
pub use geometry::ray::{Ray, RaycastHit};
pub use spatial::SpatialHash;
pub use world::collider::{
    Collider, ColliderHandle, ColliderPair, ColliderShape, CollisionLayers, EntityId,
};
pub use world::config::{CollisionConfig, Config, ConfigError};
pub use world::events::{
    Collision, CollisionEvent, CollisionKind, CollisionListener, CollisionPhase,
};
pub use world::query::{QueryFilter, TriggerInteraction};
pub use world::CollisionWorld;

/// Common imports for collision engine users
pub mod prelude {
    pub use crate::foundation::math::{Mat3, Quat, Vec3};
    pub use crate::geometry::bounds::{Aabb, Obb};
    pub use crate::geometry::manifold::{ContactManifold, ContactPoint};
    pub use crate::geometry::ray::{Ray, RaycastHit};
    pub use crate::world::collider::{
        Collider, ColliderHandle, ColliderShape, CollisionLayers, EntityId,
    };
    pub use crate::world::config::{CollisionConfig, Config};
    pub use crate::world::events::{
        Collision, CollisionEvent, CollisionKind, CollisionListener, CollisionPhase,
    };
    pub use crate::world::query::{QueryFilter, TriggerInteraction};
    pub use crate::world::CollisionWorld;
}
