//! Collision world: registry, per-step pipeline, and query façade

pub mod collider;
pub mod collision_world;
pub mod config;
pub mod events;
pub mod query;

pub use collider::{Collider, ColliderHandle, ColliderPair, ColliderShape, CollisionLayers, EntityId};
pub use collision_world::CollisionWorld;
pub use config::{CollisionConfig, Config, ConfigError};
pub use events::{Collision, CollisionEvent, CollisionKind, CollisionListener, CollisionPhase};
pub use query::{QueryFilter, TriggerInteraction};
