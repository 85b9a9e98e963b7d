//! Spatial partitioning for broad-phase collision detection
//!
//! A uniform spatial hash buckets registered colliders by the grid cells
//! their world AABB spans. The collision world uses it to enumerate
//! candidate pairs in average-case sub-quadratic time once the scene grows
//! past the configured threshold.

pub mod spatial_hash;

pub use spatial_hash::{CellKey, SpatialHash};
