//! Math utilities and types
//!
//! Provides the fundamental math types used throughout collision detection.

pub use nalgebra::{Matrix3, Quaternion, Unit, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 3x3 matrix type (orientation bases)
pub type Mat3 = Matrix3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Tolerance below which a vector is treated as having no direction
pub const DIRECTION_EPSILON: f32 = 1e-6;
