//! Geometric primitives and pairwise intersection algorithms
//!
//! Everything in this module is plain data plus pure functions: no registry
//! state, no callbacks. The collision world builds its broad and narrow
//! phases on top of these pieces.

pub mod bounds;
pub mod manifold;
pub mod narrow_phase;
pub mod ray;

pub use bounds::{Aabb, Obb};
pub use manifold::{ContactManifold, ContactPoint};
pub use narrow_phase::Contact;
pub use ray::{Ray, RaycastHit};
