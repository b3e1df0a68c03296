//! Math primitives: integer grid vectors, bounding boxes and frustum culling

pub mod aabb;
pub mod frustum;
pub mod int_vector2;

pub use aabb::Aabb;
pub use frustum::{Plane, Frustum};
pub use int_vector2::IntVector2;
