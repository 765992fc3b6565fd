mod aabb;
mod shape;

pub use aabb::Aabb;
pub use shape::{BoxShape, Plane, Shape, Sphere, BLOCK_INERTIA_FACTOR};
