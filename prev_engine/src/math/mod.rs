//! Geometry helpers shared by components and renderers

mod bounds;
pub mod frustum;
mod ray;

pub use bounds::{Aabb, Sphere};
pub use frustum::Frustum;
pub use ray::{Ray, RayCastResult};
