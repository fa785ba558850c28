//! # void_math - Scene Geometry Primitives
//!
//! The small set of geometric types the scene index works against:
//! points, axis-aligned and oriented boxes, spheres, rays and view frusta,
//! plus the overlap tests between them.

pub mod vector;
pub mod bounds;
pub mod frustum;
pub mod ray;
pub mod intersect;

pub use vector::*;
pub use bounds::*;
pub use frustum::*;
pub use ray::*;
pub use intersect::*;

/// Common math constants
pub mod consts {
    pub const PI: f32 = core::f32::consts::PI;
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Convert degrees to radians
#[inline]
pub fn radians(degrees: f32) -> f32 {
    degrees * consts::DEG_TO_RAD
}

pub mod prelude {
    pub use crate::vector::Vec3;
    pub use crate::bounds::{AABB, Sphere, Obb};
    pub use crate::frustum::{Plane, FrustumPlanes, FrustumTestResult};
    pub use crate::ray::{Ray, RayHit};
    pub use crate::intersect::{ray_aabb, obb_aabb};
    pub use crate::radians;
}
