//! 3D Ray for intersection testing
//!
//! Rays are used for picking and scene intersection queries.

use crate::vector::Vec3;
use crate::bounds::AABB;
use crate::intersect::ray_aabb;

/// 3D ray for intersection testing
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ray {
    /// Ray origin point
    pub origin: Vec3,
    /// Ray direction (normalized)
    pub direction: Vec3,
}

/// Where a ray first meets a volume
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    /// Distance along the ray; zero when the origin is inside the volume
    pub distance: f32,
}

impl Ray {
    /// Create a new ray with normalized direction
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Create a ray from two points
    #[inline]
    pub fn from_points(start: Vec3, end: Vec3) -> Self {
        Self::new(start, end - start)
    }

    /// Get a point at distance t along the ray
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Entry point and distance of this ray into `aabb`, if it is hit
    pub fn intersects(&self, aabb: &AABB) -> Option<RayHit> {
        let distance = ray_aabb(self, aabb)?;
        Some(RayHit {
            point: self.at(distance),
            distance,
        })
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            direction: Vec3::Z,
        }
    }
}
