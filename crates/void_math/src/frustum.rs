//! Frustum culling types
//!
//! Provides plane and frustum types for view-frustum culling. Frusta are
//! built directly from camera parameters or from inward-facing planes.

use crate::vector::Vec3;
use crate::bounds::AABB;

/// Plane in 3D space (n·p + d = 0)
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Plane {
    /// Plane normal (unit vector)
    pub normal: Vec3,
    /// Signed offset along the normal
    pub distance: f32,
}

impl Plane {
    /// Create a plane from a point on the plane and its normal
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize();
        Self {
            normal,
            distance: -normal.dot(point),
        }
    }

    /// Signed distance from a point to the plane
    ///
    /// Positive = in front (same side as normal)
    #[inline]
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

impl Default for Plane {
    fn default() -> Self {
        Self {
            normal: Vec3::Y,
            distance: 0.0,
        }
    }
}

/// Result of frustum containment test
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrustumTestResult {
    /// Object is completely inside the frustum
    Inside,
    /// Object is completely outside the frustum
    Outside,
    /// Object intersects the frustum boundary
    Intersecting,
}

impl FrustumTestResult {
    /// Check if the object is at least partially visible
    #[inline]
    pub fn is_visible(&self) -> bool {
        *self != FrustumTestResult::Outside
    }

}

/// View frustum bounded by six inward-facing planes
///
/// Plane order: left, right, bottom, top, near, far.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrustumPlanes {
    pub planes: [Plane; 6],
}

impl FrustumPlanes {
    pub const LEFT: usize = 0;
    pub const RIGHT: usize = 1;
    pub const BOTTOM: usize = 2;
    pub const TOP: usize = 3;
    pub const NEAR: usize = 4;
    pub const FAR: usize = 5;

    #[inline]
    pub const fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Box-shaped (orthographic) frustum covering exactly `aabb`
    pub fn from_aabb(aabb: &AABB) -> Self {
        Self::new([
            Plane::from_point_normal(aabb.min, Vec3::X),
            Plane::from_point_normal(aabb.max, Vec3::NEG_X),
            Plane::from_point_normal(aabb.min, Vec3::Y),
            Plane::from_point_normal(aabb.max, Vec3::NEG_Y),
            Plane::from_point_normal(aabb.min, Vec3::Z),
            Plane::from_point_normal(aabb.max, Vec3::NEG_Z),
        ])
    }

    /// Perspective frustum of a camera at `eye` looking along `forward`
    ///
    /// `fov_y` is the full vertical field of view in radians.
    pub fn perspective(
        eye: Vec3,
        forward: Vec3,
        up: Vec3,
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let forward = forward.normalize();
        let right = forward.cross(up).normalize();
        let up = right.cross(forward);

        let half_v = far * (fov_y * 0.5).tan();
        let half_h = half_v * aspect;
        let far_center = forward * far;

        // Side planes pass through the eye; normals point inward.
        let left_dir = far_center - right * half_h;
        let right_dir = far_center + right * half_h;
        let bottom_dir = far_center - up * half_v;
        let top_dir = far_center + up * half_v;

        Self::new([
            Plane::from_point_normal(eye, left_dir.cross(up)),
            Plane::from_point_normal(eye, up.cross(right_dir)),
            Plane::from_point_normal(eye, right.cross(bottom_dir)),
            Plane::from_point_normal(eye, top_dir.cross(right)),
            Plane::from_point_normal(eye + forward * near, forward),
            Plane::from_point_normal(eye + forward * far, -forward),
        ])
    }

    /// Test if an AABB is inside, outside, or intersecting the frustum
    pub fn contains_aabb(&self, aabb: &AABB) -> FrustumTestResult {
        let mut result = FrustumTestResult::Inside;

        for plane in &self.planes {
            // Corner most aligned with the plane normal (p-vertex)
            let p = Vec3::new(
                if plane.normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if plane.normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if plane.normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );

            // Corner least aligned with the plane normal (n-vertex)
            let n = Vec3::new(
                if plane.normal.x >= 0.0 { aabb.min.x } else { aabb.max.x },
                if plane.normal.y >= 0.0 { aabb.min.y } else { aabb.max.y },
                if plane.normal.z >= 0.0 { aabb.min.z } else { aabb.max.z },
            );

            if plane.distance_to_point(p) < 0.0 {
                return FrustumTestResult::Outside;
            }

            if plane.distance_to_point(n) < 0.0 {
                result = FrustumTestResult::Intersecting;
            }
        }

        result
    }

    /// True if any part of `aabb` may be visible
    #[inline]
    pub fn contains(&self, aabb: &AABB) -> bool {
        self.contains_aabb(aabb).is_visible()
    }

    /// Test if a point is inside the frustum
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(point) >= 0.0)
    }
}

impl Default for FrustumPlanes {
    fn default() -> Self {
        Self {
            planes: [Plane::default(); 6],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn box_frustum() -> FrustumPlanes {
        FrustumPlanes::from_aabb(&AABB::new(
            Vec3::new(-10.0, -10.0, 0.1),
            Vec3::new(10.0, 10.0, 100.0),
        ))
    }

    #[test]
    fn test_plane_distance_to_point() {
        let plane = Plane::from_point_normal(Vec3::ZERO, Vec3::Z);

        assert!((plane.distance_to_point(Vec3::new(0.0, 0.0, 5.0)) - 5.0).abs() < 1e-6);
        assert!((plane.distance_to_point(Vec3::new(0.0, 0.0, -3.0)) + 3.0).abs() < 1e-6);
        assert!(plane.distance_to_point(Vec3::new(10.0, 20.0, 0.0)).abs() < 1e-6);
    }

    #[test]
    fn test_frustum_contains_aabb() {
        let frustum = box_frustum();

        let inside = AABB::new(Vec3::new(-1.0, -1.0, 1.0), Vec3::new(1.0, 1.0, 2.0));
        assert_eq!(frustum.contains_aabb(&inside), FrustumTestResult::Inside);

        let straddling = AABB::new(Vec3::new(9.0, -1.0, 1.0), Vec3::new(11.0, 1.0, 2.0));
        assert_eq!(frustum.contains_aabb(&straddling), FrustumTestResult::Intersecting);
        assert!(frustum.contains(&straddling));

        let outside = AABB::new(Vec3::new(-1.0, -1.0, -100.0), Vec3::new(1.0, 1.0, -99.0));
        assert_eq!(frustum.contains_aabb(&outside), FrustumTestResult::Outside);
        assert!(!frustum.contains(&outside));
    }

    #[test]
    fn test_perspective_frustum() {
        let frustum = FrustumPlanes::perspective(
            Vec3::ZERO,
            Vec3::NEG_Z,
            Vec3::Y,
            crate::radians(90.0),
            1.0,
            0.1,
            100.0,
        );

        assert!(frustum.contains_point(Vec3::new(0.0, 0.0, -10.0)));
        assert!(frustum.contains_point(Vec3::new(4.0, 4.0, -10.0)));
        assert!(!frustum.contains_point(Vec3::new(0.0, 0.0, 10.0)));
        assert!(!frustum.contains_point(Vec3::new(20.0, 0.0, -10.0)));
        assert!(!frustum.contains_point(Vec3::new(0.0, -20.0, -10.0)));
        assert!(!frustum.contains_point(Vec3::new(0.0, 0.0, -200.0)));
    }
}
