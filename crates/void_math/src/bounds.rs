//! Bounding volumes for spatial queries and culling

use crate::vector::Vec3;
use crate::intersect::obb_aabb;

/// A volume that can be tested for overlap against an axis-aligned box.
///
/// This is the only test the scene index needs to prune a subtree during a
/// volume query.
pub trait BoundingVolume {
    /// Returns true if this volume and `aabb` share at least one point.
    fn intersects_aabb(&self, aabb: &AABB) -> bool;
}

/// Axis-Aligned Bounding Box
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AABB {
    pub min: Vec3,
    pub max: Vec3,
}

impl AABB {
    /// An empty (inverted) AABB, the identity of [`AABB::union`]
    pub const EMPTY: Self = Self {
        min: Vec3::MAX,
        max: Vec3::MIN,
    };

    /// Create from min and max points
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create from center and half-extents
    #[inline]
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Create the tightest box around a set of points
    pub fn from_points(points: &[Vec3]) -> Self {
        points
            .iter()
            .fold(Self::EMPTY, |aabb, &point| aabb.expand_to_include(point))
    }

    /// Get the center point
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the half-extents
    #[inline]
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Get the size (full extents)
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Check if the AABB is empty (inverted on any axis)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grow to include a point
    #[inline]
    pub fn expand_to_include(self, point: Vec3) -> Self {
        Self {
            min: self.min.min(point),
            max: self.max.max(point),
        }
    }

    /// Grow in place so that `other` is enclosed
    #[inline]
    pub fn expand_to_contain(&mut self, other: &AABB) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Smallest box enclosing both boxes
    #[inline]
    pub fn union(&self, other: &AABB) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Check if a point is inside
    #[inline]
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if another AABB is fully contained
    #[inline]
    pub fn contains_aabb(&self, other: &AABB) -> bool {
        self.contains_point(other.min) && self.contains_point(other.max)
    }

    /// Check if two AABBs intersect (touching counts)
    #[inline]
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Get the closest point on the AABB to a given point
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        Vec3::new(
            point.x.clamp(self.min.x, self.max.x),
            point.y.clamp(self.min.y, self.max.y),
            point.z.clamp(self.min.z, self.max.z),
        )
    }

    /// Get the squared distance to a point (zero when inside)
    pub fn distance_squared_to_point(&self, point: Vec3) -> f32 {
        (point - self.closest_point(point)).length_squared()
    }
}

impl Default for AABB {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl BoundingVolume for AABB {
    #[inline]
    fn intersects_aabb(&self, aabb: &AABB) -> bool {
        self.intersects(aabb)
    }
}

/// Bounding Sphere
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    #[inline]
    pub const fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Bounding sphere of an AABB
    pub fn from_aabb(aabb: &AABB) -> Self {
        Self {
            center: aabb.center(),
            radius: aabb.half_extents().length(),
        }
    }

    #[inline]
    pub fn contains_point(&self, point: Vec3) -> bool {
        (point - self.center).length_squared() <= self.radius * self.radius
    }

    pub fn intersects_aabb(&self, aabb: &AABB) -> bool {
        aabb.distance_squared_to_point(self.center) <= self.radius * self.radius
    }

    pub fn to_aabb(&self) -> AABB {
        AABB::from_center_half_extents(self.center, Vec3::splat(self.radius))
    }
}

impl Default for Sphere {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 0.0)
    }
}

impl BoundingVolume for Sphere {
    #[inline]
    fn intersects_aabb(&self, aabb: &AABB) -> bool {
        Sphere::intersects_aabb(self, aabb)
    }
}

/// Oriented Bounding Box
///
/// `axes` form an orthonormal basis; `half_extents[i]` is measured along
/// `axes[i]`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Obb {
    pub center: Vec3,
    pub axes: [Vec3; 3],
    pub half_extents: Vec3,
}

impl Obb {
    /// Create an OBB, normalizing the supplied axes
    pub fn new(center: Vec3, axes: [Vec3; 3], half_extents: Vec3) -> Self {
        Self {
            center,
            axes: [axes[0].normalize(), axes[1].normalize(), axes[2].normalize()],
            half_extents,
        }
    }

    /// An OBB rotated about the Y axis by `angle` radians
    pub fn from_yaw(center: Vec3, half_extents: Vec3, angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            center,
            axes: [
                Vec3::new(cos, 0.0, -sin),
                Vec3::Y,
                Vec3::new(sin, 0.0, cos),
            ],
            half_extents,
        }
    }

    /// Axis-aligned OBB covering exactly the same region as `aabb`
    pub fn from_aabb(aabb: &AABB) -> Self {
        Self {
            center: aabb.center(),
            axes: [Vec3::X, Vec3::Y, Vec3::Z],
            half_extents: aabb.half_extents(),
        }
    }

    /// Smallest AABB enclosing this box
    pub fn to_aabb(&self) -> AABB {
        let extent = Vec3::new(
            self.axes[0].x.abs() * self.half_extents.x
                + self.axes[1].x.abs() * self.half_extents.y
                + self.axes[2].x.abs() * self.half_extents.z,
            self.axes[0].y.abs() * self.half_extents.x
                + self.axes[1].y.abs() * self.half_extents.y
                + self.axes[2].y.abs() * self.half_extents.z,
            self.axes[0].z.abs() * self.half_extents.x
                + self.axes[1].z.abs() * self.half_extents.y
                + self.axes[2].z.abs() * self.half_extents.z,
        );
        AABB::from_center_half_extents(self.center, extent)
    }
}

impl BoundingVolume for Obb {
    #[inline]
    fn intersects_aabb(&self, aabb: &AABB) -> bool {
        obb_aabb(self, aabb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_union_and_expand() {
        let a = AABB::new(Vec3::ZERO, Vec3::ONE);
        let b = AABB::new(Vec3::splat(2.0), Vec3::splat(3.0));

        let mut grown = a;
        grown.expand_to_contain(&b);
        assert_eq!(grown, a.union(&b));
        assert_eq!(grown.min, Vec3::ZERO);
        assert_eq!(grown.max, Vec3::splat(3.0));
    }

    #[test]
    fn test_empty_is_union_identity() {
        let a = AABB::new(Vec3::new(-1.0, 2.0, 0.0), Vec3::new(1.0, 3.0, 4.0));
        assert!(AABB::EMPTY.is_empty());
        assert_eq!(AABB::EMPTY.union(&a), a);
    }

    #[test]
    fn test_aabb_intersects() {
        let a = AABB::new(Vec3::ZERO, Vec3::ONE);
        let b = AABB::new(Vec3::splat(0.5), Vec3::splat(1.5));
        let c = AABB::new(Vec3::splat(2.0), Vec3::splat(3.0));

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_sphere_intersects_aabb() {
        let aabb = AABB::new(Vec3::ZERO, Vec3::ONE);
        assert!(Sphere::new(Vec3::new(1.5, 0.5, 0.5), 0.6).intersects_aabb(&aabb));
        assert!(!Sphere::new(Vec3::new(3.0, 3.0, 3.0), 1.0).intersects_aabb(&aabb));
    }

    #[test]
    fn test_obb_to_aabb_rotated() {
        let obb = Obb::from_yaw(Vec3::ZERO, Vec3::new(1.0, 1.0, 1.0), core::f32::consts::FRAC_PI_4);
        let aabb = obb.to_aabb();
        let diag = 2.0f32.sqrt();
        assert!((aabb.max.x - diag).abs() < 1e-5);
        assert!((aabb.max.y - 1.0).abs() < 1e-5);
        assert!((aabb.max.z - diag).abs() < 1e-5);
    }
}
