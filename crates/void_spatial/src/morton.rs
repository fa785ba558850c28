//! Morton (Z-order) keys for scene points.
//!
//! Keys interleave 21 bits per axis into 63 bits, x in the highest position of
//! each triplet. Nearby points tend to get nearby keys; the curve jumps at
//! power-of-two boundaries, which the hierarchy tolerates.

use void_math::{Vec3, AABB};

/// Quantization bits per axis
pub const BITS_PER_AXIS: u32 = 21;

const AXIS_MASK: u64 = (1 << BITS_PER_AXIS) - 1;
const QUANT_SCALE: f32 = (1u32 << BITS_PER_AXIS) as f32;

/// Default floor for the batch normalization extent
pub const DEFAULT_EPSILON: f32 = 1e-6;

// Spreads the low 21 bits of `a` two zero bits apart.
#[inline]
fn split_by_3(a: u32) -> u64 {
    let mut x = a as u64 & AXIS_MASK;
    x = (x | x << 32) & 0x1f00000000ffff;
    x = (x | x << 16) & 0x1f0000ff0000ff;
    x = (x | x << 8) & 0x100f00f00f00f00f;
    x = (x | x << 4) & 0x10c30c30c30c30c3;
    x = (x | x << 2) & 0x1249249249249249;
    x
}

#[inline]
fn quantize(v: f32) -> u32 {
    // NaN saturates to zero through the cast.
    (v * QUANT_SCALE).clamp(0.0, QUANT_SCALE - 1.0) as u32
}

/// Morton key of a point whose coordinates are expected in `[0, 1]`.
///
/// Coordinates outside that range are clamped to the nearest edge.
#[inline]
pub fn calculate(x: f32, y: f32, z: f32) -> u64 {
    split_by_3(quantize(x)) << 2 | split_by_3(quantize(y)) << 1 | split_by_3(quantize(z))
}

#[inline]
pub fn calculate_point(p: Vec3) -> u64 {
    calculate(p.x, p.y, p.z)
}

/// Affine map taking a point set's bounding range onto the unit cube
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MortonTransform {
    pub offset: Vec3,
    pub scale: Vec3,
}

impl MortonTransform {
    pub const IDENTITY: Self = Self {
        offset: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    /// Fit the transform to `points`
    ///
    /// An axis whose extent is below `epsilon` is scaled by `1 / epsilon`, so
    /// coincident points all land on zero instead of dividing by zero. The
    /// floor itself never drops below `f32::MIN_POSITIVE`.
    pub fn fit(points: &[Vec3], epsilon: f32) -> Self {
        if points.is_empty() {
            return Self::IDENTITY;
        }

        let range = AABB::from_points(points);
        let extent = range.size().max(Vec3::splat(epsilon.max(f32::MIN_POSITIVE)));

        Self {
            offset: range.min,
            scale: Vec3::new(1.0 / extent.x, 1.0 / extent.y, 1.0 / extent.z),
        }
    }

    #[inline]
    pub fn apply(&self, p: Vec3) -> Vec3 {
        (p - self.offset).mul_elem(self.scale)
    }
}

impl Default for MortonTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A key paired with the position of its point in the input slice
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct MortonEntry {
    pub code: u64,
    pub index: usize,
}

/// Keys for a batch of unnormalized points.
///
/// The points are first mapped onto the unit cube by a single
/// [`MortonTransform`] fitted to the whole batch. With `sort`, entries come
/// back in ascending key order; equal keys keep their input order.
pub fn calculate_batch(points: &[Vec3], epsilon: f32, sort: bool) -> Vec<MortonEntry> {
    let transform = MortonTransform::fit(points, epsilon);

    let mut entries: Vec<MortonEntry> = points
        .iter()
        .enumerate()
        .map(|(index, &p)| MortonEntry {
            code: calculate_point(transform.apply(p)),
            index,
        })
        .collect();

    if sort {
        entries.sort_by_key(|entry| entry.code);
    }

    entries
}

/// Midpoint of two keys without overflow
#[inline]
pub fn midpoint(a: u64, b: u64) -> u64 {
    (a & b) + ((a ^ b) >> 1)
}
