//! Intersection tests for scene queries
//!
//! - Ray vs AABB (slab method)
//! - OBB vs AABB (separating axis theorem)

use crate::ray::Ray;
use crate::vector::Vec3;
use crate::bounds::{AABB, Obb};

/// Ray-AABB intersection using the slab method
///
/// Returns the distance along the ray to the entry point, zero if the
/// origin already lies inside the box, or None if the box is missed or
/// lies entirely behind the origin.
pub fn ray_aabb(ray: &Ray, aabb: &AABB) -> Option<f32> {
    if aabb.is_empty() {
        return None;
    }

    let mut tmin = f32::NEG_INFINITY;
    let mut tmax = f32::INFINITY;

    for axis in 0..3 {
        let origin = ray.origin[axis];
        let dir = ray.direction[axis];
        let (min, max) = (aabb.min[axis], aabb.max[axis]);

        if dir == 0.0 {
            // Parallel to this slab: the ray is inside it everywhere or nowhere.
            if origin < min || origin > max {
                return None;
            }
            continue;
        }

        let inv = 1.0 / dir;
        let t1 = (min - origin) * inv;
        let t2 = (max - origin) * inv;
        tmin = tmin.max(t1.min(t2));
        tmax = tmax.min(t1.max(t2));
    }

    if tmax < 0.0 || tmin > tmax {
        None
    } else {
        Some(tmin.max(0.0))
    }
}

/// OBB-AABB overlap using the separating axis theorem
///
/// Tests the three box axes of each volume and their nine cross products.
pub fn obb_aabb(obb: &Obb, aabb: &AABB) -> bool {
    if aabb.is_empty() {
        return false;
    }

    // Small bias so near-parallel edge pairs don't produce false separation.
    const BIAS: f32 = 1e-6;

    let a = aabb.half_extents();
    let b = obb.half_extents;
    let t: Vec3 = obb.center - aabb.center();

    // r[i][j] = world axis i projected on obb axis j
    let mut r = [[0.0f32; 3]; 3];
    let mut abs_r = [[0.0f32; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            r[i][j] = obb.axes[j][i];
            abs_r[i][j] = r[i][j].abs() + BIAS;
        }
    }

    for i in 0..3 {
        let ra = a[i];
        let rb = b[0] * abs_r[i][0] + b[1] * abs_r[i][1] + b[2] * abs_r[i][2];
        if t[i].abs() > ra + rb {
            return false;
        }
    }

    for j in 0..3 {
        let ra = a[0] * abs_r[0][j] + a[1] * abs_r[1][j] + a[2] * abs_r[2][j];
        let rb = b[j];
        if t.dot(obb.axes[j]).abs() > ra + rb {
            return false;
        }
    }

    for i in 0..3 {
        let (i1, i2) = ((i + 1) % 3, (i + 2) % 3);
        for j in 0..3 {
            let (j1, j2) = ((j + 1) % 3, (j + 2) % 3);
            let ra = a[i1] * abs_r[i2][j] + a[i2] * abs_r[i1][j];
            let rb = b[j1] * abs_r[i][j2] + b[j2] * abs_r[i][j1];
            let dist = (t[i2] * r[i1][j] - t[i1] * r[i2][j]).abs();
            if dist > ra + rb {
                return false;
            }
        }
    }

    true
}
