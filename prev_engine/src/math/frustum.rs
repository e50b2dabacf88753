/// Frustum: six clipping planes for visibility culling.
///
/// Each plane is represented as a Vec4 (A, B, C, D) where:
/// - (A, B, C) is the inward-pointing normal
/// - D is the signed distance
/// - A point P is inside the frustum if dot(plane, P_homogeneous) >= 0 for all planes
///
/// Projections use a 0..1 depth range, so the near plane is row 2 of the
/// view-projection matrix on its own.

use glam::{Mat4, Vec3, Vec4};
use super::bounds::{Aabb, Sphere};

/// Frustum plane indices
pub const PLANE_LEFT: usize = 0;
pub const PLANE_RIGHT: usize = 1;
pub const PLANE_BOTTOM: usize = 2;
pub const PLANE_TOP: usize = 3;
pub const PLANE_NEAR: usize = 4;
pub const PLANE_FAR: usize = 5;

/// Six frustum planes for culling.
///
/// Works with both perspective and orthographic projections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Frustum planes: left, right, bottom, top, near, far
    pub planes: [Vec4; 6],
}

impl Frustum {
    /// Extract frustum planes from a view-projection matrix.
    ///
    /// Gribb & Hartmann extraction, each plane normalized so that (A, B, C)
    /// is a unit vector.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let row0 = vp.row(0);
        let row1 = vp.row(1);
        let row2 = vp.row(2);
        let row3 = vp.row(3);

        let mut planes = [
            row3 + row0,
            row3 - row0,
            row3 + row1,
            row3 - row1,
            row2,
            row3 - row2,
        ];

        for plane in &mut planes {
            let normal_len = plane.truncate().length();
            if normal_len > 0.0 {
                *plane /= normal_len;
            }
        }

        Self { planes }
    }

    /// Signed distance from `point` to plane `index` (positive inside)
    pub fn distance(&self, index: usize, point: Vec3) -> f32 {
        self.planes[index].truncate().dot(point) + self.planes[index].w
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        (0..6).all(|index| self.distance(index, point) >= 0.0)
    }

    /// Test if a box intersects this frustum.
    ///
    /// "Positive vertex" test: for each plane, take the corner most in the
    /// direction of the plane normal. If that corner is outside, the box is
    /// fully outside. Conservative: may report false positives near the
    /// frustum edges, never false negatives.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.planes.iter().all(|plane| {
            let normal = plane.truncate();
            let p_vertex = Vec3::select(normal.cmpge(Vec3::ZERO), aabb.max, aabb.min);
            normal.dot(p_vertex) + plane.w >= 0.0
        })
    }

    /// Test if a sphere intersects this frustum (conservative)
    pub fn intersects_sphere(&self, sphere: &Sphere) -> bool {
        (0..6).all(|index| self.distance(index, sphere.center) >= -sphere.radius)
    }
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
