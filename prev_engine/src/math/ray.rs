/// Ray: picking and intersection queries.

use glam::{Mat4, Vec2, Vec3, Vec4};
use super::bounds::{Aabb, Sphere};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction
    pub direction: Vec3,
}

/// Hit reported by a ray query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayCastResult {
    /// Distance along the ray
    pub distance: f32,
    pub point: Vec3,
}

impl Ray {
    /// Ray from `origin` along `direction` (normalized here)
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    /// Picking ray through a window position
    ///
    /// `mouse` is in pixels with the origin at the top-left corner of a
    /// `viewport` of the given size. The ray starts on the near plane.
    pub fn from_screen(mouse: Vec2, viewport: Vec2, view: &Mat4, projection: &Mat4) -> Self {
        let ndc_x = 2.0 * mouse.x / viewport.x - 1.0;
        let ndc_y = 1.0 - 2.0 * mouse.y / viewport.y;
        let inverse = (*projection * *view).inverse();

        let unproject = |depth: f32| {
            let clip = inverse * Vec4::new(ndc_x, ndc_y, depth, 1.0);
            clip.truncate() / clip.w
        };
        let near = unproject(0.0);
        let far = unproject(1.0);
        Ray::new(near, far - near)
    }

    /// Slab test; a ray starting inside the box hits at distance 0
    pub fn intersect_aabb(&self, aabb: &Aabb) -> Option<RayCastResult> {
        let inverse = self.direction.recip();
        let t1 = (aabb.min - self.origin) * inverse;
        let t2 = (aabb.max - self.origin) * inverse;

        let t_near = t1.min(t2).max_element();
        let t_far = t1.max(t2).min_element();

        if t_near > t_far || t_far < 0.0 || t_near.is_nan() || t_far.is_nan() {
            return None;
        }
        let distance = t_near.max(0.0);
        Some(RayCastResult { distance, point: self.at(distance) })
    }

    /// Closest non-negative root of |origin + t·dir - center|² = r²
    pub fn intersect_sphere(&self, sphere: &Sphere) -> Option<RayCastResult> {
        let offset = self.origin - sphere.center;
        let b = offset.dot(self.direction);
        let c = offset.length_squared() - sphere.radius * sphere.radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        let root = discriminant.sqrt();
        let near = -b - root;
        let far = -b + root;
        let distance = if near >= 0.0 {
            near
        } else if far >= 0.0 {
            0.0
        } else {
            return None;
        };
        Some(RayCastResult { distance, point: self.at(distance) })
    }
}

#[cfg(test)]
#[path = "ray_tests.rs"]
mod tests;
