/// Bounding volume component: culling and picking volume of a node.

use glam::{Mat4, Vec3};
use crate::asset::Mesh;
use crate::declare_capability;
use crate::engine_bail;
use crate::error::Result;
use crate::math::{Aabb, Frustum, Ray, RayCastResult, Sphere};
use crate::scene::{shared, Shared};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundingVolumeType {
    Aabb,
    Sphere,
}

pub trait BoundingVolumeComponent {
    /// Recompute the world-space volume from the local one
    fn update(&mut self, world_transform: &Mat4);

    fn is_in_frustum(&self, frustum: &Frustum) -> bool;

    fn intersects(&self, ray: &Ray) -> Option<RayCastResult>;

    fn volume_type(&self) -> BoundingVolumeType;

    /// World-space box enclosing the volume
    fn world_aabb(&self) -> Aabb;
}

declare_capability!(dyn BoundingVolumeComponent, "BoundingVolumeComponent");

pub struct AabbBoundingVolume {
    original: Aabb,
    working: Aabb,
}

impl AabbBoundingVolume {
    pub fn new(local: Aabb) -> Self {
        Self {
            original: local,
            working: local,
        }
    }
}

impl BoundingVolumeComponent for AabbBoundingVolume {
    fn update(&mut self, world_transform: &Mat4) {
        self.working = self.original.transformed(world_transform);
    }

    fn is_in_frustum(&self, frustum: &Frustum) -> bool {
        frustum.intersects_aabb(&self.working)
    }

    fn intersects(&self, ray: &Ray) -> Option<RayCastResult> {
        ray.intersect_aabb(&self.working)
    }

    fn volume_type(&self) -> BoundingVolumeType {
        BoundingVolumeType::Aabb
    }

    fn world_aabb(&self) -> Aabb {
        self.working
    }
}

pub struct SphereBoundingVolume {
    original: Sphere,
    working: Sphere,
}

impl SphereBoundingVolume {
    pub fn new(local: Sphere) -> Self {
        Self {
            original: local,
            working: local,
        }
    }
}

impl BoundingVolumeComponent for SphereBoundingVolume {
    fn update(&mut self, world_transform: &Mat4) {
        self.working = self.original.transformed(world_transform);
    }

    fn is_in_frustum(&self, frustum: &Frustum) -> bool {
        frustum.intersects_sphere(&self.working)
    }

    fn intersects(&self, ray: &Ray) -> Option<RayCastResult> {
        ray.intersect_sphere(&self.working)
    }

    fn volume_type(&self) -> BoundingVolumeType {
        BoundingVolumeType::Sphere
    }

    fn world_aabb(&self) -> Aabb {
        Aabb::from_center(self.working.center, Vec3::splat(self.working.radius))
    }
}

/// Builds bounding volumes from mesh vertex bounds
///
/// The local volume is offset first, then scaled.
pub struct BoundingVolumeComponentFactory;

impl BoundingVolumeComponentFactory {
    pub fn create_aabb(mesh: &Mesh, scale: Vec3, offset: Vec3) -> Result<Shared<dyn BoundingVolumeComponent>> {
        let Some(bounds) = mesh.bounds() else {
            engine_bail!("prev::BoundingVolumeComponentFactory", @InvalidResource,
                "mesh '{}' has no vertices", mesh.name());
        };
        let local = Aabb::new((bounds.min + offset) * scale, (bounds.max + offset) * scale);
        Ok(shared(AabbBoundingVolume::new(local)))
    }

    pub fn create_sphere(mesh: &Mesh, scale: f32, offset: Vec3) -> Result<Shared<dyn BoundingVolumeComponent>> {
        let Some(sphere) = Sphere::from_points(mesh.positions()) else {
            engine_bail!("prev::BoundingVolumeComponentFactory", @InvalidResource,
                "mesh '{}' has no vertices", mesh.name());
        };
        let local = Sphere::new((sphere.center + offset) * scale, sphere.radius * scale);
        Ok(shared(SphereBoundingVolume::new(local)))
    }

    pub fn create(
        volume_type: BoundingVolumeType,
        mesh: &Mesh,
        scale: Vec3,
        offset: Vec3,
    ) -> Result<Shared<dyn BoundingVolumeComponent>> {
        match volume_type {
            BoundingVolumeType::Aabb => Self::create_aabb(mesh, scale, offset),
            BoundingVolumeType::Sphere => Self::create_sphere(mesh, scale.max_element(), offset),
        }
    }
}

#[cfg(test)]
#[path = "bounding_volume_tests.rs"]
mod tests;
