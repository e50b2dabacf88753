/// Render component: what a static node draws.

use std::sync::Arc;
use bitflags::bitflags;
use crate::asset::{Material, Mesh, Model};
use crate::declare_capability;
use crate::error::Result;
use crate::render::GpuResourceProvider;
use crate::scene::{shared, Shared};

bitflags! {
    /// Shadow participation of a drawable
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RenderFlags: u32 {
        /// Rendered into the shadow map
        const CASTS_SHADOWS = 1 << 0;
        /// Receives shadows in the scene pass
        const CASTED_BY_SHADOWS = 1 << 1;
    }
}

/// Model, materials and flags shared by the static and animated components
#[derive(Debug, Clone)]
pub struct RenderData {
    pub model: Model,
    pub materials: Vec<Material>,
    pub flags: RenderFlags,
}

impl RenderData {
    pub fn new(model: Model, materials: Vec<Material>, flags: RenderFlags) -> Self {
        Self { model, materials, flags }
    }
}

pub trait RenderComponent {
    fn model(&self) -> &Model;

    /// Material for a mesh part's `material_index`
    fn material(&self, index: usize) -> Option<&Material>;

    fn materials(&self) -> &[Material];

    fn flags(&self) -> RenderFlags;

    fn casts_shadows(&self) -> bool {
        self.flags().contains(RenderFlags::CASTS_SHADOWS)
    }

    fn is_casted_by_shadows(&self) -> bool {
        self.flags().contains(RenderFlags::CASTED_BY_SHADOWS)
    }
}

declare_capability!(dyn RenderComponent, "RenderComponent");

pub struct StaticRender {
    data: RenderData,
}

impl StaticRender {
    pub fn new(data: RenderData) -> Self {
        Self { data }
    }
}

impl RenderComponent for StaticRender {
    fn model(&self) -> &Model {
        &self.data.model
    }

    fn material(&self, index: usize) -> Option<&Material> {
        self.data.materials.get(index)
    }

    fn materials(&self) -> &[Material] {
        &self.data.materials
    }

    fn flags(&self) -> RenderFlags {
        self.data.flags
    }
}

pub struct RenderComponentFactory;

impl RenderComponentFactory {
    pub fn create(model: Model, materials: Vec<Material>, flags: RenderFlags) -> Shared<dyn RenderComponent> {
        shared(StaticRender::new(RenderData::new(model, materials, flags)))
    }

    /// Upload `mesh` and wrap it with one material for every part
    pub fn create_from_mesh(
        gpu: &mut dyn GpuResourceProvider,
        mesh: Arc<Mesh>,
        material: Material,
        flags: RenderFlags,
    ) -> Result<Shared<dyn RenderComponent>> {
        let materials = vec![material; mesh.parts().len().max(1)];
        let model = Model::upload(gpu, mesh)?;
        Ok(Self::create(model, materials, flags))
    }
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
