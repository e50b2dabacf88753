/// Sky box component: a cube drawn around the main camera.

use std::sync::Arc;
use glam::{Quat, Vec3};
use crate::asset::{Material, Mesh, Model};
use crate::declare_capability;
use crate::error::Result;
use crate::render::GpuResourceProvider;
use crate::scene::node_component_helper as helper;
use crate::scene::tags::TAG_MAIN_CAMERA;
use crate::scene::{shared, LogicOp, NodeBehavior, NodeContext, Shared, TagSet};
use super::camera::CameraComponent;
use super::transform::TransformComponent;

pub trait SkyBoxComponent {
    fn model(&self) -> &Model;

    /// Material whose image is the cube map
    fn material(&self) -> &Material;
}

declare_capability!(dyn SkyBoxComponent, "SkyBoxComponent");

pub struct SkyBox {
    model: Model,
    material: Material,
}

impl SkyBox {
    pub fn new(model: Model, material: Material) -> Self {
        Self { model, material }
    }
}

impl SkyBoxComponent for SkyBox {
    fn model(&self) -> &Model {
        &self.model
    }

    fn material(&self) -> &Material {
        &self.material
    }
}

pub struct SkyBoxComponentFactory;

impl SkyBoxComponentFactory {
    /// Upload a unit cube; the node's transform scales it to the sky size
    pub fn create(gpu: &mut dyn GpuResourceProvider, material: Material) -> Result<Shared<dyn SkyBoxComponent>> {
        let model = Model::upload(gpu, Arc::new(Mesh::cube(1.0)))?;
        Ok(shared(SkyBox::new(model, material)))
    }
}

/// Keeps the sky box centred on the main camera and slowly spinning
///
/// Needs a transform component on the node and a `MainCamera` in the tree.
#[derive(Debug, Default)]
pub struct SkyBoxBehavior;

impl NodeBehavior for SkyBoxBehavior {
    fn name(&self) -> &str {
        "SkyBox"
    }

    fn update(&mut self, ctx: &mut NodeContext<'_>, delta_time: f32) -> Result<()> {
        let root = ctx.root();
        let camera = helper::find_one::<dyn CameraComponent>(ctx.graph, root, &TagSet::from(TAG_MAIN_CAMERA), LogicOp::And)?;
        let transform = helper::get_component::<dyn TransformComponent>(ctx.graph, ctx.node)?;

        let position = camera.borrow().position();
        let angle = (ctx.config.sky_box_rotation_speed * delta_time).to_radians();
        let mut transform = transform.borrow_mut();
        transform.rotate(Quat::from_rotation_y(angle));
        transform.set_position(position);
        transform.set_scale(Vec3::splat(ctx.config.sky_box_size));
        transform.update(delta_time);
        Ok(())
    }
}

#[cfg(test)]
#[path = "sky_tests.rs"]
mod tests;
