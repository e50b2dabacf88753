/// Water components: surface tiles and the off-screen targets the
/// reflection and refraction passes render into.
///
/// Tile `(x, z)` is a quad of half edge `tile_size` centred on
/// `((2x + 1) · tile_size, water_level, (2z + 1) · tile_size)`, so tiles
/// of neighbouring cells meet edge to edge. The surface distortion scrolls
/// `wave_speed` cycles per second and wraps at 1.

use std::sync::Arc;
use glam::{Vec3, Vec4};
use crate::asset::{Material, Mesh, Model};
use crate::config::EngineConfig;
use crate::declare_capability;
use crate::error::Result;
use crate::render::{
    AddressMode, Filter, GpuResourceProvider, ImageDesc, ImageFormat, ImageHandle, Rect2D, SamplerDesc,
    SamplerHandle,
};
use crate::scene::node_component_helper as helper;
use crate::scene::{shared, NodeBehavior, NodeContext, Shared};
use crate::{engine_debug, engine_trace};
use super::transform::TransformComponent;

/// Tint of the default water material
pub const WATER_COLOR: Vec4 = Vec4::new(0.0, 0.3, 0.5, 1.0);

// ===== SURFACE =====

pub trait WaterComponent {
    fn model(&self) -> &Model;
    fn material(&self) -> &Material;

    fn grid_position(&self) -> (i32, i32);

    /// World position of the tile centre
    fn position(&self) -> Vec3;

    /// Distortion phase in `0..1`
    fn move_factor(&self) -> f32;

    /// Advance the distortion phase
    fn update(&mut self, delta_time: f32);
}

declare_capability!(dyn WaterComponent, "WaterComponent");

pub struct Water {
    model: Model,
    material: Material,
    grid: (i32, i32),
    position: Vec3,
    wave_speed: f32,
    move_factor: f32,
}

impl Water {
    pub fn new(model: Model, material: Material, grid_x: i32, grid_z: i32, config: &EngineConfig) -> Self {
        Self {
            model,
            material,
            grid: (grid_x, grid_z),
            position: tile_center(grid_x, grid_z, config),
            wave_speed: config.water_wave_speed,
            move_factor: 0.0,
        }
    }
}

/// Centre of water tile `(grid_x, grid_z)`
pub fn tile_center(grid_x: i32, grid_z: i32, config: &EngineConfig) -> Vec3 {
    let size = config.water_tile_size;
    Vec3::new(
        grid_x as f32 * 2.0 * size + size,
        config.water_level,
        grid_z as f32 * 2.0 * size + size,
    )
}

impl WaterComponent for Water {
    fn model(&self) -> &Model {
        &self.model
    }

    fn material(&self) -> &Material {
        &self.material
    }

    fn grid_position(&self) -> (i32, i32) {
        self.grid
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn move_factor(&self) -> f32 {
        self.move_factor
    }

    fn update(&mut self, delta_time: f32) {
        self.move_factor = (self.move_factor + self.wave_speed * delta_time).rem_euclid(1.0);
    }
}

pub struct WaterComponentFactory;

impl WaterComponentFactory {
    /// Upload a tile quad and wrap it with `material`
    pub fn create(
        gpu: &mut dyn GpuResourceProvider,
        config: &EngineConfig,
        grid_x: i32,
        grid_z: i32,
        material: Material,
    ) -> Result<Shared<dyn WaterComponent>> {
        let model = Model::upload(gpu, Arc::new(Mesh::quad(config.water_tile_size)))?;
        engine_trace!("prev::WaterComponent", "water tile ({}, {})", grid_x, grid_z);
        Ok(shared(Water::new(model, material, grid_x, grid_z, config)))
    }
}

/// Tile node behaviour: moves the node's transform onto the tile centre at
/// init and advances the water phase every update
#[derive(Debug, Default)]
pub struct WaterTileBehavior;

impl NodeBehavior for WaterTileBehavior {
    fn name(&self) -> &str {
        "WaterTile"
    }

    fn init(&mut self, ctx: &mut NodeContext<'_>) -> Result<()> {
        let water = helper::get_component::<dyn WaterComponent>(ctx.graph, ctx.node)?;
        if let Some(transform) = helper::find_component::<dyn TransformComponent>(ctx.graph, ctx.node) {
            let position = water.borrow().position();
            let mut transform = transform.borrow_mut();
            transform.set_position(position);
            transform.update(0.0);
        }
        Ok(())
    }

    fn update(&mut self, ctx: &mut NodeContext<'_>, delta_time: f32) -> Result<()> {
        let water = helper::get_component::<dyn WaterComponent>(ctx.graph, ctx.node)?;
        water.borrow_mut().update(delta_time);
        Ok(())
    }
}

// ===== OFF-SCREEN TARGETS =====

/// Colour and depth images one water pass renders into
pub trait OffScreenRenderPassComponent {
    /// Size of both images
    fn extent(&self) -> Rect2D;

    /// Viewport size divided by this gives the extent
    fn extent_divider(&self) -> u32;

    fn color_image(&self) -> ImageHandle;
    fn depth_image(&self) -> ImageHandle;
    fn sampler(&self) -> SamplerHandle;

    /// Recreate the images if `viewport` changes the extent
    ///
    /// Returns whether anything was recreated.
    fn resize(&mut self, gpu: &mut dyn GpuResourceProvider, viewport: Rect2D) -> Result<bool>;

    /// Release both images and the sampler
    fn destroy(&mut self, gpu: &mut dyn GpuResourceProvider) -> Result<()>;
}

declare_capability!(dyn OffScreenRenderPassComponent, "OffScreenRenderPassComponent");

pub struct OffScreenRenderPass {
    name: String,
    divider: u32,
    extent: Rect2D,
    color_image: ImageHandle,
    depth_image: ImageHandle,
    sampler: SamplerHandle,
}

/// `viewport / divider`, never smaller than one texel
pub fn divided_extent(viewport: Rect2D, divider: u32) -> Rect2D {
    let divider = divider.max(1);
    Rect2D::from_extent((viewport.width / divider).max(1), (viewport.height / divider).max(1))
}

fn create_images(gpu: &mut dyn GpuResourceProvider, name: &str, extent: Rect2D) -> Result<(ImageHandle, ImageHandle)> {
    let color = gpu.create_image(&ImageDesc {
        name: format!("{} color", name),
        width: extent.width,
        height: extent.height,
        layers: 1,
        format: ImageFormat::Rgba8,
    })?;
    let depth = gpu.create_image(&ImageDesc {
        name: format!("{} depth", name),
        width: extent.width,
        height: extent.height,
        layers: 1,
        format: ImageFormat::Depth32,
    })?;
    Ok((color, depth))
}

impl OffScreenRenderPass {
    pub fn new(gpu: &mut dyn GpuResourceProvider, name: &str, viewport: Rect2D, divider: u32) -> Result<Self> {
        let extent = divided_extent(viewport, divider);
        let (color_image, depth_image) = create_images(gpu, name, extent)?;
        let sampler = gpu.create_sampler(&SamplerDesc {
            filter: Filter::Linear,
            address_mode: AddressMode::ClampToEdge,
        })?;
        engine_debug!("prev::OffScreenRenderPass", "'{}' target {}x{}", name, extent.width, extent.height);

        Ok(Self {
            name: name.to_string(),
            divider,
            extent,
            color_image,
            depth_image,
            sampler,
        })
    }
}

impl OffScreenRenderPassComponent for OffScreenRenderPass {
    fn extent(&self) -> Rect2D {
        self.extent
    }

    fn extent_divider(&self) -> u32 {
        self.divider
    }

    fn color_image(&self) -> ImageHandle {
        self.color_image
    }

    fn depth_image(&self) -> ImageHandle {
        self.depth_image
    }

    fn sampler(&self) -> SamplerHandle {
        self.sampler
    }

    fn resize(&mut self, gpu: &mut dyn GpuResourceProvider, viewport: Rect2D) -> Result<bool> {
        let extent = divided_extent(viewport, self.divider);
        if extent == self.extent {
            return Ok(false);
        }
        let (color_image, depth_image) = create_images(gpu, &self.name, extent)?;
        gpu.destroy_image(self.color_image)?;
        gpu.destroy_image(self.depth_image)?;
        self.color_image = color_image;
        self.depth_image = depth_image;
        self.extent = extent;
        engine_debug!("prev::OffScreenRenderPass", "'{}' resized to {}x{}", self.name, extent.width, extent.height);
        Ok(true)
    }

    fn destroy(&mut self, gpu: &mut dyn GpuResourceProvider) -> Result<()> {
        gpu.destroy_sampler(self.sampler)?;
        gpu.destroy_image(self.depth_image)?;
        gpu.destroy_image(self.color_image)
    }
}

pub struct OffScreenRenderPassComponentFactory;

impl OffScreenRenderPassComponentFactory {
    pub fn create(
        gpu: &mut dyn GpuResourceProvider,
        name: &str,
        viewport: Rect2D,
        divider: u32,
    ) -> Result<Shared<dyn OffScreenRenderPassComponent>> {
        Ok(shared(OffScreenRenderPass::new(gpu, name, viewport, divider)?))
    }

    /// Target of the mirrored-camera pass
    pub fn create_reflection(
        gpu: &mut dyn GpuResourceProvider,
        config: &EngineConfig,
        viewport: Rect2D,
    ) -> Result<Shared<dyn OffScreenRenderPassComponent>> {
        Self::create(gpu, "water reflection", viewport, config.water_reflection_extent_divider)
    }

    /// Target of the below-surface pass
    pub fn create_refraction(
        gpu: &mut dyn GpuResourceProvider,
        config: &EngineConfig,
        viewport: Rect2D,
    ) -> Result<Shared<dyn OffScreenRenderPassComponent>> {
        Self::create(gpu, "water refraction", viewport, config.water_refraction_extent_divider)
    }
}

#[cfg(test)]
#[path = "water_tests.rs"]
mod tests;
