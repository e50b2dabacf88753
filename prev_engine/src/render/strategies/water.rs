/// Scene pass for water tiles.
///
/// Samples the reflection and refraction targets rendered earlier in the
/// frame, distorted by the material's du/dv map scrolled by the tile's
/// move factor. The refraction depth image gives the water depth, which
/// needs the camera's near and far planes.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};
use crate::component::{OffScreenRenderPassComponent, WaterComponent, WATER_COLOR};
use crate::config::EngineConfig;
use crate::engine_bail;
use crate::error::Result;
use crate::render::context::RenderContext;
use crate::render::gpu::{
    CullMode, GpuResourceProvider, ImageHandle, PipelineDesc, SamplerDesc, SamplerHandle, ShaderBindings,
};
use crate::render::renderer::{DrawInput, Drawable, RenderStrategy, UNIFORM_SLOT};
use crate::scene::node_component_helper as helper;
use crate::scene::tags::{
    TAG_TRANSFORM_COMPONENT, TAG_WATER_REFLECTION_RENDER_COMPONENT, TAG_WATER_REFRACTION_RENDER_COMPONENT,
    TAG_WATER_RENDER_COMPONENT,
};
use crate::scene::{LogicOp, NodeKey, SceneGraph, TagSet};
use super::scene_globals::{bind_shadow_map, CameraBlock, LightingBlock, MaterialBlock, SceneGlobals, DEPTH_SAMPLER};

pub const REFLECTION_SAMPLER: &str = "reflectionTexture";
pub const REFRACTION_SAMPLER: &str = "refractionTexture";
pub const WATER_DEPTH_SAMPLER: &str = "depthMapTexture";
pub const DUDV_SAMPLER: &str = "dudvMapTexture";
pub const WATER_NORMAL_SAMPLER: &str = "normalMapTexture";

/// Images of one off-screen target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetImages {
    pub color: ImageHandle,
    pub depth: ImageHandle,
    pub sampler: SamplerHandle,
}

impl TargetImages {
    fn of(target: &dyn OffScreenRenderPassComponent) -> Self {
        Self {
            color: target.color_image(),
            depth: target.depth_image(),
            sampler: target.sampler(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WaterGlobals {
    pub scene: SceneGlobals,
    pub reflection: TargetImages,
    pub refraction: TargetImages,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct WaterUniforms {
    pub model: Mat4,
    pub camera: CameraBlock,
    pub material: MaterialBlock,
    pub lighting: LightingBlock,
    pub water_color: Vec4,
    /// Near plane, far plane, move factor
    pub params: Vec4,
}

/// Near and far distances of a 0..1-depth perspective projection
pub fn near_far(projection: &Mat4) -> (f32, f32) {
    let a = projection.z_axis.z;
    let b = projection.w_axis.z;
    (b / a, b / (1.0 + a))
}

#[derive(Debug, Default)]
pub struct WaterStrategy {
    sampler: Option<SamplerHandle>,
}

impl RenderStrategy for WaterStrategy {
    type Globals = WaterGlobals;
    type Uniforms = WaterUniforms;

    fn name(&self) -> &str {
        "water"
    }

    fn required_tags(&self) -> TagSet {
        TagSet::from([TAG_WATER_RENDER_COMPONENT, TAG_TRANSFORM_COMPONENT])
    }

    fn pipeline_desc(&self, _config: &EngineConfig) -> PipelineDesc {
        PipelineDesc::blended(
            "water",
            &[UNIFORM_SLOT],
            &[
                REFLECTION_SAMPLER,
                REFRACTION_SAMPLER,
                WATER_DEPTH_SAMPLER,
                DUDV_SAMPLER,
                WATER_NORMAL_SAMPLER,
                DEPTH_SAMPLER,
            ],
        )
        .with_cull_mode(CullMode::Back)
    }

    fn init(&mut self, gpu: &mut dyn GpuResourceProvider) -> Result<()> {
        self.sampler = Some(gpu.create_sampler(&SamplerDesc::default())?);
        Ok(())
    }

    fn shutdown(&mut self, gpu: &mut dyn GpuResourceProvider) -> Result<()> {
        match self.sampler.take() {
            Some(sampler) => gpu.destroy_sampler(sampler),
            None => Ok(()),
        }
    }

    fn resolve(&self, _ctx: &RenderContext, graph: &SceneGraph, node: NodeKey) -> Result<Option<Drawable>> {
        let water = helper::get_component::<dyn WaterComponent>(graph, node)?;
        let water = water.borrow();
        let mut drawable = Drawable::new(water.model().clone(), vec![water.material().clone()]);
        drawable.node_params = Vec4::new(water.move_factor(), 0.0, 0.0, 0.0);
        Ok(Some(drawable))
    }

    /// # Errors
    ///
    /// `NodeNotFound` if the reflection or refraction target is missing, on
    /// top of the `SceneGlobals` failures.
    fn globals(&self, ctx: &RenderContext, graph: &SceneGraph) -> Result<WaterGlobals> {
        let scene = SceneGlobals::resolve(ctx, graph)?;
        let reflection = helper::find_one::<dyn OffScreenRenderPassComponent>(
            graph,
            ctx.root,
            &TagSet::from(TAG_WATER_REFLECTION_RENDER_COMPONENT),
            LogicOp::And,
        )?;
        let refraction = helper::find_one::<dyn OffScreenRenderPassComponent>(
            graph,
            ctx.root,
            &TagSet::from(TAG_WATER_REFRACTION_RENDER_COMPONENT),
            LogicOp::And,
        )?;
        let reflection = TargetImages::of(&*reflection.borrow());
        let refraction = TargetImages::of(&*refraction.borrow());
        Ok(WaterGlobals { scene, reflection, refraction })
    }

    fn assemble(&self, input: &DrawInput<'_, WaterGlobals>) -> WaterUniforms {
        let config = input.ctx.config;
        let view = &input.globals.scene.view;
        let (near, far) = near_far(&view.projection);
        WaterUniforms {
            model: input.model_matrix,
            camera: CameraBlock::new(view, input.ctx.clip_plane),
            material: MaterialBlock::new(input.material, false, false, config),
            lighting: LightingBlock::new(&input.globals.scene, config),
            water_color: WATER_COLOR,
            params: Vec4::new(near, far, input.drawable.node_params.x, 0.0),
        }
    }

    fn bind(&self, input: &DrawInput<'_, WaterGlobals>, bindings: &mut ShaderBindings) -> Result<()> {
        let globals = input.globals;
        bindings.bind_image(REFLECTION_SAMPLER, globals.reflection.color, globals.reflection.sampler);
        bindings.bind_image(REFRACTION_SAMPLER, globals.refraction.color, globals.refraction.sampler);
        bindings.bind_image(WATER_DEPTH_SAMPLER, globals.refraction.depth, globals.refraction.sampler);

        if input.material.image.is_some() || input.material.normal_image.is_some() {
            let Some(sampler) = self.sampler else {
                engine_bail!("prev::WaterStrategy", @InitializationFailed, "water map sampler is not created");
            };
            if let Some(image) = input.material.image {
                bindings.bind_image(DUDV_SAMPLER, image, sampler);
            }
            if let Some(image) = input.material.normal_image {
                bindings.bind_image(WATER_NORMAL_SAMPLER, image, sampler);
            }
        }
        bind_shadow_map(&globals.scene, bindings);
        Ok(())
    }
}
