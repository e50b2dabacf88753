/// Scene pass for the sky box.
///
/// The cube follows the camera, so it is drawn without depth writes and
/// blends into the fog colour towards the horizon.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};
use crate::component::SkyBoxComponent;
use crate::config::EngineConfig;
use crate::engine_bail;
use crate::error::Result;
use crate::render::context::{CameraView, RenderContext};
use crate::render::gpu::{CullMode, GpuResourceProvider, PipelineDesc, SamplerDesc, SamplerHandle, ShaderBindings};
use crate::render::renderer::{DrawInput, Drawable, RenderStrategy, UNIFORM_SLOT};
use crate::scene::node_component_helper as helper;
use crate::scene::tags::{TAG_SKY_BOX_RENDER_COMPONENT, TAG_TRANSFORM_COMPONENT};
use crate::scene::{NodeKey, SceneGraph, TagSet};
use super::scene_globals::CameraBlock;

pub const CUBE_MAP_SAMPLER: &str = "cubeMap";

/// Height band (in unit-cube coordinates) where the sky fades into fog
pub const SKY_FOG_LIMITS: Vec4 = Vec4::new(0.0, 0.03, 0.0, 0.0);

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SkyBoxUniforms {
    pub model: Mat4,
    pub camera: CameraBlock,
    pub fog_color: Vec4,
    /// Lower limit, upper limit
    pub limits: Vec4,
}

#[derive(Debug, Default)]
pub struct SkyBoxStrategy {
    sampler: Option<SamplerHandle>,
}

impl RenderStrategy for SkyBoxStrategy {
    type Globals = CameraView;
    type Uniforms = SkyBoxUniforms;

    fn name(&self) -> &str {
        "sky_box"
    }

    fn required_tags(&self) -> TagSet {
        TagSet::from([TAG_SKY_BOX_RENDER_COMPONENT, TAG_TRANSFORM_COMPONENT])
    }

    fn pipeline_desc(&self, _config: &EngineConfig) -> PipelineDesc {
        let mut desc = PipelineDesc::opaque("sky_box", &[UNIFORM_SLOT], &[CUBE_MAP_SAMPLER]).with_cull_mode(CullMode::None);
        desc.depth_write = false;
        desc
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
        let sky = helper::get_component::<dyn SkyBoxComponent>(graph, node)?;
        let sky = sky.borrow();
        Ok(Some(Drawable::new(sky.model().clone(), vec![sky.material().clone()])))
    }

    fn globals(&self, ctx: &RenderContext, _graph: &SceneGraph) -> Result<CameraView> {
        match ctx.primary_view() {
            Some(view) => Ok(*view),
            None => engine_bail!("prev::SkyBoxStrategy", @InvalidResource, "sky pass has no camera view"),
        }
    }

    fn assemble(&self, input: &DrawInput<'_, CameraView>) -> SkyBoxUniforms {
        SkyBoxUniforms {
            model: input.model_matrix,
            camera: CameraBlock::new(input.globals, input.ctx.clip_plane),
            fog_color: input.ctx.config.fog_color,
            limits: SKY_FOG_LIMITS,
        }
    }

    fn bind(&self, input: &DrawInput<'_, CameraView>, bindings: &mut ShaderBindings) -> Result<()> {
        let Some(image) = input.material.image else {
            return Ok(());
        };
        let Some(sampler) = self.sampler else {
            engine_bail!("prev::SkyBoxStrategy", @InitializationFailed, "cube map sampler is not created");
        };
        bindings.bind_image(CUBE_MAP_SAMPLER, image, sampler);
        Ok(())
    }
}
