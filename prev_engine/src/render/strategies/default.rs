/// Scene pass for static geometry.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use crate::component::RenderComponent;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::render::context::RenderContext;
use crate::render::gpu::{GpuResourceProvider, PipelineDesc, SamplerDesc, SamplerHandle, ShaderBindings};
use crate::render::renderer::{DrawInput, Drawable, RenderStrategy, UNIFORM_SLOT};
use crate::scene::node_component_helper as helper;
use crate::scene::tags::{TAG_RENDER_COMPONENT, TAG_TRANSFORM_COMPONENT};
use crate::scene::{NodeKey, SceneGraph, TagSet};
use super::scene_globals::{
    bind_material_images, bind_shadow_map, is_selected, CameraBlock, LightingBlock, MaterialBlock, SceneGlobals,
    COLOR_SAMPLER, DEPTH_SAMPLER, NORMAL_SAMPLER,
};

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct DefaultUniforms {
    pub model: Mat4,
    pub normal_matrix: Mat4,
    pub camera: CameraBlock,
    pub material: MaterialBlock,
    pub lighting: LightingBlock,
}

#[derive(Debug, Default)]
pub struct DefaultStrategy {
    sampler: Option<SamplerHandle>,
}

impl RenderStrategy for DefaultStrategy {
    type Globals = SceneGlobals;
    type Uniforms = DefaultUniforms;

    fn name(&self) -> &str {
        "default"
    }

    fn required_tags(&self) -> TagSet {
        TagSet::from([TAG_RENDER_COMPONENT, TAG_TRANSFORM_COMPONENT])
    }

    fn pipeline_desc(&self, _config: &EngineConfig) -> PipelineDesc {
        PipelineDesc::opaque("default", &[UNIFORM_SLOT], &[COLOR_SAMPLER, NORMAL_SAMPLER, DEPTH_SAMPLER])
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
        let render = helper::get_component::<dyn RenderComponent>(graph, node)?;
        let render = render.borrow();
        let mut drawable = Drawable::new(render.model().clone(), render.materials().to_vec());
        drawable.selected = is_selected(graph, node);
        drawable.casted_by_shadows = render.is_casted_by_shadows();
        Ok(Some(drawable))
    }

    fn globals(&self, ctx: &RenderContext, graph: &SceneGraph) -> Result<SceneGlobals> {
        SceneGlobals::resolve(ctx, graph)
    }

    fn assemble(&self, input: &DrawInput<'_, SceneGlobals>) -> DefaultUniforms {
        let config = input.ctx.config;
        DefaultUniforms {
            model: input.model_matrix,
            normal_matrix: input.model_matrix.inverse().transpose(),
            camera: CameraBlock::new(&input.globals.view, input.ctx.clip_plane),
            material: MaterialBlock::new(input.material, input.drawable.selected, input.drawable.casted_by_shadows, config),
            lighting: LightingBlock::new(input.globals, config),
        }
    }

    fn bind(&self, input: &DrawInput<'_, SceneGlobals>, bindings: &mut ShaderBindings) -> Result<()> {
        bind_material_images(input.material, self.sampler, bindings)?;
        bind_shadow_map(input.globals, bindings);
        Ok(())
    }
}
