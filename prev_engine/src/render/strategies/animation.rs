/// Scene pass for skinned geometry.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};
use crate::component::AnimationRenderComponent;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::render::context::RenderContext;
use crate::render::gpu::{GpuResourceProvider, PipelineDesc, SamplerDesc, SamplerHandle, ShaderBindings};
use crate::render::renderer::{DrawInput, Drawable, RenderStrategy, UNIFORM_SLOT};
use crate::scene::node_component_helper as helper;
use crate::scene::tags::{TAG_ANIMATION_RENDER_COMPONENT, TAG_TRANSFORM_COMPONENT};
use crate::scene::{NodeKey, SceneGraph, TagSet};
use super::scene_globals::{
    bind_material_images, bind_shadow_map, is_selected, CameraBlock, LightingBlock, MaterialBlock, SceneGlobals,
    COLOR_SAMPLER, DEPTH_SAMPLER, NORMAL_SAMPLER,
};

/// Bone slots in a skinned uniform block
pub const MAX_BONES: usize = 100;

/// Copy `bones` into a fixed bone array; extra slots stay identity
pub(crate) fn bone_array(bones: &[Mat4]) -> [Mat4; MAX_BONES] {
    let mut array = [Mat4::IDENTITY; MAX_BONES];
    for (slot, bone) in array.iter_mut().zip(bones) {
        *slot = *bone;
    }
    array
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct AnimationUniforms {
    pub model: Mat4,
    pub normal_matrix: Mat4,
    pub camera: CameraBlock,
    pub material: MaterialBlock,
    pub lighting: LightingBlock,
    pub bones: [Mat4; MAX_BONES],
    /// Bone count
    pub skinning: Vec4,
}

#[derive(Debug, Default)]
pub struct AnimationStrategy {
    sampler: Option<SamplerHandle>,
}

impl RenderStrategy for AnimationStrategy {
    type Globals = SceneGlobals;
    type Uniforms = AnimationUniforms;

    fn name(&self) -> &str {
        "animation"
    }

    fn required_tags(&self) -> TagSet {
        TagSet::from([TAG_ANIMATION_RENDER_COMPONENT, TAG_TRANSFORM_COMPONENT])
    }

    fn pipeline_desc(&self, _config: &EngineConfig) -> PipelineDesc {
        PipelineDesc::opaque("animation", &[UNIFORM_SLOT], &[COLOR_SAMPLER, NORMAL_SAMPLER, DEPTH_SAMPLER])
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

    fn resolve(&self, ctx: &RenderContext, graph: &SceneGraph, node: NodeKey) -> Result<Option<Drawable>> {
        let animated = helper::get_component::<dyn AnimationRenderComponent>(graph, node)?;
        let animated = animated.borrow();
        let mut drawable = Drawable::new(animated.model().clone(), animated.materials().to_vec());
        drawable.bones = animated.bone_transforms();
        drawable.bones.truncate(ctx.config.max_bones_count.min(MAX_BONES));
        drawable.selected = is_selected(graph, node);
        drawable.casted_by_shadows = animated.is_casted_by_shadows();
        Ok(Some(drawable))
    }

    fn globals(&self, ctx: &RenderContext, graph: &SceneGraph) -> Result<SceneGlobals> {
        SceneGlobals::resolve(ctx, graph)
    }

    fn assemble(&self, input: &DrawInput<'_, SceneGlobals>) -> AnimationUniforms {
        let config = input.ctx.config;
        AnimationUniforms {
            model: input.model_matrix,
            normal_matrix: input.model_matrix.inverse().transpose(),
            camera: CameraBlock::new(&input.globals.view, input.ctx.clip_plane),
            material: MaterialBlock::new(input.material, input.drawable.selected, input.drawable.casted_by_shadows, config),
            lighting: LightingBlock::new(input.globals, config),
            bones: bone_array(&input.drawable.bones),
            skinning: Vec4::new(input.drawable.bones.len() as f32, 0.0, 0.0, 0.0),
        }
    }

    fn bind(&self, input: &DrawInput<'_, SceneGlobals>, bindings: &mut ShaderBindings) -> Result<()> {
        bind_material_images(input.material, self.sampler, bindings)?;
        bind_shadow_map(input.globals, bindings);
        Ok(())
    }
}
