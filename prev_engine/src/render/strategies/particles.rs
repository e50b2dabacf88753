/// Scene pass for particle systems.
///
/// One instanced draw of the billboard quad per system; the per-particle
/// position, rotation, scale and atlas stage come from the system's
/// instance buffer of the current frame in flight.

use bytemuck::{Pod, Zeroable};
use glam::Vec4;
use crate::component::ParticleSystemComponent;
use crate::config::EngineConfig;
use crate::engine_bail;
use crate::error::Result;
use crate::render::context::{CameraView, RenderContext};
use crate::render::gpu::{GpuResourceProvider, PipelineDesc, SamplerDesc, SamplerHandle, ShaderBindings};
use crate::render::renderer::{DrawInput, Drawable, InstanceData, RenderStrategy, UNIFORM_SLOT};
use crate::scene::node_component_helper as helper;
use crate::scene::tags::{TAG_PARTICLE_SYSTEM_COMPONENT, TAG_TRANSFORM_COMPONENT};
use crate::scene::{NodeKey, SceneGraph, TagSet};
use super::scene_globals::{CameraBlock, COLOR_SAMPLER};

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ParticleUniforms {
    pub camera: CameraBlock,
    pub color: Vec4,
    /// Atlas rows
    pub params: Vec4,
}

#[derive(Debug, Default)]
pub struct ParticlesStrategy {
    sampler: Option<SamplerHandle>,
}

impl RenderStrategy for ParticlesStrategy {
    type Globals = CameraView;
    type Uniforms = ParticleUniforms;

    fn name(&self) -> &str {
        "particles"
    }

    fn required_tags(&self) -> TagSet {
        TagSet::from([TAG_PARTICLE_SYSTEM_COMPONENT, TAG_TRANSFORM_COMPONENT])
    }

    fn pipeline_desc(&self, _config: &EngineConfig) -> PipelineDesc {
        PipelineDesc::blended("particles", &[UNIFORM_SLOT], &[COLOR_SAMPLER]).with_instancing()
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

    /// # Errors
    ///
    /// `InvalidResource` if the system's instance buffers are destroyed.
    fn resolve(&self, ctx: &RenderContext, graph: &SceneGraph, node: NodeKey) -> Result<Option<Drawable>> {
        let system = helper::get_component::<dyn ParticleSystemComponent>(graph, node)?;
        let system = system.borrow();
        let Some(buffer) = system.instance_buffer(ctx.frame_in_flight) else {
            engine_bail!("prev::ParticlesStrategy", @InvalidResource,
                "{}: particle system has no instance buffer", graph.describe(node));
        };
        let instances = system.instances();
        let material = system.material().clone();

        let mut drawable = Drawable::new(system.model().clone(), vec![material]);
        drawable.node_params = Vec4::new(system.material().atlas_rows as f32, 0.0, 0.0, 0.0);
        drawable.instances = Some(InstanceData {
            buffer,
            bytes: bytemuck::cast_slice(instances.as_slice()).to_vec(),
            count: instances.len() as u32,
        });
        Ok(Some(drawable))
    }

    fn globals(&self, ctx: &RenderContext, _graph: &SceneGraph) -> Result<CameraView> {
        match ctx.primary_view() {
            Some(view) => Ok(*view),
            None => engine_bail!("prev::ParticlesStrategy", @InvalidResource, "particle pass has no camera view"),
        }
    }

    fn assemble(&self, input: &DrawInput<'_, CameraView>) -> ParticleUniforms {
        ParticleUniforms {
            camera: CameraBlock::new(input.globals, input.ctx.clip_plane),
            color: input.material.color,
            params: input.drawable.node_params,
        }
    }

    fn bind(&self, input: &DrawInput<'_, CameraView>, bindings: &mut ShaderBindings) -> Result<()> {
        let Some(image) = input.material.image else {
            return Ok(());
        };
        let Some(sampler) = self.sampler else {
            engine_bail!("prev::ParticlesStrategy", @InitializationFailed, "particle sampler is not created");
        };
        bindings.bind_image(COLOR_SAMPLER, image, sampler);
        Ok(())
    }
}
