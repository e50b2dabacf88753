/// Scene pass for terrain tiles.
///
/// Each tile blends up to four material layers by normalized height; the
/// layer images go to `layerSampler0..3`.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};
use crate::component::TerrainComponent;
use crate::config::EngineConfig;
use crate::engine_bail;
use crate::error::Result;
use crate::render::context::RenderContext;
use crate::render::gpu::{GpuResourceProvider, PipelineDesc, SamplerDesc, SamplerHandle, ShaderBindings};
use crate::render::renderer::{DrawInput, Drawable, RenderStrategy, TerrainLayering, UNIFORM_SLOT};
use crate::scene::node_component_helper as helper;
use crate::scene::tags::{TAG_TERRAIN_COMPONENT, TAG_TRANSFORM_COMPONENT};
use crate::scene::{NodeKey, SceneGraph, TagSet};
use super::scene_globals::{
    bind_shadow_map, is_selected, CameraBlock, LightingBlock, MaterialBlock, SceneGlobals, DEPTH_SAMPLER,
};

pub const MAX_TERRAIN_LAYERS: usize = 4;
pub const LAYER_SAMPLERS: [&str; MAX_TERRAIN_LAYERS] = ["layerSampler0", "layerSampler1", "layerSampler2", "layerSampler3"];

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct TerrainUniforms {
    pub model: Mat4,
    pub normal_matrix: Mat4,
    pub camera: CameraBlock,
    pub material: MaterialBlock,
    pub lighting: LightingBlock,
    pub layer_colors: [Vec4; MAX_TERRAIN_LAYERS],
    pub height_steps: Vec4,
    /// Transition range, min height, max height, layer count
    pub layering: Vec4,
}

#[derive(Debug, Default)]
pub struct TerrainStrategy {
    sampler: Option<SamplerHandle>,
}

impl RenderStrategy for TerrainStrategy {
    type Globals = SceneGlobals;
    type Uniforms = TerrainUniforms;

    fn name(&self) -> &str {
        "terrain"
    }

    fn required_tags(&self) -> TagSet {
        TagSet::from([TAG_TERRAIN_COMPONENT, TAG_TRANSFORM_COMPONENT])
    }

    fn pipeline_desc(&self, _config: &EngineConfig) -> PipelineDesc {
        let mut samplers = LAYER_SAMPLERS.to_vec();
        samplers.push(DEPTH_SAMPLER);
        PipelineDesc::opaque("terrain", &[UNIFORM_SLOT], &samplers)
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
        let terrain = helper::get_component::<dyn TerrainComponent>(graph, node)?;
        let terrain = terrain.borrow();
        let mut drawable = Drawable::new(terrain.model().clone(), terrain.materials().to_vec());
        drawable.selected = is_selected(graph, node);
        drawable.casted_by_shadows = true;
        drawable.layering = Some(TerrainLayering {
            height_steps: terrain.height_steps().to_vec(),
            transition_range: terrain.transition_range(),
            min_height: terrain.min_height(),
            max_height: terrain.max_height(),
        });
        Ok(Some(drawable))
    }

    fn globals(&self, ctx: &RenderContext, graph: &SceneGraph) -> Result<SceneGlobals> {
        SceneGlobals::resolve(ctx, graph)
    }

    fn assemble(&self, input: &DrawInput<'_, SceneGlobals>) -> TerrainUniforms {
        let config = input.ctx.config;
        let drawable = input.drawable;
        let mut uniforms = TerrainUniforms {
            model: input.model_matrix,
            normal_matrix: input.model_matrix.inverse().transpose(),
            camera: CameraBlock::new(&input.globals.view, input.ctx.clip_plane),
            material: MaterialBlock::new(input.material, drawable.selected, drawable.casted_by_shadows, config),
            lighting: LightingBlock::new(input.globals, config),
            layer_colors: [Vec4::ZERO; MAX_TERRAIN_LAYERS],
            height_steps: Vec4::ZERO,
            layering: Vec4::ZERO,
        };
        let layers = drawable.materials.len().min(MAX_TERRAIN_LAYERS);
        for (slot, material) in uniforms.layer_colors.iter_mut().zip(&drawable.materials) {
            *slot = material.color;
        }
        if let Some(layering) = &drawable.layering {
            for (i, step) in layering.height_steps.iter().take(MAX_TERRAIN_LAYERS).enumerate() {
                uniforms.height_steps[i] = *step;
            }
            uniforms.layering = Vec4::new(
                layering.transition_range,
                layering.min_height,
                layering.max_height,
                layers as f32,
            );
        }
        uniforms
    }

    fn bind(&self, input: &DrawInput<'_, SceneGlobals>, bindings: &mut ShaderBindings) -> Result<()> {
        let layer_images = input.drawable.materials.iter().take(MAX_TERRAIN_LAYERS).filter_map(|m| m.image);
        for (slot, image) in LAYER_SAMPLERS.iter().zip(layer_images) {
            let Some(sampler) = self.sampler else {
                engine_bail!("prev::TerrainStrategy", @InitializationFailed, "layer sampler is not created");
            };
            bindings.bind_image(slot, image, sampler);
        }
        bind_shadow_map(input.globals, bindings);
        Ok(())
    }
}
