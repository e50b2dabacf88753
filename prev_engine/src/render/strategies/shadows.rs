/// Depth pass of one shadow cascade.
///
/// Draws static and skinned nodes flagged `CASTS_SHADOWS` with the light's
/// view-projection of the cascade being rendered.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};
use crate::component::{AnimationRenderComponent, RenderComponent};
use crate::config::EngineConfig;
use crate::engine_bail;
use crate::error::Result;
use crate::render::context::RenderContext;
use crate::render::gpu::{CullMode, PipelineDesc};
use crate::render::renderer::{DrawInput, Drawable, RenderStrategy, UNIFORM_SLOT};
use crate::scene::node_component_helper as helper;
use crate::scene::tags::TAG_TRANSFORM_COMPONENT;
use crate::scene::{NodeKey, SceneGraph, TagSet};
use super::animation::{bone_array, MAX_BONES};

/// Globals of a depth draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeGlobals {
    pub cascade: u32,
    pub view_projection: Mat4,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ShadowsUniforms {
    pub model: Mat4,
    pub view_projection: Mat4,
    pub bones: [Mat4; MAX_BONES],
    /// Bone count, cascade index
    pub params: Vec4,
}

#[derive(Debug, Default)]
pub struct ShadowsStrategy;

impl RenderStrategy for ShadowsStrategy {
    type Globals = CascadeGlobals;
    type Uniforms = ShadowsUniforms;

    fn name(&self) -> &str {
        "shadows"
    }

    fn required_tags(&self) -> TagSet {
        TagSet::from(TAG_TRANSFORM_COMPONENT)
    }

    fn pipeline_desc(&self, _config: &EngineConfig) -> PipelineDesc {
        let mut desc = PipelineDesc::opaque("shadows", &[UNIFORM_SLOT], &[]);
        desc.cull_mode = CullMode::None;
        desc
    }

    fn passes_per_frame(&self, config: &EngineConfig) -> u32 {
        config.shadow_cascades_count
    }

    fn resolve(&self, ctx: &RenderContext, graph: &SceneGraph, node: NodeKey) -> Result<Option<Drawable>> {
        if let Some(render) = helper::find_component::<dyn RenderComponent>(graph, node) {
            let render = render.borrow();
            if render.casts_shadows() {
                return Ok(Some(Drawable::new(render.model().clone(), render.materials().to_vec())));
            }
        }
        if let Some(animated) = helper::find_component::<dyn AnimationRenderComponent>(graph, node) {
            let animated = animated.borrow();
            if animated.casts_shadows() {
                let mut drawable = Drawable::new(animated.model().clone(), animated.materials().to_vec());
                drawable.bones = animated.bone_transforms();
                drawable.bones.truncate(ctx.config.max_bones_count.min(MAX_BONES));
                return Ok(Some(drawable));
            }
        }
        Ok(None)
    }

    fn globals(&self, ctx: &RenderContext, graph: &SceneGraph) -> Result<CascadeGlobals> {
        let Some(cascade) = ctx.cascade else {
            engine_bail!("prev::ShadowsStrategy", @InvalidResource, "shadow pass without a cascade index");
        };
        let shadows = ctx.shadows(graph)?;
        let view_projection = shadows.borrow().cascade(cascade)?.view_projection_matrix();
        Ok(CascadeGlobals { cascade, view_projection })
    }

    fn assemble(&self, input: &DrawInput<'_, CascadeGlobals>) -> ShadowsUniforms {
        ShadowsUniforms {
            model: input.model_matrix,
            view_projection: input.globals.view_projection,
            bones: bone_array(&input.drawable.bones),
            params: Vec4::new(input.drawable.bones.len() as f32, input.globals.cascade as f32, 0.0, 0.0),
        }
    }
}
