/// Renderer trait and the generic strategy-driven renderer

use bytemuck::Pod;
use glam::{Mat4, Vec4};
use crate::asset::{Material, Model};
use crate::component::{BoundingVolumeComponent, TransformComponent};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::scene::node_component_helper as helper;
use crate::scene::{NodeKey, SceneGraph, TagSet};
use crate::{engine_bail, engine_debug, engine_trace};
use super::context::RenderContext;
use super::gpu::{
    BufferHandle, CommandList, GpuResourceProvider, IndexType, PipelineDesc, PipelineHandle, ShaderBindings,
};
use super::uniform_ring::UniformRing;

// ============================================================================
// Statistics and frame access
// ============================================================================

/// Counters of a renderer's last pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RendererStats {
    /// Number of draw calls issued
    pub draw_calls: u32,
    /// Number of nodes that passed the tag filter
    pub nodes_visited: u32,
    /// Number of filtered nodes rejected by the visibility test
    pub nodes_culled: u32,
}

/// Totals of one `MasterRenderer::render_frame`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_calls: u32,
    pub nodes_visited: u32,
    pub nodes_culled: u32,
    /// Number of renderer passes run
    pub passes: u32,
}

impl FrameStats {
    pub fn accumulate(&mut self, stats: &RendererStats) {
        self.draw_calls += stats.draw_calls;
        self.nodes_visited += stats.nodes_visited;
        self.nodes_culled += stats.nodes_culled;
        self.passes += 1;
    }
}

/// GPU access for the duration of one frame
pub struct RenderFrame<'a> {
    pub gpu: &'a mut dyn GpuResourceProvider,
    pub cmd: &'a mut dyn CommandList,
}

// ============================================================================
// Renderer trait
// ============================================================================

/// Renderer lifecycle
///
/// The master renderer calls, per pass: `before_render`, `pre_render`,
/// `render` for every node of a pre-order walk, `post_render` and
/// `after_render`. `begin_frame` runs once per frame before any pass, so a
/// renderer used by several passes of a frame keeps its uniform slots.
pub trait Renderer {
    fn name(&self) -> &str;

    /// Create GPU resources
    ///
    /// # Errors
    ///
    /// `InitializationFailed` if called twice.
    fn init(&mut self, gpu: &mut dyn GpuResourceProvider) -> Result<()>;

    /// Start a new frame on the `frame_in_flight` region
    fn begin_frame(&mut self, _frame_in_flight: u32) -> Result<()> {
        Ok(())
    }

    fn before_render(&mut self, ctx: &RenderContext) -> Result<()>;

    /// Bind the pipeline and set viewport/scissor to the pass rectangle
    fn pre_render(&mut self, ctx: &RenderContext, cmd: &mut dyn CommandList) -> Result<()>;

    /// Draw `node` if it is relevant to this renderer
    ///
    /// # Arguments
    ///
    /// * `ctx` - Pass context (views, clip plane, globals lookups)
    /// * `graph` - Scene arena the node lives in
    /// * `node` - Current node of the walk
    /// * `frame` - GPU provider and command list of the frame
    fn render(&mut self, ctx: &RenderContext, graph: &SceneGraph, node: NodeKey, frame: &mut RenderFrame) -> Result<()>;

    fn post_render(&mut self, ctx: &RenderContext, cmd: &mut dyn CommandList) -> Result<()>;

    fn after_render(&mut self, ctx: &RenderContext) -> Result<()>;

    /// Release GPU resources
    fn shutdown(&mut self, gpu: &mut dyn GpuResourceProvider) -> Result<()>;

    /// Counters of the last pass
    fn stats(&self) -> RendererStats;
}

// ============================================================================
// Strategy
// ============================================================================

/// What a node draws, resolved fresh for every draw
#[derive(Debug, Clone)]
pub struct Drawable {
    pub model: Model,
    pub materials: Vec<Material>,
    /// Bone matrices (empty for static geometry)
    pub bones: Vec<Mat4>,
    pub selected: bool,
    pub casted_by_shadows: bool,
    pub layering: Option<TerrainLayering>,
    /// Per-instance data; every part is drawn once per instance
    pub instances: Option<InstanceData>,
    /// Strategy-specific node values (water phase, atlas rows)
    pub node_params: Vec4,
}

impl Drawable {
    pub fn new(model: Model, materials: Vec<Material>) -> Self {
        Self {
            model,
            materials,
            bones: Vec::new(),
            selected: false,
            casted_by_shadows: false,
            layering: None,
            instances: None,
            node_params: Vec4::ZERO,
        }
    }
}

/// Instance buffer contents of an instanced draw
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceData {
    pub buffer: BufferHandle,
    /// Written at offset 0 before the first part is drawn
    pub bytes: Vec<u8>,
    pub count: u32,
}

/// Height-based material blending of a terrain tile
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainLayering {
    pub height_steps: Vec<f32>,
    pub transition_range: f32,
    pub min_height: f32,
    pub max_height: f32,
}

/// Everything a strategy sees when building one draw
pub struct DrawInput<'a, G> {
    pub ctx: &'a RenderContext<'a>,
    pub globals: &'a G,
    pub drawable: &'a Drawable,
    pub material: &'a Material,
    /// `world_transform_scaled · mesh_node.transform`
    pub model_matrix: Mat4,
}

/// The per-renderer part of `StrategyRenderer`
pub trait RenderStrategy {
    /// Scene-wide data a draw needs (lights, shadows, cascade matrices)
    type Globals;
    /// Uniform block written to the ring for every draw
    type Uniforms: Pod;

    fn name(&self) -> &str;

    /// Tags a node must carry (AND)
    fn required_tags(&self) -> TagSet;

    fn pipeline_desc(&self, config: &EngineConfig) -> PipelineDesc;

    /// Passes run between two `begin_frame` calls; each gets the full draw
    /// budget
    fn passes_per_frame(&self, _config: &EngineConfig) -> u32 {
        1
    }

    fn init(&mut self, _gpu: &mut dyn GpuResourceProvider) -> Result<()> {
        Ok(())
    }

    fn shutdown(&mut self, _gpu: &mut dyn GpuResourceProvider) -> Result<()> {
        Ok(())
    }

    /// Render data of `node`, `None` to skip it
    fn resolve(&self, ctx: &RenderContext, graph: &SceneGraph, node: NodeKey) -> Result<Option<Drawable>>;

    /// Look up the globals; a missing required one is an error
    fn globals(&self, ctx: &RenderContext, graph: &SceneGraph) -> Result<Self::Globals>;

    fn assemble(&self, input: &DrawInput<'_, Self::Globals>) -> Self::Uniforms;

    /// Bind the strategy's images
    fn bind(&self, _input: &DrawInput<'_, Self::Globals>, _bindings: &mut ShaderBindings) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// StrategyRenderer
// ============================================================================

/// Uniform slot name shared by every strategy pipeline
pub const UNIFORM_SLOT: &str = "uboVS";

struct GpuState {
    pipeline: PipelineHandle,
    ring: UniformRing,
}

pub struct StrategyRenderer<S: RenderStrategy> {
    strategy: S,
    config: EngineConfig,
    gpu_state: Option<GpuState>,
    stats: RendererStats,
}

impl<S: RenderStrategy> StrategyRenderer<S> {
    pub fn new(strategy: S, config: &EngineConfig) -> Self {
        Self {
            strategy,
            config: config.clone(),
            gpu_state: None,
            stats: RendererStats::default(),
        }
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn is_initialized(&self) -> bool {
        self.gpu_state.is_some()
    }

    fn state(&mut self) -> Result<&mut GpuState> {
        match self.gpu_state.as_mut() {
            Some(state) => Ok(state),
            None => engine_bail!("prev::StrategyRenderer", @InitializationFailed,
                "renderer '{}' is not initialized", self.strategy.name()),
        }
    }

    /// Filter and visibility; counts the node when it gets past the filter
    fn accepts(&mut self, ctx: &RenderContext, graph: &SceneGraph, node: NodeKey) -> bool {
        let required = self.strategy.required_tags();
        if !graph.tags(node).is_some_and(|tags| tags.has_all(&required)) {
            return false;
        }
        self.stats.nodes_visited += 1;

        if let Some(volume) = helper::find_component::<dyn BoundingVolumeComponent>(graph, node) {
            if !ctx.is_visible(&*volume.borrow()) {
                self.stats.nodes_culled += 1;
                engine_trace!("prev::StrategyRenderer", "{}: culled {}",
                    self.strategy.name(), graph.describe(node));
                return false;
            }
        }
        true
    }
}

impl<S: RenderStrategy> Renderer for StrategyRenderer<S> {
    fn name(&self) -> &str {
        self.strategy.name()
    }

    fn init(&mut self, gpu: &mut dyn GpuResourceProvider) -> Result<()> {
        if self.gpu_state.is_some() {
            engine_bail!("prev::StrategyRenderer", @InitializationFailed,
                "renderer '{}' is already initialized", self.strategy.name());
        }
        self.strategy.init(gpu)?;
        let pipeline = gpu.create_pipeline(&self.strategy.pipeline_desc(&self.config))?;
        let passes = self.strategy.passes_per_frame(&self.config);
        let ring = UniformRing::for_passes::<S::Uniforms>(gpu, self.strategy.name(), &self.config, passes)?;
        self.gpu_state = Some(GpuState { pipeline, ring });
        engine_debug!("prev::StrategyRenderer", "renderer '{}' initialized", self.strategy.name());
        Ok(())
    }

    fn begin_frame(&mut self, frame_in_flight: u32) -> Result<()> {
        self.state()?.ring.begin_frame(frame_in_flight)
    }

    fn before_render(&mut self, _ctx: &RenderContext) -> Result<()> {
        self.stats = RendererStats::default();
        Ok(())
    }

    fn pre_render(&mut self, ctx: &RenderContext, cmd: &mut dyn CommandList) -> Result<()> {
        let pipeline = self.state()?.pipeline;
        cmd.bind_pipeline(pipeline)?;
        cmd.set_viewport(ctx.rect.viewport())?;
        cmd.set_scissor(ctx.rect)
    }

    fn render(&mut self, ctx: &RenderContext, graph: &SceneGraph, node: NodeKey, frame: &mut RenderFrame) -> Result<()> {
        if !self.accepts(ctx, graph, node) {
            return Ok(());
        }

        let transform = helper::get_component::<dyn TransformComponent>(graph, node)?;
        let Some(drawable) = self.strategy.resolve(ctx, graph, node)? else {
            return Ok(());
        };
        if let Some(instances) = &drawable.instances {
            if instances.count == 0 {
                return Ok(());
            }
            frame.gpu.write_buffer(instances.buffer, 0, &instances.bytes)?;
        }
        let globals = self.strategy.globals(ctx, graph)?;
        let world = transform.borrow().world_transform_scaled();

        let Some(state) = self.gpu_state.as_mut() else {
            engine_bail!("prev::StrategyRenderer", @InitializationFailed,
                "renderer '{}' is not initialized", self.strategy.name());
        };
        let mesh = drawable.model.mesh();
        for mesh_node in mesh.nodes() {
            for &part_index in &mesh_node.mesh_part_indices {
                let Some(part) = mesh.part(part_index) else {
                    engine_bail!("prev::StrategyRenderer", @InvalidResource,
                        "mesh '{}' has no part {}", mesh.name(), part_index);
                };
                let Some(material) = drawable.materials.get(part.material_index) else {
                    engine_bail!("prev::StrategyRenderer", @InvalidResource,
                        "{}: no material {} for mesh '{}'", graph.describe(node), part.material_index, mesh.name());
                };

                let input = DrawInput {
                    ctx,
                    globals: &globals,
                    drawable: &drawable,
                    material,
                    model_matrix: world * mesh_node.transform,
                };
                let slot = state.ring.claim_next()?;
                state.ring.write(frame.gpu, &slot, &self.strategy.assemble(&input))?;

                let mut bindings = ShaderBindings::new();
                bindings.bind_uniform(UNIFORM_SLOT, slot.binding());
                self.strategy.bind(&input, &mut bindings)?;
                let set = frame.gpu.update_descriptor_set(state.pipeline, &bindings)?;

                frame.cmd.bind_descriptor_set(state.pipeline, set)?;
                frame.cmd.bind_vertex_buffer(drawable.model.vertex_buffer(), 0)?;
                frame.cmd.bind_index_buffer(drawable.model.index_buffer(), 0, IndexType::U32)?;
                match &drawable.instances {
                    Some(instances) => {
                        frame.cmd.bind_instance_buffer(instances.buffer, 0)?;
                        frame.cmd.draw_indexed_instanced(
                            part.index_count,
                            instances.count,
                            part.first_index,
                            part.first_vertex as i32,
                        )?;
                    }
                    None => frame.cmd.draw_indexed(part.index_count, part.first_index, part.first_vertex as i32)?,
                }
                self.stats.draw_calls += 1;
            }
        }
        Ok(())
    }

    fn post_render(&mut self, _ctx: &RenderContext, _cmd: &mut dyn CommandList) -> Result<()> {
        Ok(())
    }

    fn after_render(&mut self, _ctx: &RenderContext) -> Result<()> {
        engine_trace!("prev::StrategyRenderer", "{}: {} draws, {} visited, {} culled",
            self.strategy.name(), self.stats.draw_calls, self.stats.nodes_visited, self.stats.nodes_culled);
        Ok(())
    }

    fn shutdown(&mut self, gpu: &mut dyn GpuResourceProvider) -> Result<()> {
        if let Some(state) = self.gpu_state.take() {
            state.ring.destroy(gpu)?;
            gpu.destroy_pipeline(state.pipeline)?;
            self.strategy.shutdown(gpu)?;
            engine_debug!("prev::StrategyRenderer", "renderer '{}' shut down", self.strategy.name());
        }
        Ok(())
    }

    fn stats(&self) -> RendererStats {
        self.stats
    }
}

#[cfg(test)]
#[path = "renderer_tests.rs"]
mod tests;
