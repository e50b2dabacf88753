/// MasterRenderer: runs the shadow, water and scene passes of a frame.
///
/// Renderers are kept in registration order in four groups. Each frame
/// renders every shadow cascade with the shadows group, the mirrored
/// camera into the water reflection target, the camera into the water
/// refraction target, then the scene with the scene group. The two water
/// passes run only while their target node exists.

use glam::{Mat4, Vec3, Vec4};
use crate::component::{CameraComponent, OffScreenRenderPassComponent};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::scene::node_component_helper as helper;
use crate::scene::tags::{TAG_MAIN_CAMERA, TAG_WATER_REFLECTION_RENDER_COMPONENT, TAG_WATER_REFRACTION_RENDER_COMPONENT};
use crate::scene::{LogicOp, NodeKey, PreOrder, SceneGraph, Shared, TagSet};
use crate::{engine_bail, engine_debug, engine_info, engine_trace};
use super::context::{CameraView, RenderContext};
use super::gpu::{GpuResourceProvider, Rect2D};
use super::renderer::{FrameStats, RenderFrame, Renderer, StrategyRenderer};
use super::strategies::{
    AnimationStrategy, DefaultStrategy, ParticlesStrategy, ShadowsStrategy, SkyBoxStrategy, TerrainStrategy, WaterStrategy,
};

#[derive(Default)]
pub struct MasterRenderer {
    shadow_renderers: Vec<Box<dyn Renderer>>,
    reflection_renderers: Vec<Box<dyn Renderer>>,
    refraction_renderers: Vec<Box<dyn Renderer>>,
    scene_renderers: Vec<Box<dyn Renderer>>,
    initialized: bool,
}

/// Everything above the water, seen from the camera mirrored in it
fn add_water_pass_renderers(group: &mut Vec<Box<dyn Renderer>>, config: &EngineConfig) {
    group.push(Box::new(StrategyRenderer::new(SkyBoxStrategy::default(), config)));
    group.push(Box::new(StrategyRenderer::new(TerrainStrategy::default(), config)));
    group.push(Box::new(StrategyRenderer::new(DefaultStrategy::default(), config)));
    group.push(Box::new(StrategyRenderer::new(AnimationStrategy::default(), config)));
    group.push(Box::new(StrategyRenderer::new(ParticlesStrategy::default(), config)));
}

impl MasterRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shadows group: depth pass. Water groups: sky, terrain, static,
    /// skinned, particles. Scene group: the same plus water before the
    /// particles.
    pub fn with_default_renderers(config: &EngineConfig) -> Self {
        let mut master = Self::new();
        master.shadow_renderers.push(Box::new(StrategyRenderer::new(ShadowsStrategy, config)));
        add_water_pass_renderers(&mut master.reflection_renderers, config);
        add_water_pass_renderers(&mut master.refraction_renderers, config);
        master.scene_renderers.push(Box::new(StrategyRenderer::new(SkyBoxStrategy::default(), config)));
        master.scene_renderers.push(Box::new(StrategyRenderer::new(TerrainStrategy::default(), config)));
        master.scene_renderers.push(Box::new(StrategyRenderer::new(DefaultStrategy::default(), config)));
        master.scene_renderers.push(Box::new(StrategyRenderer::new(AnimationStrategy::default(), config)));
        master.scene_renderers.push(Box::new(StrategyRenderer::new(WaterStrategy::default(), config)));
        master.scene_renderers.push(Box::new(StrategyRenderer::new(ParticlesStrategy::default(), config)));
        master
    }

    /// # Errors
    ///
    /// `InitializationFailed` once `init` has run.
    pub fn add_shadow_renderer(&mut self, renderer: Box<dyn Renderer>) -> Result<()> {
        self.check_not_initialized(renderer.name())?;
        self.shadow_renderers.push(renderer);
        Ok(())
    }

    /// # Errors
    ///
    /// `InitializationFailed` once `init` has run.
    pub fn add_scene_renderer(&mut self, renderer: Box<dyn Renderer>) -> Result<()> {
        self.check_not_initialized(renderer.name())?;
        self.scene_renderers.push(renderer);
        Ok(())
    }

    /// # Errors
    ///
    /// `InitializationFailed` once `init` has run.
    pub fn add_reflection_renderer(&mut self, renderer: Box<dyn Renderer>) -> Result<()> {
        self.check_not_initialized(renderer.name())?;
        self.reflection_renderers.push(renderer);
        Ok(())
    }

    /// # Errors
    ///
    /// `InitializationFailed` once `init` has run.
    pub fn add_refraction_renderer(&mut self, renderer: Box<dyn Renderer>) -> Result<()> {
        self.check_not_initialized(renderer.name())?;
        self.refraction_renderers.push(renderer);
        Ok(())
    }

    fn check_not_initialized(&self, name: &str) -> Result<()> {
        if self.initialized {
            engine_bail!("prev::MasterRenderer", @InitializationFailed,
                "cannot register '{}' after init", name);
        }
        Ok(())
    }

    /// Names in registration order: shadows, reflection, refraction, scene
    pub fn renderer_names(&self) -> Vec<&str> {
        self.shadow_renderers
            .iter()
            .chain(&self.reflection_renderers)
            .chain(&self.refraction_renderers)
            .chain(&self.scene_renderers)
            .map(|renderer| renderer.name())
            .collect()
    }

    fn renderers_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Renderer>> {
        self.shadow_renderers
            .iter_mut()
            .chain(self.reflection_renderers.iter_mut())
            .chain(self.refraction_renderers.iter_mut())
            .chain(self.scene_renderers.iter_mut())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn init(&mut self, gpu: &mut dyn GpuResourceProvider) -> Result<()> {
        if self.initialized {
            engine_bail!("prev::MasterRenderer", @InitializationFailed, "already initialized");
        }
        for renderer in self.renderers_mut() {
            renderer.init(gpu)?;
        }
        self.initialized = true;
        engine_info!("prev::MasterRenderer", "initialized {} renderers", self.renderer_names().len());
        Ok(())
    }

    /// Render the tree under `root` into `extent`
    ///
    /// # Errors
    ///
    /// - `InitializationFailed` before `init`
    /// - `NodeNotFound` without a `MainCamera`, or without a main light or
    ///   shadows node while shadows are enabled
    /// - a failed resize of a water target
    /// - any renderer failure, which aborts the frame
    pub fn render_frame(
        &mut self,
        graph: &SceneGraph,
        root: NodeKey,
        frame_in_flight: u32,
        extent: Rect2D,
        frame: &mut RenderFrame,
    ) -> Result<FrameStats> {
        if !self.initialized {
            engine_bail!("prev::MasterRenderer", @InitializationFailed, "render_frame before init");
        }
        let config = graph.config();

        let camera = helper::find_one::<dyn CameraComponent>(graph, root, &TagSet::from(TAG_MAIN_CAMERA), LogicOp::And)?;
        let (view, frustum, position, forward, up) = {
            let camera = camera.borrow();
            (
                camera.look_at(),
                camera.view_frustum().with_aspect_ratio(extent.aspect_ratio()),
                camera.position(),
                camera.forward(),
                camera.up(),
            )
        };
        let projection = frustum.projection_matrix();

        for renderer in self.renderers_mut() {
            renderer.begin_frame(frame_in_flight)?;
        }

        let ctx = RenderContext::new(config, root, frame_in_flight, extent, vec![CameraView::new(view, projection, position)]);
        let mut stats = FrameStats::default();

        if config.shadows_enabled && !self.shadow_renderers.is_empty() {
            let direction = ctx.main_light(graph)?.borrow().direction();
            let shadows = ctx.shadows(graph)?;
            shadows.borrow_mut().update(direction, frustum.near, frustum.far, &projection, &view);
            let (rect, cascades) = {
                let shadows = shadows.borrow();
                (shadows.extent(), shadows.cascades().to_vec())
            };

            for (index, cascade) in cascades.iter().enumerate() {
                let cascade_ctx = ctx.for_cascade(index as u32, rect, CameraView::new(cascade.view, cascade.projection, position));
                for renderer in &mut self.shadow_renderers {
                    run_pass(renderer.as_mut(), &cascade_ctx, graph, frame, &mut stats)?;
                }
            }
        }

        if !self.reflection_renderers.is_empty() {
            if let Some(target) = water_target(graph, root, TAG_WATER_REFLECTION_RENDER_COMPONENT)? {
                let rect = resize_target(&target, frame, extent)?;
                let (mirrored_view, mirrored_position) =
                    reflected_camera(position, forward, up, config.water_level);
                let projection = frustum.with_aspect_ratio(rect.aspect_ratio()).projection_matrix();
                let pass_ctx = ctx.for_offscreen(
                    rect,
                    CameraView::new(mirrored_view, projection, mirrored_position),
                    reflection_clip_plane(config),
                );
                for renderer in &mut self.reflection_renderers {
                    run_pass(renderer.as_mut(), &pass_ctx, graph, frame, &mut stats)?;
                }
            }
        }

        if !self.refraction_renderers.is_empty() {
            if let Some(target) = water_target(graph, root, TAG_WATER_REFRACTION_RENDER_COMPONENT)? {
                let rect = resize_target(&target, frame, extent)?;
                let projection = frustum.with_aspect_ratio(rect.aspect_ratio()).projection_matrix();
                let pass_ctx = ctx.for_offscreen(
                    rect,
                    CameraView::new(view, projection, position),
                    refraction_clip_plane(config),
                );
                for renderer in &mut self.refraction_renderers {
                    run_pass(renderer.as_mut(), &pass_ctx, graph, frame, &mut stats)?;
                }
            }
        }

        for renderer in &mut self.scene_renderers {
            run_pass(renderer.as_mut(), &ctx, graph, frame, &mut stats)?;
        }

        engine_trace!("prev::MasterRenderer", "frame {}: {} passes, {} draws, {} culled",
            frame_in_flight, stats.passes, stats.draw_calls, stats.nodes_culled);
        Ok(stats)
    }

    /// Shut renderers down in reverse registration order
    pub fn shutdown(&mut self, gpu: &mut dyn GpuResourceProvider) -> Result<()> {
        if !self.initialized {
            return Ok(());
        }
        let reversed = self
            .scene_renderers
            .iter_mut()
            .rev()
            .chain(self.refraction_renderers.iter_mut().rev())
            .chain(self.reflection_renderers.iter_mut().rev())
            .chain(self.shadow_renderers.iter_mut().rev());
        for renderer in reversed {
            renderer.shutdown(gpu)?;
        }
        self.initialized = false;
        engine_info!("prev::MasterRenderer", "shut down");
        Ok(())
    }
}

/// First off-screen target tagged `tag` under `root`, if any
fn water_target(graph: &SceneGraph, root: NodeKey, tag: &str) -> Result<Option<Shared<dyn OffScreenRenderPassComponent>>> {
    let targets = helper::find_all::<dyn OffScreenRenderPassComponent>(graph, root, &TagSet::from(tag), LogicOp::And)?;
    Ok(targets.into_iter().next())
}

/// Follow the frame extent and return the target's render area
fn resize_target(
    target: &Shared<dyn OffScreenRenderPassComponent>,
    frame: &mut RenderFrame,
    extent: Rect2D,
) -> Result<Rect2D> {
    let mut target = target.borrow_mut();
    if target.resize(frame.gpu, extent)? {
        engine_debug!("prev::MasterRenderer", "water target follows viewport {}x{}", extent.width, extent.height);
    }
    Ok(target.extent())
}

/// Camera mirrored in the water plane: eye and look point move below the
/// surface and the up vector is reflected, which flips the pitch
///
/// Returns the view matrix and the mirrored eye position.
pub fn reflected_camera(position: Vec3, forward: Vec3, up: Vec3, water_level: f32) -> (Mat4, Vec3) {
    let mirror = |point: Vec3| Vec3::new(point.x, 2.0 * water_level - point.y, point.z);
    let eye = mirror(position);
    let target = mirror(position + forward);
    let reflected_up = Vec3::new(-up.x, up.y, -up.z);
    (Mat4::look_at_rh(eye, target, reflected_up), eye)
}

/// Keeps what lies above the surface lifted by the clip offset
pub fn reflection_clip_plane(config: &EngineConfig) -> Vec4 {
    Vec4::new(0.0, 1.0, 0.0, -(config.water_level + config.water_clip_plane_offset))
}

/// Keeps what lies below the surface lifted by the clip offset
pub fn refraction_clip_plane(config: &EngineConfig) -> Vec4 {
    Vec4::new(0.0, -1.0, 0.0, config.water_level + config.water_clip_plane_offset)
}

/// `before`, `pre`, a pre-order walk of `render`, `post`, `after`
fn run_pass(
    renderer: &mut dyn Renderer,
    ctx: &RenderContext,
    graph: &SceneGraph,
    frame: &mut RenderFrame,
    stats: &mut FrameStats,
) -> Result<()> {
    renderer.before_render(ctx)?;
    renderer.pre_render(ctx, frame.cmd)?;
    for node in PreOrder::new(graph, ctx.root) {
        renderer.render(ctx, graph, node, frame)?;
    }
    renderer.post_render(ctx, frame.cmd)?;
    renderer.after_render(ctx)?;
    stats.accumulate(&renderer.stats());
    Ok(())
}

#[cfg(test)]
#[path = "master_renderer_tests.rs"]
mod tests;
