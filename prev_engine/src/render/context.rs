/// Per-pass render context.
///
/// Built by the master renderer for every pass and handed to each renderer.
/// Scene-wide data (lights, shadows) is not cached here: the lookups go
/// through the tag index on every call, so a node that lost its tag stops
/// being found on the very next draw.

use glam::{Mat4, Vec3, Vec4};
use crate::component::{BoundingVolumeComponent, LightComponent, ShadowsComponent};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::math::Frustum;
use crate::scene::node_component_helper as helper;
use crate::scene::tags::{TAG_LIGHT, TAG_MAIN_LIGHT, TAG_SHADOW};
use crate::scene::{LogicOp, NodeKey, SceneGraph, Shared, TagSet};
use super::gpu::Rect2D;

/// One camera a pass renders for
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub view: Mat4,
    pub projection: Mat4,
    pub position: Vec3,
    pub frustum: Frustum,
}

impl CameraView {
    pub fn new(view: Mat4, projection: Mat4, position: Vec3) -> Self {
        Self {
            view,
            projection,
            position,
            frustum: Frustum::from_view_projection(&(projection * view)),
        }
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

pub struct RenderContext<'a> {
    pub frame_in_flight: u32,
    /// Render area of the pass
    pub rect: Rect2D,
    pub views: Vec<CameraView>,
    pub clip_plane: Vec4,
    pub root: NodeKey,
    pub config: &'a EngineConfig,
    /// Cascade rendered by a shadow pass, `None` for the scene pass
    pub cascade: Option<u32>,
}

impl<'a> RenderContext<'a> {
    /// Context of a scene pass rendering through `views`
    pub fn new(
        config: &'a EngineConfig,
        root: NodeKey,
        frame_in_flight: u32,
        rect: Rect2D,
        views: Vec<CameraView>,
    ) -> Self {
        Self {
            frame_in_flight,
            rect,
            views,
            clip_plane: config.default_clip_plane,
            root,
            config,
            cascade: None,
        }
    }

    /// Same frame and tree, one cascade of a shadow pass
    pub fn for_cascade(&self, cascade: u32, rect: Rect2D, view: CameraView) -> RenderContext<'a> {
        RenderContext {
            frame_in_flight: self.frame_in_flight,
            rect,
            views: vec![view],
            clip_plane: self.clip_plane,
            root: self.root,
            config: self.config,
            cascade: Some(cascade),
        }
    }

    /// Same frame and tree rendered into an off-screen target through
    /// `view`, clipped by `clip_plane`
    pub fn for_offscreen(&self, rect: Rect2D, view: CameraView, clip_plane: Vec4) -> RenderContext<'a> {
        RenderContext {
            frame_in_flight: self.frame_in_flight,
            rect,
            views: vec![view],
            clip_plane,
            root: self.root,
            config: self.config,
            cascade: None,
        }
    }

    /// First view of the pass (the eye the uniforms are built for)
    pub fn primary_view(&self) -> Option<&CameraView> {
        self.views.first()
    }

    /// Whether `volume` lies in any of the pass's frusta
    pub fn is_visible(&self, volume: &dyn BoundingVolumeComponent) -> bool {
        self.views.iter().any(|view| volume.is_in_frustum(&view.frustum))
    }

    /// # Errors
    ///
    /// `NodeNotFound` without a `MainLight` node, `ComponentNotFound` if it
    /// has no light component.
    pub fn main_light(&self, graph: &SceneGraph) -> Result<Shared<dyn LightComponent>> {
        helper::find_one::<dyn LightComponent>(graph, self.root, &TagSet::from(TAG_MAIN_LIGHT), LogicOp::And)
    }

    /// Every `Light` node's light components, in pre-order
    pub fn lights(&self, graph: &SceneGraph) -> Result<Vec<Shared<dyn LightComponent>>> {
        helper::find_all::<dyn LightComponent>(graph, self.root, &TagSet::from(TAG_LIGHT), LogicOp::And)
    }

    pub fn shadows(&self, graph: &SceneGraph) -> Result<Shared<dyn ShadowsComponent>> {
        helper::find_one::<dyn ShadowsComponent>(graph, self.root, &TagSet::from(TAG_SHADOW), LogicOp::And)
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
