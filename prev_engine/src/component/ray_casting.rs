/// Ray casting against selectable nodes, and mouse picking.

use glam::Vec2;
use winit::event::MouseButton;
use crate::engine_debug;
use crate::error::Result;
use crate::math::{Ray, RayCastResult};
use crate::scene::node_component_helper as helper;
use crate::scene::tags::{TAG_BOUNDING_VOLUME_COMPONENT, TAG_MAIN_CAMERA, TAG_SELECTABLE_COMPONENT};
use crate::scene::traversal::{self, LogicOp};
use crate::scene::{InputEvent, NodeBehavior, NodeContext, NodeKey, SceneGraph, TagSet};
use super::bounding_volume::BoundingVolumeComponent;
use super::camera::CameraComponent;
use super::selectable::SelectableComponent;

/// Node hit by a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeHit {
    pub node: NodeKey,
    pub result: RayCastResult,
}

/// Closest selectable node whose bounding volume `ray` hits
///
/// Only nodes tagged with both `SelectableComponent` and
/// `BoundingVolumeComponent` take part. Ties keep the node met first in
/// pre-order.
pub fn find_closest_intersecting_node(graph: &SceneGraph, root: NodeKey, ray: &Ray) -> Option<NodeHit> {
    let tags = TagSet::from([TAG_SELECTABLE_COMPONENT, TAG_BOUNDING_VOLUME_COMPONENT]);
    let mut closest: Option<NodeHit> = None;

    for node in traversal::find_all_with_tags(graph, root, &tags, LogicOp::And) {
        let Some(volume) = helper::find_component::<dyn BoundingVolumeComponent>(graph, node) else {
            continue;
        };
        let Some(result) = volume.borrow().intersects(ray) else {
            continue;
        };
        if closest.map_or(true, |best| result.distance < best.result.distance) {
            closest = Some(NodeHit { node, result });
        }
    }
    closest
}

/// Toggles the selection of whatever the left mouse button clicks
///
/// Rays start at the `MainCamera`; the viewport size follows
/// `WindowResize` events.
#[derive(Debug, Default)]
pub struct MousePicker {
    viewport: Vec2,
}

impl MousePicker {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            viewport: Vec2::new(width as f32, height as f32),
        }
    }

    fn pick(&self, ctx: &mut NodeContext<'_>, position: Vec2) -> Result<()> {
        if self.viewport.x <= 0.0 || self.viewport.y <= 0.0 {
            return Ok(());
        }
        let root = ctx.root();
        let camera = helper::find_one::<dyn CameraComponent>(ctx.graph, root, &TagSet::from(TAG_MAIN_CAMERA), LogicOp::And)?;
        let (view, projection) = {
            let camera = camera.borrow();
            let frustum = camera.view_frustum().with_aspect_ratio(self.viewport.x / self.viewport.y);
            (camera.look_at(), frustum.projection_matrix())
        };

        let ray = Ray::from_screen(position, self.viewport, &view, &projection);
        let Some(hit) = find_closest_intersecting_node(ctx.graph, root, &ray) else {
            return Ok(());
        };

        let selectable = helper::get_component::<dyn SelectableComponent>(ctx.graph, hit.node)?;
        selectable.borrow_mut().toggle();
        engine_debug!("prev::MousePicker", "{} selected: {} (distance {:.2})",
            ctx.graph.describe(hit.node), selectable.borrow().is_selected(), hit.result.distance);
        Ok(())
    }
}

impl NodeBehavior for MousePicker {
    fn name(&self) -> &str {
        "MousePicker"
    }

    fn on_event(&mut self, ctx: &mut NodeContext<'_>, event: &InputEvent) -> Result<()> {
        match *event {
            InputEvent::WindowResize { width, height } => {
                self.viewport = Vec2::new(width as f32, height as f32);
                Ok(())
            }
            InputEvent::MouseButton { button: MouseButton::Left, pressed: true, position } => self.pick(ctx, position),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "ray_casting_tests.rs"]
mod tests;
