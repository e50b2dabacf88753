//! Selectable boulders resting on the terrain

use prev_engine::glam::Vec3;
use prev_engine::prev::component::{BoundingVolumeComponent, TerrainManagerComponent, TransformComponent};
use prev_engine::prev::scene::node_component_helper as helper;
use prev_engine::prev::scene::tags::TAG_TERRAIN_MANAGER_COMPONENT;
use prev_engine::prev::scene::{InputEvent, LogicOp, NodeBehavior, NodeContext, TagSet};
use prev_engine::prev::Result;
use prev_engine::engine_info;
use winit::keyboard::KeyCode;

/// Keeps its node on the ground and its bounding volume in sync
#[derive(Debug, Default)]
pub struct Stone;

impl NodeBehavior for Stone {
    fn name(&self) -> &str {
        "Stone"
    }

    fn update(&mut self, ctx: &mut NodeContext<'_>, delta_time: f32) -> Result<()> {
        let root = ctx.root();
        let terrain = helper::find_one::<dyn TerrainManagerComponent>(
            ctx.graph, root, &TagSet::from(TAG_TERRAIN_MANAGER_COMPONENT), LogicOp::And)?;
        let transform = helper::get_component::<dyn TransformComponent>(ctx.graph, ctx.node)?;
        let volume = helper::get_component::<dyn BoundingVolumeComponent>(ctx.graph, ctx.node)?;

        let mut transform = transform.borrow_mut();
        let position = transform.position();
        let height = terrain.borrow().height_at(position).unwrap_or(0.0);
        transform.set_position(Vec3::new(position.x, height, position.z));
        transform.update(delta_time);
        volume.borrow_mut().update(&transform.world_transform_scaled());
        Ok(())
    }
}

/// Group of stones; `Delete` removes the most recently placed one at the
/// end of the frame
#[derive(Debug, Default)]
pub struct StoneField;

impl NodeBehavior for StoneField {
    fn name(&self) -> &str {
        "StoneField"
    }

    fn on_event(&mut self, ctx: &mut NodeContext<'_>, event: &InputEvent) -> Result<()> {
        if *event != InputEvent::key_down(KeyCode::Delete) {
            return Ok(());
        }
        if let Some(&last) = ctx.graph.children(ctx.node).last() {
            engine_info!("prev_demo::StoneField", "removing {}", ctx.graph.describe(last));
            ctx.graph.schedule_removal(ctx.node, last);
        }
        Ok(())
    }
}
