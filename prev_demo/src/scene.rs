//! Demo scene assembly
//!
//! Components that own GPU resources are created here, against the provider,
//! and handed to the nodes; the behaviours only look them up.

use std::sync::Arc;
use prev_engine::glam::{Quat, Vec3, Vec4};
use prev_engine::prev::asset::{Animation, BoneTrack, Keyframe, Material, Mesh, Model};
use prev_engine::prev::component::{
    AnimationRenderComponentFactory, BoundingVolumeComponentFactory, CameraComponentFactory, LightComponent,
    LightComponentFactory, MousePicker, OffScreenRenderPassComponent, OffScreenRenderPassComponentFactory,
    ParticleSystemBehavior, ParticleSystemComponent, ParticleSystemComponentFactory, RenderComponentFactory,
    RenderFlags, SelectableComponentFactory, ShadowsComponent, ShadowsComponentFactory, SkyBoxBehavior,
    SkyBoxComponentFactory, TerrainComponentFactory, TerrainManagerBehavior, TerrainManagerComponentFactory,
    TerrainTileBehavior, TransformComponentFactory, WaterComponentFactory, WaterTileBehavior, WATER_COLOR,
};
use prev_engine::prev::render::{GpuResourceProvider, Rect2D};
use prev_engine::prev::scene::node_component_helper as helper;
use prev_engine::prev::scene::tags::*;
use prev_engine::prev::scene::{NodeKey, SceneGraph};
use prev_engine::prev::{EngineConfig, Result};
use crate::player::Player;
use crate::stone::{Stone, StoneField};

const TERRAIN_SEED: u32 = 1234;
const TERRAIN_RADIUS: i32 = 1;
const STONE_COUNT: usize = 6;
const WATER_RADIUS: i32 = 1;
const FOUNTAIN_SEED: u64 = 99;

pub struct DemoScene {
    pub graph: SceneGraph,
    pub root: NodeKey,
    pub player: NodeKey,
    pub stones: NodeKey,
    shadows: NodeKey,
    water_targets: [NodeKey; 2],
    fountain: NodeKey,
}

impl DemoScene {
    pub fn build(gpu: &mut dyn GpuResourceProvider, config: &EngineConfig, width: u32, height: u32) -> Result<Self> {
        let mut graph = SceneGraph::new(config.clone());
        let root = graph.create_node_with("Root", MousePicker::new(width, height));

        add_lights(&mut graph, root)?;
        let shadows = add_shadows(&mut graph, root, gpu, config)?;
        add_terrain(&mut graph, root, gpu, config)?;
        let player = add_player(&mut graph, root, gpu, config)?;
        let stones = add_stones(&mut graph, root, gpu, config)?;
        add_sky_box(&mut graph, root, gpu)?;
        let water_targets = add_water(&mut graph, root, gpu, config, Rect2D::from_extent(width, height))?;
        let fountain = add_fountain(&mut graph, root, gpu, config)?;

        Ok(Self { graph, root, player, stones, shadows, water_targets, fountain })
    }

    /// Release what the scene allocated outside of its nodes' models
    pub fn release(&mut self, gpu: &mut dyn GpuResourceProvider) -> Result<()> {
        if let Some(shadows) = helper::find_component::<dyn ShadowsComponent>(&self.graph, self.shadows) {
            shadows.borrow_mut().destroy(gpu)?;
        }
        for target in self.water_targets {
            if let Some(target) = helper::find_component::<dyn OffScreenRenderPassComponent>(&self.graph, target) {
                target.borrow_mut().destroy(gpu)?;
            }
        }
        if let Some(system) = helper::find_component::<dyn ParticleSystemComponent>(&self.graph, self.fountain) {
            system.borrow_mut().destroy(gpu)?;
        }
        self.graph.shutdown(self.root)
    }
}

fn add_lights(graph: &mut SceneGraph, root: NodeKey) -> Result<()> {
    let sun = graph.create_node([TAG_LIGHT, TAG_MAIN_LIGHT]);
    graph.add_child(root, sun)?;
    helper::add_component(graph, sun, LightComponentFactory::create(Vec3::new(10_000.0, 15_000.0, 1_000.0)), TAG_LIGHT_COMPONENT)?;

    let lamps = [
        (Vec3::new(-60.0, 20.0, -60.0), Vec3::new(1.0, 0.3, 0.1)),
        (Vec3::new(60.0, 20.0, 60.0), Vec3::new(0.1, 0.4, 1.0)),
    ];
    for (position, color) in lamps {
        let lamp = graph.create_node(TAG_LIGHT);
        graph.add_child(root, lamp)?;
        let light = LightComponentFactory::create(position);
        {
            let mut light = light.borrow_mut();
            light.set_color(color);
            light.set_attenuation(Vec3::new(1.0, 0.01, 0.002));
        }
        helper::add_component(graph, lamp, light, TAG_LIGHT_COMPONENT)?;
    }
    Ok(())
}

fn add_shadows(graph: &mut SceneGraph, root: NodeKey, gpu: &mut dyn GpuResourceProvider, config: &EngineConfig) -> Result<NodeKey> {
    let node = graph.create_node(TAG_SHADOW);
    graph.add_child(root, node)?;
    helper::add_component(graph, node, ShadowsComponentFactory::create(gpu, config)?, TAG_SHADOWS_COMPONENT)?;
    Ok(node)
}

fn add_terrain(graph: &mut SceneGraph, root: NodeKey, gpu: &mut dyn GpuResourceProvider, config: &EngineConfig) -> Result<()> {
    let manager = graph.create_node_with("Terrains", TerrainManagerBehavior);
    graph.add_child(root, manager)?;
    let component = TerrainManagerComponentFactory::create(config.terrain_tile_size);
    helper::add_component(graph, manager, component, TAG_TERRAIN_MANAGER_COMPONENT)?;

    let factory = TerrainComponentFactory::new(config, TERRAIN_SEED);
    for x in -TERRAIN_RADIUS..=TERRAIN_RADIUS {
        for z in -TERRAIN_RADIUS..=TERRAIN_RADIUS {
            let tile = graph.create_node_with("Tile", TerrainTileBehavior);
            graph.add_child(manager, tile)?;
            let terrain = factory.create(gpu, x, z)?;
            let transform = TransformComponentFactory::create_at(terrain.borrow().position());
            transform.borrow_mut().update(0.0);
            helper::add_component(graph, tile, transform, TAG_TRANSFORM_COMPONENT)?;
            helper::add_component(graph, tile, terrain, TAG_TERRAIN_COMPONENT)?;
        }
    }
    Ok(())
}

/// Two-bone bob: the body rises and falls while the head sways
fn walk_cycle() -> Result<Animation> {
    let mut body = BoneTrack::new("body");
    body.translations = vec![
        Keyframe::new(0.0, Vec3::ZERO),
        Keyframe::new(0.5, Vec3::new(0.0, 0.4, 0.0)),
        Keyframe::new(1.0, Vec3::ZERO),
    ];
    let mut head = BoneTrack::new("head");
    head.rotations = vec![
        Keyframe::new(0.0, Quat::from_rotation_z(-0.1)),
        Keyframe::new(0.5, Quat::from_rotation_z(0.1)),
        Keyframe::new(1.0, Quat::from_rotation_z(-0.1)),
    ];
    Animation::new("walk", 1.0, vec![body, head])
}

fn add_player(graph: &mut SceneGraph, root: NodeKey, gpu: &mut dyn GpuResourceProvider, config: &EngineConfig) -> Result<NodeKey> {
    let node = graph.create_node_with([TAG_PLAYER, TAG_CAMERA, TAG_MAIN_CAMERA], Player::new(30.0));
    graph.add_child(root, node)?;

    let transform = TransformComponentFactory::create_with(Vec3::new(0.0, 0.0, 20.0), Quat::IDENTITY, Vec3::splat(3.0));
    helper::add_component(graph, node, transform, TAG_TRANSFORM_COMPONENT)?;

    let mesh = Arc::new(Mesh::cube(2.0));
    let model = Model::upload(gpu, mesh.clone())?;
    let render = AnimationRenderComponentFactory::create(
        model,
        vec![Material::colored(Vec4::new(0.49, 0.3, 0.28, 1.0))],
        walk_cycle()?,
        RenderFlags::CASTS_SHADOWS | RenderFlags::CASTED_BY_SHADOWS,
        config.max_bones_count,
    );
    helper::add_component(graph, node, render, TAG_ANIMATION_RENDER_COMPONENT)?;

    let volume = BoundingVolumeComponentFactory::create_aabb(&mesh, Vec3::ONE, Vec3::ZERO)?;
    helper::add_component(graph, node, volume, TAG_BOUNDING_VOLUME_COMPONENT)?;

    let camera = CameraComponentFactory::create(Vec3::new(0.0, 8.0, 50.0), Quat::IDENTITY);
    helper::add_component(graph, node, camera, TAG_CAMERA_COMPONENT)?;
    Ok(node)
}

fn add_stones(graph: &mut SceneGraph, root: NodeKey, gpu: &mut dyn GpuResourceProvider, config: &EngineConfig) -> Result<NodeKey> {
    let field = graph.create_node_with("Stones", StoneField);
    graph.add_child(root, field)?;

    let mesh = Arc::new(Mesh::cube(1.0));
    let material = Material::colored(Vec4::new(0.55, 0.52, 0.5, 1.0));
    let flags = RenderFlags::CASTS_SHADOWS | RenderFlags::CASTED_BY_SHADOWS;
    let spacing = config.terrain_tile_size / STONE_COUNT as f32;

    for index in 0..STONE_COUNT {
        let stone = graph.create_node_with("Stone", Stone);
        graph.add_child(field, stone)?;

        let position = Vec3::new((index as f32 - STONE_COUNT as f32 / 2.0) * spacing, 0.0, -10.0 - 4.0 * index as f32);
        let scale = Vec3::splat(2.0 + index as f32 * 0.5);
        let transform = TransformComponentFactory::create_with(position, Quat::from_rotation_y(index as f32), scale);
        helper::add_component(graph, stone, transform, TAG_TRANSFORM_COMPONENT)?;

        let render = RenderComponentFactory::create_from_mesh(gpu, mesh.clone(), material.clone(), flags)?;
        helper::add_component(graph, stone, render, TAG_RENDER_COMPONENT)?;

        let volume = BoundingVolumeComponentFactory::create_aabb(&mesh, Vec3::ONE, Vec3::ZERO)?;
        helper::add_component(graph, stone, volume, TAG_BOUNDING_VOLUME_COMPONENT)?;
        helper::add_component(graph, stone, SelectableComponentFactory::create(), TAG_SELECTABLE_COMPONENT)?;
    }
    Ok(field)
}

fn add_sky_box(graph: &mut SceneGraph, root: NodeKey, gpu: &mut dyn GpuResourceProvider) -> Result<()> {
    let node = graph.create_node_with("SkyBox", SkyBoxBehavior);
    graph.add_child(root, node)?;
    helper::add_component(graph, node, TransformComponentFactory::create(), TAG_TRANSFORM_COMPONENT)?;
    let sky = SkyBoxComponentFactory::create(gpu, Material::colored(Vec4::new(0.5, 0.7, 0.9, 1.0)))?;
    helper::add_component(graph, node, sky, TAG_SKY_BOX_RENDER_COMPONENT)?;
    Ok(())
}

/// Water tiles around the origin plus the reflection and refraction targets
fn add_water(
    graph: &mut SceneGraph,
    root: NodeKey,
    gpu: &mut dyn GpuResourceProvider,
    config: &EngineConfig,
    viewport: Rect2D,
) -> Result<[NodeKey; 2]> {
    let lake = graph.create_node("Lake");
    graph.add_child(root, lake)?;
    for x in -WATER_RADIUS..WATER_RADIUS {
        for z in -WATER_RADIUS..WATER_RADIUS {
            let tile = graph.create_node_with("WaterTile", WaterTileBehavior);
            graph.add_child(lake, tile)?;
            helper::add_component(graph, tile, TransformComponentFactory::create(), TAG_TRANSFORM_COMPONENT)?;
            let water = WaterComponentFactory::create(gpu, config, x, z, Material::colored(WATER_COLOR))?;
            helper::add_component(graph, tile, water, TAG_WATER_RENDER_COMPONENT)?;
        }
    }

    let reflection = graph.create_node("WaterReflection");
    graph.add_child(root, reflection)?;
    let target = OffScreenRenderPassComponentFactory::create_reflection(gpu, config, viewport)?;
    helper::add_component(graph, reflection, target, TAG_WATER_REFLECTION_RENDER_COMPONENT)?;

    let refraction = graph.create_node("WaterRefraction");
    graph.add_child(root, refraction)?;
    let target = OffScreenRenderPassComponentFactory::create_refraction(gpu, config, viewport)?;
    helper::add_component(graph, refraction, target, TAG_WATER_REFRACTION_RENDER_COMPONENT)?;
    Ok([reflection, refraction])
}

fn add_fountain(graph: &mut SceneGraph, root: NodeKey, gpu: &mut dyn GpuResourceProvider, config: &EngineConfig) -> Result<NodeKey> {
    let node = graph.create_node_with("Fountain", ParticleSystemBehavior);
    graph.add_child(root, node)?;
    let transform = TransformComponentFactory::create_at(Vec3::new(-15.0, 0.0, -25.0));
    transform.borrow_mut().update(0.0);
    helper::add_component(graph, node, transform, TAG_TRANSFORM_COMPONENT)?;
    let material = Material::colored(Vec4::new(0.8, 0.9, 1.0, 0.6));
    let system = ParticleSystemComponentFactory::create_random_in_cone(gpu, config, material, Vec3::Y, 15.0, FOUNTAIN_SEED)?;
    helper::add_component(graph, node, system, TAG_PARTICLE_SYSTEM_COMPONENT)?;
    Ok(node)
}
