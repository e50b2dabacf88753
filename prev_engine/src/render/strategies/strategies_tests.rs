use std::sync::Arc;
use glam::{Mat4, Vec3, Vec4};
use crate::asset::{Material, Mesh, Model};
use crate::component::{
    LightComponentFactory, OffScreenRenderPassComponentFactory, ParticleSystemComponentFactory, RenderComponentFactory,
    RenderFlags, ShadowsComponentFactory, SkyBoxComponentFactory, TransformComponentFactory, WaterComponentFactory,
};
use crate::config::EngineConfig;
use crate::error::Error;
use crate::render::context::{CameraView, RenderContext};
use crate::render::gpu::{GpuResourceProvider, ImageDesc, ImageFormat, Rect2D, ShaderBindings};
use crate::render::recording::RecordingGpu;
use crate::render::renderer::{DrawInput, Drawable, RenderStrategy, TerrainLayering};
use crate::scene::node_component_helper as helper;
use crate::scene::tags::{
    TAG_LIGHT, TAG_LIGHT_COMPONENT, TAG_MAIN_LIGHT, TAG_PARTICLE_SYSTEM_COMPONENT, TAG_RENDER_COMPONENT, TAG_SHADOW,
    TAG_SHADOWS_COMPONENT, TAG_TRANSFORM_COMPONENT, TAG_WATER_REFLECTION_RENDER_COMPONENT,
    TAG_WATER_REFRACTION_RENDER_COMPONENT, TAG_WATER_RENDER_COMPONENT,
};
use crate::scene::{NodeKey, SceneGraph};
use super::*;

fn config(shadows_enabled: bool) -> EngineConfig {
    EngineConfig {
        shadows_enabled,
        shadow_cascades_count: 2,
        shadow_map_dimensions: 256,
        ..EngineConfig::default()
    }
}

fn add_light(graph: &mut SceneGraph, root: NodeKey, main: bool, position: Vec3) {
    let node = if main {
        graph.create_node([TAG_LIGHT, TAG_MAIN_LIGHT])
    } else {
        graph.create_node(TAG_LIGHT)
    };
    graph.add_child(root, node).unwrap();
    helper::add_component(graph, node, LightComponentFactory::create(position), TAG_LIGHT_COMPONENT).unwrap();
}

fn add_shadows(graph: &mut SceneGraph, gpu: &mut RecordingGpu, root: NodeKey, config: &EngineConfig) {
    let node = graph.create_node(TAG_SHADOW);
    graph.add_child(root, node).unwrap();
    let shadows = ShadowsComponentFactory::create(gpu, config).unwrap();
    helper::add_component(graph, node, shadows, TAG_SHADOWS_COMPONENT).unwrap();
}

fn context(config: &EngineConfig, root: NodeKey) -> RenderContext<'_> {
    let eye = Vec3::new(0.0, 2.0, 10.0);
    let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
    let projection = Mat4::perspective_rh(45f32.to_radians(), 1.5, 0.1, 200.0);
    RenderContext::new(config, root, 0, Rect2D::from_extent(300, 200), vec![CameraView::new(view, projection, eye)])
}

fn cube_model(gpu: &mut RecordingGpu) -> Model {
    Model::upload(gpu, Arc::new(Mesh::cube(1.0))).unwrap()
}

// ============================================================================
// SCENE GLOBALS
// ============================================================================

#[test]
fn test_main_light_comes_first_and_count_is_limited() {
    let config = EngineConfig { max_lights: 2, ..config(false) };
    let mut graph = SceneGraph::new(config.clone());
    let root = graph.create_node("Root");
    add_light(&mut graph, root, false, Vec3::new(1.0, 0.0, 0.0));
    add_light(&mut graph, root, true, Vec3::new(0.0, 9.0, 0.0));
    add_light(&mut graph, root, false, Vec3::new(2.0, 0.0, 0.0));

    let globals = SceneGlobals::resolve(&context(&config, root), &graph).unwrap();
    let positions: Vec<_> = globals.lights.iter().map(|l| l.position).collect();
    assert_eq!(positions, vec![Vec3::new(0.0, 9.0, 0.0), Vec3::new(1.0, 0.0, 0.0)]);
    assert!(globals.shadows.is_none());

    let block = LightingBlock::new(&globals, &config);
    assert_eq!(block.params.x, 2.0);
    assert_eq!(block.light_positions[0], Vec4::new(0.0, 9.0, 0.0, 1.0));
    assert_eq!(block.light_positions[2], Vec4::ZERO);
    assert_eq!(block.fog_color, config.fog_color);
}

#[test]
fn test_shadows_required_when_enabled() {
    let config = config(true);
    let mut gpu = RecordingGpu::default();
    let mut graph = SceneGraph::new(config.clone());
    let root = graph.create_node("Root");
    add_light(&mut graph, root, true, Vec3::new(0.0, 9.0, 0.0));

    let result = SceneGlobals::resolve(&context(&config, root), &graph);
    assert!(matches!(result, Err(Error::NodeNotFound(_))));

    add_shadows(&mut graph, &mut gpu, root, &config);
    let globals = SceneGlobals::resolve(&context(&config, root), &graph).unwrap();
    let shadows = globals.shadows.as_ref().unwrap();
    assert_eq!(shadows.matrices.len(), 2);

    let block = LightingBlock::new(&globals, &config);
    assert_eq!(block.shadow_params, Vec4::new(1.0, 2.0, 0.0, 0.0));

    let mut bindings = ShaderBindings::new();
    scene_globals::bind_shadow_map(&globals, &mut bindings);
    assert_eq!(bindings.images()[0].0, DEPTH_SAMPLER);
}

#[test]
fn test_missing_view_is_rejected() {
    let config = config(false);
    let mut graph = SceneGraph::new(config.clone());
    let root = graph.create_node("Root");
    add_light(&mut graph, root, true, Vec3::Y);

    let ctx = RenderContext::new(&config, root, 0, Rect2D::from_extent(8, 8), Vec::new());
    assert!(matches!(SceneGlobals::resolve(&ctx, &graph), Err(Error::InvalidResource(_))));
}

// ============================================================================
// DEFAULT STRATEGY
// ============================================================================

#[test]
fn test_default_uniforms_carry_draw_state() {
    let config = config(false);
    let mut gpu = RecordingGpu::default();
    let mut graph = SceneGraph::new(config.clone());
    let root = graph.create_node("Root");
    add_light(&mut graph, root, true, Vec3::new(0.0, 9.0, 0.0));
    let ctx = context(&config, root);

    let strategy = DefaultStrategy::default();
    let globals = strategy.globals(&ctx, &graph).unwrap();
    let mut drawable = Drawable::new(cube_model(&mut gpu), vec![Material::colored(Vec4::new(1.0, 0.0, 0.0, 1.0))]);
    drawable.selected = true;
    let model_matrix = Mat4::from_translation(Vec3::new(3.0, 0.0, 0.0));

    let input = DrawInput { ctx: &ctx, globals: &globals, drawable: &drawable, material: &drawable.materials[0], model_matrix };
    let uniforms = strategy.assemble(&input);
    assert_eq!(uniforms.model, model_matrix);
    assert_eq!(uniforms.camera.view, ctx.views[0].view);
    assert_eq!(uniforms.camera.clip_plane, config.default_clip_plane);
    assert_eq!(uniforms.material.color, Vec4::new(1.0, 0.0, 0.0, 1.0));
    assert_eq!(uniforms.material.selected_color, config.selected_color);
    assert_eq!(uniforms.material.state.z, 1.0);
    assert_eq!(uniforms.lighting.params.x, 1.0);
}

#[test]
fn test_textured_material_needs_initialized_sampler() {
    let config = config(false);
    let mut gpu = RecordingGpu::default();
    let mut graph = SceneGraph::new(config.clone());
    let root = graph.create_node("Root");
    add_light(&mut graph, root, true, Vec3::Y);
    let ctx = context(&config, root);

    let image = gpu
        .create_image(&ImageDesc {
            name: "albedo".to_string(),
            width: 4,
            height: 4,
            layers: 1,
            format: ImageFormat::Rgba8,
        })
        .unwrap();
    let drawable = Drawable::new(cube_model(&mut gpu), vec![Material::default().with_image(image)]);

    let mut strategy = DefaultStrategy::default();
    let globals = strategy.globals(&ctx, &graph).unwrap();
    let input = DrawInput {
        ctx: &ctx,
        globals: &globals,
        drawable: &drawable,
        material: &drawable.materials[0],
        model_matrix: Mat4::IDENTITY,
    };

    let mut bindings = ShaderBindings::new();
    assert!(matches!(strategy.bind(&input, &mut bindings), Err(Error::InitializationFailed(_))));

    strategy.init(&mut gpu).unwrap();
    let mut bindings = ShaderBindings::new();
    strategy.bind(&input, &mut bindings).unwrap();
    assert_eq!(bindings.images().len(), 1);
    assert_eq!(bindings.images()[0].0, COLOR_SAMPLER);
    assert_eq!(bindings.images()[0].1.image, image);

    strategy.shutdown(&mut gpu).unwrap();
    assert_eq!(gpu.sampler_count(), 0);
}

// ============================================================================
// ANIMATION AND TERRAIN
// ============================================================================

#[test]
fn test_bone_array_pads_with_identity() {
    let bones = vec![Mat4::from_translation(Vec3::X); 3];
    let uniforms_bones = animation::bone_array(&bones);
    assert_eq!(uniforms_bones[2], Mat4::from_translation(Vec3::X));
    assert_eq!(uniforms_bones[3], Mat4::IDENTITY);
    assert_eq!(uniforms_bones.len(), MAX_BONES);
}

#[test]
fn test_terrain_uniforms_carry_layering() {
    let config = config(false);
    let mut gpu = RecordingGpu::default();
    let mut graph = SceneGraph::new(config.clone());
    let root = graph.create_node("Root");
    add_light(&mut graph, root, true, Vec3::Y);
    let ctx = context(&config, root);

    let strategy = TerrainStrategy::default();
    let globals = strategy.globals(&ctx, &graph).unwrap();
    let materials = vec![
        Material::colored(Vec4::new(0.1, 0.1, 0.1, 1.0)),
        Material::colored(Vec4::new(0.2, 0.2, 0.2, 1.0)),
    ];
    let mut drawable = Drawable::new(cube_model(&mut gpu), materials);
    drawable.layering = Some(TerrainLayering {
        height_steps: vec![0.0, 0.5],
        transition_range: 0.1,
        min_height: -4.0,
        max_height: 12.0,
    });

    let input = DrawInput {
        ctx: &ctx,
        globals: &globals,
        drawable: &drawable,
        material: &drawable.materials[0],
        model_matrix: Mat4::IDENTITY,
    };
    let uniforms = strategy.assemble(&input);
    assert_eq!(uniforms.height_steps, Vec4::new(0.0, 0.5, 0.0, 0.0));
    assert_eq!(uniforms.layering, Vec4::new(0.1, -4.0, 12.0, 2.0));
    assert_eq!(uniforms.layer_colors[1], Vec4::new(0.2, 0.2, 0.2, 1.0));
    assert_eq!(uniforms.layer_colors[2], Vec4::ZERO);

    let desc = strategy.pipeline_desc(&config);
    for slot in LAYER_SAMPLERS.iter().chain([DEPTH_SAMPLER].iter()) {
        assert!(desc.sampler_slots.iter().any(|s| s == slot));
    }
}

// ============================================================================
// SHADOWS STRATEGY
// ============================================================================

fn add_caster(graph: &mut SceneGraph, gpu: &mut RecordingGpu, root: NodeKey, flags: RenderFlags) -> NodeKey {
    let node = graph.create_node("Caster");
    graph.add_child(root, node).unwrap();
    helper::add_component(graph, node, TransformComponentFactory::create(), TAG_TRANSFORM_COMPONENT).unwrap();
    let render = RenderComponentFactory::create_from_mesh(gpu, Arc::new(Mesh::cube(1.0)), Material::default(), flags).unwrap();
    helper::add_component(graph, node, render, TAG_RENDER_COMPONENT).unwrap();
    node
}

#[test]
fn test_shadows_strategy_draws_only_casters() {
    let config = config(true);
    let mut gpu = RecordingGpu::default();
    let mut graph = SceneGraph::new(config.clone());
    let root = graph.create_node("Root");
    let caster = add_caster(&mut graph, &mut gpu, root, RenderFlags::CASTS_SHADOWS);
    let receiver = add_caster(&mut graph, &mut gpu, root, RenderFlags::CASTED_BY_SHADOWS);
    let ctx = context(&config, root);

    let strategy = ShadowsStrategy;
    assert!(strategy.resolve(&ctx, &graph, caster).unwrap().is_some());
    assert!(strategy.resolve(&ctx, &graph, receiver).unwrap().is_none());
    assert!(strategy.resolve(&ctx, &graph, root).unwrap().is_none());
}

#[test]
fn test_shadows_globals_use_the_pass_cascade() {
    let config = config(true);
    let mut gpu = RecordingGpu::default();
    let mut graph = SceneGraph::new(config.clone());
    let root = graph.create_node("Root");
    add_shadows(&mut graph, &mut gpu, root, &config);
    let ctx = context(&config, root);

    let strategy = ShadowsStrategy;
    assert!(matches!(strategy.globals(&ctx, &graph), Err(Error::InvalidResource(_))));

    let cascade_ctx = ctx.for_cascade(1, Rect2D::from_extent(256, 256), ctx.views[0]);
    let globals = strategy.globals(&cascade_ctx, &graph).unwrap();
    assert_eq!(globals.cascade, 1);

    let out_of_range = ctx.for_cascade(2, Rect2D::from_extent(256, 256), ctx.views[0]);
    assert!(matches!(strategy.globals(&out_of_range, &graph), Err(Error::InvalidResource(_))));
}

// ============================================================================
// SKY BOX
// ============================================================================

#[test]
fn test_sky_box_uniforms_use_the_pass_clip_plane() {
    let config = config(false);
    let mut gpu = RecordingGpu::default();
    let mut graph = SceneGraph::new(config.clone());
    let root = graph.create_node("Root");
    let ctx = context(&config, root);
    let plane = Vec4::new(0.0, 1.0, 0.0, 4.08);
    let mirrored = ctx.for_offscreen(Rect2D::from_extent(75, 50), ctx.views[0], plane);

    let strategy = SkyBoxStrategy::default();
    let sky = SkyBoxComponentFactory::create(&mut gpu, Material::default()).unwrap();
    let drawable = Drawable::new(sky.borrow().model().clone(), vec![Material::default()]);
    let globals = strategy.globals(&mirrored, &graph).unwrap();
    let input = DrawInput {
        ctx: &mirrored,
        globals: &globals,
        drawable: &drawable,
        material: &drawable.materials[0],
        model_matrix: Mat4::from_scale(Vec3::splat(300.0)),
    };
    let uniforms = strategy.assemble(&input);
    assert_eq!(uniforms.camera.clip_plane, plane);
    assert_eq!(uniforms.fog_color, config.fog_color);
    assert_eq!(uniforms.limits, SKY_FOG_LIMITS);

    let desc = strategy.pipeline_desc(&config);
    assert!(!desc.depth_write);
    assert_eq!(desc.sampler_slots, vec![CUBE_MAP_SAMPLER.to_string()]);

    let blind = RenderContext::new(&config, root, 0, Rect2D::from_extent(8, 8), Vec::new());
    assert!(matches!(strategy.globals(&blind, &graph), Err(Error::InvalidResource(_))));
}

// ============================================================================
// WATER
// ============================================================================

fn add_water_targets(graph: &mut SceneGraph, gpu: &mut RecordingGpu, root: NodeKey, config: &EngineConfig) {
    let viewport = Rect2D::from_extent(300, 200);
    let reflection = graph.create_node("Reflection");
    graph.add_child(root, reflection).unwrap();
    let target = OffScreenRenderPassComponentFactory::create_reflection(gpu, config, viewport).unwrap();
    helper::add_component(graph, reflection, target, TAG_WATER_REFLECTION_RENDER_COMPONENT).unwrap();

    let refraction = graph.create_node("Refraction");
    graph.add_child(root, refraction).unwrap();
    let target = OffScreenRenderPassComponentFactory::create_refraction(gpu, config, viewport).unwrap();
    helper::add_component(graph, refraction, target, TAG_WATER_REFRACTION_RENDER_COMPONENT).unwrap();
}

#[test]
fn test_near_far_recovered_from_projection() {
    let (near, far) = near_far(&Mat4::perspective_rh(45f32.to_radians(), 1.5, 0.1, 200.0));
    assert!((near - 0.1).abs() < 1e-4);
    assert!((far - 200.0).abs() < 0.5);
}

#[test]
fn test_water_needs_both_targets() {
    let config = config(false);
    let mut gpu = RecordingGpu::default();
    let mut graph = SceneGraph::new(config.clone());
    let root = graph.create_node("Root");
    add_light(&mut graph, root, true, Vec3::Y);
    let ctx = context(&config, root);

    let strategy = WaterStrategy::default();
    assert!(matches!(strategy.globals(&ctx, &graph), Err(Error::NodeNotFound(_))));

    add_water_targets(&mut graph, &mut gpu, root, &config);
    let globals = strategy.globals(&ctx, &graph).unwrap();
    assert_ne!(globals.reflection.color, globals.refraction.color);
}

#[test]
fn test_water_uniforms_and_bindings() {
    let config = config(false);
    let mut gpu = RecordingGpu::default();
    let mut graph = SceneGraph::new(config.clone());
    let root = graph.create_node("Root");
    add_light(&mut graph, root, true, Vec3::Y);
    add_water_targets(&mut graph, &mut gpu, root, &config);
    let ctx = context(&config, root);

    let tile = graph.create_node("Water");
    graph.add_child(root, tile).unwrap();
    let water = WaterComponentFactory::create(&mut gpu, &config, 0, 0, Material::default()).unwrap();
    water.borrow_mut().update(10.0);
    helper::add_component(&mut graph, tile, water, TAG_WATER_RENDER_COMPONENT).unwrap();

    let strategy = WaterStrategy::default();
    let drawable = strategy.resolve(&ctx, &graph, tile).unwrap().unwrap();
    assert!((drawable.node_params.x - 0.3).abs() < 1e-6);

    let globals = strategy.globals(&ctx, &graph).unwrap();
    let input = DrawInput {
        ctx: &ctx,
        globals: &globals,
        drawable: &drawable,
        material: &drawable.materials[0],
        model_matrix: Mat4::IDENTITY,
    };
    let uniforms = strategy.assemble(&input);
    assert!((uniforms.params.x - 0.1).abs() < 1e-4);
    assert!((uniforms.params.y - 200.0).abs() < 0.5);
    assert!((uniforms.params.z - 0.3).abs() < 1e-6);
    assert_eq!(uniforms.water_color, crate::component::WATER_COLOR);

    let mut bindings = ShaderBindings::new();
    strategy.bind(&input, &mut bindings).unwrap();
    let slots: Vec<_> = bindings.images().iter().map(|(slot, _)| slot.as_str()).collect();
    assert_eq!(slots, vec![REFLECTION_SAMPLER, REFRACTION_SAMPLER, WATER_DEPTH_SAMPLER]);
    assert_eq!(bindings.images()[2].1.image, globals.refraction.depth);
}

// ============================================================================
// PARTICLES
// ============================================================================

#[test]
fn test_particles_resolve_to_instances_of_the_frame() {
    let config = EngineConfig { frames_in_flight: 2, ..config(false) };
    let mut gpu = RecordingGpu::default();
    let mut graph = SceneGraph::new(config.clone());
    let root = graph.create_node("Root");
    let emitter = graph.create_node("Fire");
    graph.add_child(root, emitter).unwrap();
    let system = ParticleSystemComponentFactory::create_random(&mut gpu, &config, Material::default(), 5).unwrap();
    system.borrow_mut().update(1.0, Vec3::ZERO);
    helper::add_component(&mut graph, emitter, system.clone(), TAG_PARTICLE_SYSTEM_COMPONENT).unwrap();
    let count = system.borrow().particle_count();
    assert_eq!(count, 10);

    let ctx = RenderContext::new(&config, root, 1, Rect2D::from_extent(300, 200), context(&config, root).views);
    let strategy = ParticlesStrategy::default();
    let drawable = strategy.resolve(&ctx, &graph, emitter).unwrap().unwrap();
    let instances = drawable.instances.as_ref().unwrap();
    assert_eq!(instances.count, count);
    assert_eq!(instances.bytes.len(), count as usize * 48);
    assert_eq!(Some(instances.buffer), system.borrow().instance_buffer(1));
    assert_eq!(drawable.node_params.x, 8.0);

    let desc = strategy.pipeline_desc(&config);
    assert!(desc.instanced && desc.blending && !desc.depth_write);

    system.borrow_mut().destroy(&mut gpu).unwrap();
    assert!(matches!(strategy.resolve(&ctx, &graph, emitter), Err(Error::InvalidResource(_))));
}
