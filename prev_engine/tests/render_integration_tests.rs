//! Integration tests for the render protocol
//!
//! A complete scene (camera, light, shadows, terrain, static and animated
//! meshes, and optionally water, sky and particles) is rendered over several frames against the recording GPU
//! provider, the way the application frame loop drives it.
//!
//! Run with: cargo test --test render_integration_tests


use prev_engine::glam::Vec3;
use prev_engine::prev::component::{CameraComponent, RenderFlags};
use prev_engine::prev::render::{
    CommandList, DefaultStrategy, FrameStats, MasterRenderer, Rect2D, RenderFrame, StrategyRenderer,
};
use prev_engine::prev::scene::node_component_helper as helper;
use prev_engine::prev::scene::tags::*;
use prev_engine::prev::scene::{LogicOp, TagSet};
use prev_engine::prev::{EngineConfig, Error, Result};
use scene_test_utils::{frame_commands, test_config, TestScene};

const EXTENT: (u32, u32) = (800, 600);

/// Camera, light, shadows, two terrain tiles, a shadow-casting cube and an
/// animated player, initialised
fn full_scene(config: EngineConfig) -> TestScene {
    let mut scene = TestScene::lit(config);
    scene.add_terrain_grid(&[(0, 0), (1, 0)]);
    let root = scene.root;
    scene.add_cube(root, Vec3::ZERO, RenderFlags::CASTS_SHADOWS | RenderFlags::CASTED_BY_SHADOWS, true);
    scene.add_animated(Vec3::new(2.0, 0.0, 0.0));
    scene.graph.init(root).unwrap();
    scene
}

/// One application frame: update, commit, record
fn run_frame(scene: &mut TestScene, master: &mut MasterRenderer, frame_index: u32) -> Result<(FrameStats, usize)> {
    let frame_in_flight = frame_index % scene.config.frames_in_flight;
    scene.graph.update(scene.root, 0.016)?;
    scene.graph.commit_structural_changes()?;
    scene.gpu.reset_descriptor_sets();

    let mut cmd = frame_commands();
    let stats = {
        let mut frame = RenderFrame { gpu: &mut scene.gpu, cmd: &mut cmd };
        master.render_frame(&scene.graph, scene.root, frame_in_flight, Rect2D::from_extent(EXTENT.0, EXTENT.1), &mut frame)?
    };
    cmd.end()?;
    Ok((stats, cmd.count("draw_indexed")))
}

// ============================================================================
// MULTI-FRAME RENDERING
// ============================================================================

#[test]
fn test_integration_frames_are_stable_across_frames_in_flight() {
    let mut scene = full_scene(test_config());
    let mut master = MasterRenderer::with_default_renderers(&scene.config);
    master.init(&mut scene.gpu).unwrap();

    let (first, first_draws) = run_frame(&mut scene, &mut master, 0).unwrap();
    // 2 cascades for the shadow renderer, then the six scene renderers; no
    // water targets, so no reflection or refraction pass
    assert_eq!(first.passes, 2 + 6);
    // two terrain tiles, the cube and the player in the scene pass; the
    // player has no bounding volume so it lands in every cascade
    assert!(first.draw_calls >= 4 + 2);
    assert_eq!(first_draws, first.draw_calls as usize);

    for frame_index in 1..6 {
        let (stats, draws) = run_frame(&mut scene, &mut master, frame_index).unwrap();
        assert_eq!(stats, first);
        assert_eq!(draws, first_draws);
    }

    master.shutdown(&mut scene.gpu).unwrap();
}

#[test]
fn test_integration_tight_budget_is_enough_every_frame() {
    // the busiest renderer draws the player in both cascades and the cube in at most both
    let config = EngineConfig { max_draws_per_frame: 4, ..test_config() };
    let mut scene = full_scene(config);
    let mut master = MasterRenderer::with_default_renderers(&scene.config);
    master.init(&mut scene.gpu).unwrap();

    for frame_index in 0..8 {
        run_frame(&mut scene, &mut master, frame_index).unwrap();
    }
    master.shutdown(&mut scene.gpu).unwrap();
}

#[test]
fn test_integration_shadows_disabled_skips_cascades() {
    let config = EngineConfig { shadows_enabled: false, ..test_config() };
    let mut scene = full_scene(config);
    let mut master = MasterRenderer::with_default_renderers(&scene.config);
    master.init(&mut scene.gpu).unwrap();

    scene.gpu.reset_descriptor_sets();
    let mut cmd = frame_commands();
    let stats = {
        let mut frame = RenderFrame { gpu: &mut scene.gpu, cmd: &mut cmd };
        master.render_frame(&scene.graph, scene.root, 0, Rect2D::from_extent(EXTENT.0, EXTENT.1), &mut frame).unwrap()
    };
    assert_eq!(stats.passes, 6);
    assert_eq!(stats.draw_calls, 4);
    assert_eq!(cmd.count("set_viewport(256x256)"), 0);
    assert_eq!(cmd.count("set_viewport(800x600)"), 6);
}

// ============================================================================
// WATER, SKY AND PARTICLES
// ============================================================================

/// Lit scene with a terrain tile, a cube, a water tile and its targets, a
/// sky box and a fountain
fn water_scene(config: EngineConfig) -> TestScene {
    let mut scene = TestScene::lit(config);
    scene.add_terrain_grid(&[(0, 0)]);
    let root = scene.root;
    scene.add_cube(root, Vec3::ZERO, RenderFlags::CASTS_SHADOWS | RenderFlags::CASTED_BY_SHADOWS, false);
    scene.add_water_tile(0, 0);
    scene.add_water_targets(Rect2D::from_extent(EXTENT.0, EXTENT.1));
    scene.add_sky_box();
    scene.add_fountain(Vec3::new(0.0, 0.0, -3.0));
    scene.graph.init(root).unwrap();
    scene
}

#[test]
fn test_integration_water_frame_renders_both_targets() {
    let mut scene = water_scene(test_config());
    let mut master = MasterRenderer::with_default_renderers(&scene.config);
    master.init(&mut scene.gpu).unwrap();

    for frame_index in 0..3 {
        scene.graph.update(scene.root, 0.016).unwrap();
        scene.gpu.reset_descriptor_sets();
        let mut cmd = frame_commands();
        let stats = {
            let mut frame = RenderFrame { gpu: &mut scene.gpu, cmd: &mut cmd };
            master.render_frame(&scene.graph, scene.root, frame_index % 2, Rect2D::from_extent(EXTENT.0, EXTENT.1), &mut frame).unwrap()
        };
        cmd.end().unwrap();

        assert_eq!(stats.passes, 2 + 5 + 5 + 6);
        assert_eq!(cmd.count("set_viewport(200x150)"), 5);
        assert_eq!(cmd.count("set_viewport(266x200)"), 5);
        assert_eq!(cmd.count("set_viewport(800x600)"), 6);
        // the water tile is only drawn by the scene pass
        assert_eq!(cmd.count("draw_indexed(6, 0, 0)"), 1);
        // one instanced fountain draw per colour pass
        assert_eq!(cmd.count("draw_indexed_instanced"), 3);
        assert_eq!(cmd.count("draw_indexed"), stats.draw_calls as usize);
    }
    master.shutdown(&mut scene.gpu).unwrap();
}

#[test]
fn test_integration_water_without_targets_fails_the_frame() {
    let mut scene = TestScene::lit(test_config());
    scene.add_water_tile(0, 0);
    let root = scene.root;
    scene.graph.init(root).unwrap();

    let mut master = MasterRenderer::with_default_renderers(&scene.config);
    master.init(&mut scene.gpu).unwrap();
    assert!(matches!(run_frame(&mut scene, &mut master, 0), Err(Error::NodeNotFound(_))));
}

// ============================================================================
// CULLING
// ============================================================================

#[test]
fn test_integration_camera_turning_away_culls_the_cube() {
    let mut scene = TestScene::lit(test_config());
    let root = scene.root;
    scene.add_cube(root, Vec3::ZERO, RenderFlags::default(), false);
    scene.graph.init(root).unwrap();

    let mut master = MasterRenderer::new();
    let default = StrategyRenderer::new(DefaultStrategy::default(), &scene.config);
    master.add_scene_renderer(Box::new(default)).unwrap();
    master.init(&mut scene.gpu).unwrap();

    let (stats, _) = run_frame(&mut scene, &mut master, 0).unwrap();
    assert_eq!((stats.draw_calls, stats.nodes_visited, stats.nodes_culled), (1, 1, 0));

    let camera = helper::find_one::<dyn CameraComponent>(
        &scene.graph, root, &TagSet::from(TAG_MAIN_CAMERA), LogicOp::And).unwrap();
    camera.borrow_mut().set_position(Vec3::new(0.0, 0.0, -50.0));

    let (stats, draws) = run_frame(&mut scene, &mut master, 1).unwrap();
    assert_eq!((stats.draw_calls, stats.nodes_visited, stats.nodes_culled), (0, 1, 1));
    assert_eq!(draws, 0);
}

// ============================================================================
// FAILURES AND RECOVERY
// ============================================================================

#[test]
fn test_integration_missing_shadows_fails_the_frame_until_restored() {
    let mut scene = full_scene(test_config());
    let mut master = MasterRenderer::with_default_renderers(&scene.config);
    master.init(&mut scene.gpu).unwrap();
    let (expected, _) = run_frame(&mut scene, &mut master, 0).unwrap();

    let shadows = scene.graph.children(scene.root)[2];
    scene.graph.tags_mut(shadows).unwrap().remove(TAG_SHADOW);
    assert!(matches!(run_frame(&mut scene, &mut master, 1), Err(Error::NodeNotFound(_))));

    scene.graph.tags_mut(shadows).unwrap().insert(TAG_SHADOW);
    let (stats, _) = run_frame(&mut scene, &mut master, 2).unwrap();
    assert_eq!(stats, expected);
}

#[test]
fn test_integration_missing_camera_fails_the_frame() {
    let mut scene = full_scene(test_config());
    let mut master = MasterRenderer::with_default_renderers(&scene.config);
    master.init(&mut scene.gpu).unwrap();

    let camera = scene.graph.children(scene.root)[0];
    scene.graph.tags_mut(camera).unwrap().remove(TAG_MAIN_CAMERA);
    assert!(matches!(run_frame(&mut scene, &mut master, 0), Err(Error::NodeNotFound(_))));
}

// ============================================================================
// RESOURCES
// ============================================================================

#[test]
fn test_integration_shutdown_returns_every_renderer_resource() {
    let mut scene = full_scene(test_config());
    let before = scene.gpu.live_resources();

    let mut master = MasterRenderer::with_default_renderers(&scene.config);
    master.init(&mut scene.gpu).unwrap();
    // shadows, two water groups of five, six scene renderers
    assert_eq!(scene.gpu.pipeline_count(), 1 + 5 + 5 + 6);
    for frame_index in 0..3 {
        run_frame(&mut scene, &mut master, frame_index).unwrap();
    }

    master.shutdown(&mut scene.gpu).unwrap();
    scene.gpu.reset_descriptor_sets();
    assert_eq!(scene.gpu.live_resources(), before);
    assert_eq!(scene.gpu.pipeline_count(), 0);
}
