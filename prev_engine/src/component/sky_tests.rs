use glam::{Quat, Vec3};
use crate::component::{CameraComponentFactory, TransformComponentFactory};
use crate::config::EngineConfig;
use crate::error::Error;
use crate::render::RecordingGpu;
use crate::scene::tags::{TAG_CAMERA_COMPONENT, TAG_SKY_BOX_RENDER_COMPONENT, TAG_TRANSFORM_COMPONENT};
use crate::scene::{NodeKey, SceneGraph};
use super::*;

fn sky_tree(gpu: &mut RecordingGpu, config: &EngineConfig) -> (SceneGraph, NodeKey, NodeKey) {
    let mut graph = SceneGraph::new(config.clone());
    let root = graph.create_node("Root");

    let camera = graph.create_node(TAG_MAIN_CAMERA);
    graph.add_child(root, camera).unwrap();
    let component = CameraComponentFactory::create(Vec3::new(3.0, 2.0, 1.0), Quat::IDENTITY);
    helper::add_component(&mut graph, camera, component, TAG_CAMERA_COMPONENT).unwrap();

    let sky = graph.create_node_with("SkyBox", SkyBoxBehavior);
    graph.add_child(root, sky).unwrap();
    helper::add_component(&mut graph, sky, TransformComponentFactory::create(), TAG_TRANSFORM_COMPONENT).unwrap();
    let component = SkyBoxComponentFactory::create(gpu, Material::default()).unwrap();
    helper::add_component(&mut graph, sky, component, TAG_SKY_BOX_RENDER_COMPONENT).unwrap();

    (graph, root, sky)
}

#[test]
fn test_sky_follows_camera_and_spins() {
    let mut gpu = RecordingGpu::default();
    let config = EngineConfig { sky_box_rotation_speed: 90.0, ..EngineConfig::default() };
    let (mut graph, root, sky) = sky_tree(&mut gpu, &config);
    graph.init(root).unwrap();
    graph.update(root, 1.0).unwrap();

    let transform = helper::get_component::<dyn TransformComponent>(&graph, sky).unwrap();
    let transform = transform.borrow();
    assert_eq!(transform.position(), Vec3::new(3.0, 2.0, 1.0));
    assert_eq!(transform.scale(), Vec3::splat(300.0));
    assert!(transform.orientation().angle_between(Quat::from_rotation_y(90f32.to_radians())) < 1e-4);
    assert_eq!(transform.world_transform_scaled().w_axis.truncate(), Vec3::new(3.0, 2.0, 1.0));
}

#[test]
fn test_sky_without_camera_fails_update() {
    let mut gpu = RecordingGpu::default();
    let config = EngineConfig::default();
    let (mut graph, root, _) = sky_tree(&mut gpu, &config);
    let camera = graph.children(root)[0];
    graph.tags_mut(camera).unwrap().remove(TAG_MAIN_CAMERA);

    graph.init(root).unwrap();
    assert!(matches!(graph.update(root, 0.1), Err(Error::NodeNotFound(_))));
}

#[test]
fn test_sky_box_is_a_cube() {
    let mut gpu = RecordingGpu::default();
    let sky = SkyBoxComponentFactory::create(&mut gpu, Material::default()).unwrap();
    assert_eq!(sky.borrow().model().mesh().indices().len(), 36);
    assert_eq!(gpu.buffer_count(), 2);
}
