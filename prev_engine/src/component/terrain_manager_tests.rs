use glam::Vec3;
use crate::config::EngineConfig;
use crate::error::Error;
use crate::render::RecordingGpu;
use crate::component::TerrainComponentFactory;
use crate::scene::tags::TAG_TERRAIN_COMPONENT;
use crate::scene::{NodeKey, SceneGraph};
use super::*;

fn factory() -> TerrainComponentFactory {
    let config = EngineConfig {
        terrain_tile_size: 10.0,
        terrain_heightmap_resolution: 5,
        ..EngineConfig::default()
    };
    TerrainComponentFactory::new(&config, 11)
}

// ============================================================================
// REGISTRATION
// ============================================================================

#[test]
fn test_lookup_by_world_position() {
    let mut gpu = RecordingGpu::default();
    let factory = factory();
    let origin = factory.create(&mut gpu, 0, 0).unwrap();
    let west = factory.create(&mut gpu, -1, 0).unwrap();

    let mut manager = TerrainManager::new(10.0);
    manager.add_terrain(&origin).unwrap();
    manager.add_terrain(&west).unwrap();

    let found = manager.terrain_at(Vec3::new(3.0, 50.0, 9.9)).unwrap();
    assert!(Rc::ptr_eq(&found, &origin));
    let found = manager.terrain_at(Vec3::new(-0.5, 0.0, 0.5)).unwrap();
    assert!(Rc::ptr_eq(&found, &west));
    assert!(manager.terrain_at(Vec3::new(15.0, 0.0, 0.0)).is_none());
}

#[test]
fn test_occupied_cell_is_rejected() {
    let mut gpu = RecordingGpu::default();
    let factory = factory();
    let first = factory.create(&mut gpu, 2, 3).unwrap();
    let second = factory.create(&mut gpu, 2, 3).unwrap();

    let mut manager = TerrainManager::new(10.0);
    manager.add_terrain(&first).unwrap();
    assert!(manager.add_terrain(&first).is_ok());
    assert!(matches!(manager.add_terrain(&second), Err(Error::InvalidResource(_))));
}

#[test]
fn test_expired_entry_is_replaced() {
    let mut gpu = RecordingGpu::default();
    let factory = factory();
    let mut manager = TerrainManager::new(10.0);

    let first = factory.create(&mut gpu, 0, 0).unwrap();
    manager.add_terrain(&first).unwrap();
    drop(first);
    assert!(manager.terrain_at(Vec3::new(5.0, 0.0, 5.0)).is_none());
    assert!(manager.height_at(Vec3::new(5.0, 0.0, 5.0)).is_none());

    let second = factory.create(&mut gpu, 0, 0).unwrap();
    manager.add_terrain(&second).unwrap();
    assert!(manager.terrain_at(Vec3::new(5.0, 0.0, 5.0)).is_some());
}

#[test]
fn test_remove_only_matching_terrain() {
    let mut gpu = RecordingGpu::default();
    let factory = factory();
    let registered = factory.create(&mut gpu, 0, 0).unwrap();
    let stranger = factory.create(&mut gpu, 0, 0).unwrap();

    let mut manager = TerrainManager::new(10.0);
    manager.add_terrain(&registered).unwrap();
    assert!(!manager.remove_terrain(&stranger));
    assert!(manager.remove_terrain(&registered));
    assert!(manager.terrains().is_empty());
}

// ============================================================================
// QUERIES
// ============================================================================

#[test]
fn test_height_at_delegates_to_tile() {
    let mut gpu = RecordingGpu::default();
    let terrain = factory().create(&mut gpu, 1, 0).unwrap();
    let mut manager = TerrainManager::new(10.0);
    manager.add_terrain(&terrain).unwrap();

    let position = Vec3::new(12.5, 0.0, 7.5);
    assert_eq!(manager.height_at(position), terrain.borrow().height_at(position));
}

#[test]
fn test_terrains_in_grid_order() {
    let mut gpu = RecordingGpu::default();
    let factory = factory();
    let tiles: Vec<_> = [(1, 0), (-1, 2), (0, 0)]
        .iter()
        .map(|&(x, z)| factory.create(&mut gpu, x, z).unwrap())
        .collect();

    let mut manager = TerrainManager::new(10.0);
    for tile in &tiles {
        manager.add_terrain(tile).unwrap();
    }
    let order: Vec<_> = manager.terrains().iter().map(|t| t.borrow().grid_index()).collect();
    assert_eq!(order, vec![(-1, 2), (0, 0), (1, 0)]);
}

#[test]
fn test_normalize_height_bounds_spans_all_tiles() {
    let mut gpu = RecordingGpu::default();
    let factory = factory();
    let a = factory.create(&mut gpu, 0, 0).unwrap();
    let b = factory.create(&mut gpu, 5, 5).unwrap();

    let mut manager = TerrainManager::new(10.0);
    manager.add_terrain(&a).unwrap();
    manager.add_terrain(&b).unwrap();
    manager.normalize_height_bounds();

    let low = a.borrow().height_map().min_height().min(b.borrow().height_map().min_height());
    let high = a.borrow().height_map().max_height().max(b.borrow().height_map().max_height());
    for tile in [&a, &b] {
        assert_eq!(tile.borrow().min_height(), low);
        assert_eq!(tile.borrow().max_height(), high);
    }
}

// ============================================================================
// BEHAVIOURS
// ============================================================================

/// Manager node with one tile child per grid index
fn terrain_tree(gpu: &mut RecordingGpu, cells: &[(i32, i32)]) -> (SceneGraph, NodeKey, Vec<NodeKey>) {
    let factory = factory();
    let mut graph = SceneGraph::default();
    let manager = graph.create_node_with("Terrains", TerrainManagerBehavior);
    helper::add_component(&mut graph, manager, TerrainManagerComponentFactory::create(10.0), TAG_TERRAIN_MANAGER_COMPONENT).unwrap();

    let tiles = cells
        .iter()
        .map(|&(x, z)| {
            let tile = graph.create_node_with("Tile", TerrainTileBehavior);
            graph.add_child(manager, tile).unwrap();
            helper::add_component(&mut graph, tile, factory.create(gpu, x, z).unwrap(), TAG_TERRAIN_COMPONENT).unwrap();
            tile
        })
        .collect();
    (graph, manager, tiles)
}

fn manager_of(graph: &SceneGraph, node: NodeKey) -> Shared<dyn TerrainManagerComponent> {
    helper::get_component::<dyn TerrainManagerComponent>(graph, node).unwrap()
}

#[test]
fn test_tiles_register_on_init() {
    let mut gpu = RecordingGpu::default();
    let (mut graph, manager, _) = terrain_tree(&mut gpu, &[(0, 0), (1, 0)]);
    graph.init(manager).unwrap();

    let component = manager_of(&graph, manager);
    assert_eq!(component.borrow().terrains().len(), 2);
    assert!(component.borrow().terrain_at(Vec3::new(15.0, 0.0, 5.0)).is_some());

    let terrains = component.borrow().terrains();
    assert_eq!(terrains[0].borrow().min_height(), terrains[1].borrow().min_height());
    assert_eq!(terrains[0].borrow().max_height(), terrains[1].borrow().max_height());
}

#[test]
fn test_shut_down_tile_expires() {
    let mut gpu = RecordingGpu::default();
    let (mut graph, manager, tiles) = terrain_tree(&mut gpu, &[(0, 0), (1, 0)]);
    graph.init(manager).unwrap();

    graph.shutdown(tiles[1]).unwrap();
    let component = manager_of(&graph, manager);
    assert!(component.borrow().terrain_at(Vec3::new(15.0, 0.0, 5.0)).is_none());
    assert!(component.borrow().height_at(Vec3::new(15.0, 0.0, 5.0)).is_none());
    assert!(component.borrow().terrain_at(Vec3::new(5.0, 0.0, 5.0)).is_some());
    assert_eq!(component.borrow().terrains().len(), 1);
}

#[test]
fn test_tile_without_manager_fails_init() {
    let mut gpu = RecordingGpu::default();
    let mut graph = SceneGraph::default();
    let tile = graph.create_node_with("Tile", TerrainTileBehavior);
    helper::add_component(&mut graph, tile, factory().create(&mut gpu, 0, 0).unwrap(), TAG_TERRAIN_COMPONENT).unwrap();
    assert!(matches!(graph.init(tile), Err(Error::NodeNotFound(_))));
}
