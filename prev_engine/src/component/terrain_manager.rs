/// Terrain manager component: spatial index of live terrain tiles.
///
/// Tiles are held weakly. A tile whose node was shut down simply stops
/// resolving; lookups never touch a dropped terrain.

use std::rc::{Rc, Weak};
use std::cell::RefCell;
use glam::Vec3;
use rustc_hash::FxHashMap;
use crate::declare_capability;
use crate::engine_bail;
use crate::engine_trace;
use crate::error::Result;
use crate::scene::node_component_helper as helper;
use crate::scene::tags::TAG_TERRAIN_MANAGER_COMPONENT;
use crate::scene::{shared, LogicOp, NodeBehavior, NodeContext, Shared, TagSet};
use super::terrain::TerrainComponent;

pub trait TerrainManagerComponent {
    /// Register a tile under its grid index
    ///
    /// # Errors
    ///
    /// `InvalidResource` if a live tile already occupies the cell. An
    /// expired entry is replaced.
    fn add_terrain(&mut self, terrain: &Shared<dyn TerrainComponent>) -> Result<()>;

    /// Drop the entry for `terrain`'s cell if it points to `terrain`
    fn remove_terrain(&mut self, terrain: &Shared<dyn TerrainComponent>) -> bool;

    /// Tile covering `position`, `None` for an empty or expired cell
    fn terrain_at(&self, position: Vec3) -> Option<Shared<dyn TerrainComponent>>;

    fn height_at(&self, position: Vec3) -> Option<f32>;

    /// Live tiles ordered by grid index
    fn terrains(&self) -> Vec<Shared<dyn TerrainComponent>>;

    /// Give every live tile the combined height range of all tiles
    fn normalize_height_bounds(&mut self);
}

declare_capability!(dyn TerrainManagerComponent, "TerrainManagerComponent");

pub struct TerrainManager {
    tile_size: f32,
    cells: FxHashMap<(i32, i32), Weak<RefCell<dyn TerrainComponent>>>,
}

impl TerrainManager {
    pub fn new(tile_size: f32) -> Self {
        Self {
            tile_size,
            cells: FxHashMap::default(),
        }
    }

    fn cell_of(&self, position: Vec3) -> (i32, i32) {
        (
            (position.x / self.tile_size).floor() as i32,
            (position.z / self.tile_size).floor() as i32,
        )
    }
}

impl TerrainManagerComponent for TerrainManager {
    fn add_terrain(&mut self, terrain: &Shared<dyn TerrainComponent>) -> Result<()> {
        let cell = terrain.borrow().grid_index();
        if let Some(existing) = self.cells.get(&cell).and_then(Weak::upgrade) {
            if !Rc::ptr_eq(&existing, terrain) {
                engine_bail!("prev::TerrainManager", @InvalidResource,
                    "cell ({}, {}) is already occupied", cell.0, cell.1);
            }
        }
        self.cells.insert(cell, Rc::downgrade(terrain));
        engine_trace!("prev::TerrainManager", "registered tile ({}, {})", cell.0, cell.1);
        Ok(())
    }

    fn remove_terrain(&mut self, terrain: &Shared<dyn TerrainComponent>) -> bool {
        let cell = terrain.borrow().grid_index();
        let points_here = self
            .cells
            .get(&cell)
            .is_some_and(|weak| std::ptr::addr_eq(weak.as_ptr(), Rc::as_ptr(terrain)));
        if points_here {
            self.cells.remove(&cell);
        }
        points_here
    }

    fn terrain_at(&self, position: Vec3) -> Option<Shared<dyn TerrainComponent>> {
        self.cells.get(&self.cell_of(position)).and_then(Weak::upgrade)
    }

    fn height_at(&self, position: Vec3) -> Option<f32> {
        let terrain = self.terrain_at(position)?;
        let height = terrain.borrow().height_at(position);
        height
    }

    fn terrains(&self) -> Vec<Shared<dyn TerrainComponent>> {
        let mut live: Vec<_> = self
            .cells
            .iter()
            .filter_map(|(cell, weak)| weak.upgrade().map(|terrain| (*cell, terrain)))
            .collect();
        live.sort_by_key(|(cell, _)| *cell);
        live.into_iter().map(|(_, terrain)| terrain).collect()
    }

    fn normalize_height_bounds(&mut self) {
        let terrains = self.terrains();
        let mut min_height = f32::INFINITY;
        let mut max_height = f32::NEG_INFINITY;
        for terrain in &terrains {
            let terrain = terrain.borrow();
            min_height = min_height.min(terrain.height_map().min_height());
            max_height = max_height.max(terrain.height_map().max_height());
        }
        for terrain in &terrains {
            terrain.borrow_mut().set_height_bounds(min_height, max_height);
        }
    }
}

pub struct TerrainManagerComponentFactory;

impl TerrainManagerComponentFactory {
    pub fn create(tile_size: f32) -> Shared<dyn TerrainManagerComponent> {
        shared(TerrainManager::new(tile_size))
    }
}

// ===== BEHAVIOURS =====

/// Tile node behaviour: registers the node's terrain with the tree's manager
///
/// Only the registration is explicit. Shutting the node down drops its
/// terrain, which expires the manager's entry.
#[derive(Debug, Default)]
pub struct TerrainTileBehavior;

impl NodeBehavior for TerrainTileBehavior {
    fn name(&self) -> &str {
        "TerrainTile"
    }

    fn init(&mut self, ctx: &mut NodeContext<'_>) -> Result<()> {
        let root = ctx.root();
        let terrain = helper::get_component::<dyn TerrainComponent>(ctx.graph, ctx.node)?;
        let manager = helper::find_one::<dyn TerrainManagerComponent>(
            ctx.graph, root, &TagSet::from(TAG_TERRAIN_MANAGER_COMPONENT), LogicOp::And)?;
        let added = manager.borrow_mut().add_terrain(&terrain);
        added
    }
}

/// Manager node behaviour: equalizes tile height ranges once the tiles
/// below it are registered
#[derive(Debug, Default)]
pub struct TerrainManagerBehavior;

impl NodeBehavior for TerrainManagerBehavior {
    fn name(&self) -> &str {
        "TerrainManager"
    }

    fn children_initialized(&mut self, ctx: &mut NodeContext<'_>) -> Result<()> {
        let manager = helper::get_component::<dyn TerrainManagerComponent>(ctx.graph, ctx.node)?;
        manager.borrow_mut().normalize_height_bounds();
        engine_trace!("prev::TerrainManager", "{} tiles normalized", manager.borrow().terrains().len());
        Ok(())
    }
}

#[cfg(test)]
#[path = "terrain_manager_tests.rs"]
mod tests;
