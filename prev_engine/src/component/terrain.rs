/// Terrain component: one square heightmap tile of an infinite grid.
///
/// Tile `(x, z)` covers `[x·size, (x+1)·size] × [z·size, (z+1)·size]` on the
/// XZ plane. Heights come from a seeded value-noise generator sampled in
/// global vertex coordinates, so neighbouring tiles share their border
/// heights and the same seed always produces the same landscape.

use std::sync::Arc;
use glam::{Vec2, Vec3, Vec4};
use crate::asset::{Material, Mesh, Model};
use crate::config::EngineConfig;
use crate::declare_capability;
use crate::engine_debug;
use crate::error::Result;
use crate::render::GpuResourceProvider;
use crate::scene::{shared, Shared};

// ===== HEIGHTS =====

/// Square grid of heights, row-major (`row × resolution + column`)
#[derive(Debug, Clone, PartialEq)]
pub struct HeightMap {
    resolution: u32,
    heights: Vec<f32>,
    min_height: f32,
    max_height: f32,
}

impl HeightMap {
    pub fn generate(generator: &HeightGenerator, grid_x: i32, grid_z: i32, resolution: u32) -> Self {
        let n = resolution as i64;
        let origin_x = i64::from(grid_x) * (n - 1);
        let origin_z = i64::from(grid_z) * (n - 1);

        let mut heights = Vec::with_capacity((n * n) as usize);
        for row in 0..n {
            for column in 0..n {
                heights.push(generator.height(origin_x + column, origin_z + row));
            }
        }

        let min_height = heights.iter().copied().fold(f32::INFINITY, f32::min);
        let max_height = heights.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        Self { resolution, heights, min_height, max_height }
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    pub fn height(&self, column: u32, row: u32) -> f32 {
        self.heights[(row * self.resolution + column) as usize]
    }

    pub fn min_height(&self) -> f32 {
        self.min_height
    }

    pub fn max_height(&self) -> f32 {
        self.max_height
    }
}

/// Seeded multi-octave value noise
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightGenerator {
    pub seed: u32,
    pub amplitude: f32,
    pub octaves: u32,
    /// Amplitude falloff per octave
    pub roughness: f32,
}

impl HeightGenerator {
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            amplitude: 40.0,
            octaves: 3,
            roughness: 0.3,
        }
    }

    /// Height at a global vertex coordinate
    pub fn height(&self, x: i64, z: i64) -> f32 {
        let mut total = 0.0;
        let base_frequency = 2f32.powi(self.octaves as i32 - 1);
        for octave in 0..self.octaves {
            let frequency = 2f32.powi(octave as i32) / base_frequency;
            let amplitude = self.roughness.powi(octave as i32) * self.amplitude;
            total += self.interpolated_noise(x as f32 * frequency / 8.0, z as f32 * frequency / 8.0) * amplitude;
        }
        total
    }

    fn interpolated_noise(&self, x: f32, z: f32) -> f32 {
        let (ix, iz) = (x.floor() as i64, z.floor() as i64);
        let (fx, fz) = (x - x.floor(), z - z.floor());

        let v1 = self.smooth_noise(ix, iz);
        let v2 = self.smooth_noise(ix + 1, iz);
        let v3 = self.smooth_noise(ix, iz + 1);
        let v4 = self.smooth_noise(ix + 1, iz + 1);
        let i1 = cosine_interpolate(v1, v2, fx);
        let i2 = cosine_interpolate(v3, v4, fx);
        cosine_interpolate(i1, i2, fz)
    }

    fn smooth_noise(&self, x: i64, z: i64) -> f32 {
        let corners = (self.noise(x - 1, z - 1) + self.noise(x + 1, z - 1) + self.noise(x - 1, z + 1) + self.noise(x + 1, z + 1)) / 16.0;
        let sides = (self.noise(x - 1, z) + self.noise(x + 1, z) + self.noise(x, z - 1) + self.noise(x, z + 1)) / 8.0;
        let center = self.noise(x, z) / 4.0;
        corners + sides + center
    }

    /// Hash of the lattice point mapped to -1..1
    fn noise(&self, x: i64, z: i64) -> f32 {
        let mut h = (x as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
            ^ (z as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
            ^ u64::from(self.seed).wrapping_mul(0x1656_67B1_9E37_79F9);
        h ^= h >> 33;
        h = h.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
        h ^= h >> 33;
        (h >> 40) as f32 / (1u64 << 23) as f32 - 1.0
    }
}

fn cosine_interpolate(a: f32, b: f32, blend: f32) -> f32 {
    let f = (1.0 - (blend * std::f32::consts::PI).cos()) * 0.5;
    a * (1.0 - f) + b * f
}

/// Height at `pos` inside the triangle `p1 p2 p3` (x/z in the plane, y = height)
fn barycentric(p1: Vec3, p2: Vec3, p3: Vec3, pos: Vec2) -> f32 {
    let det = (p2.z - p3.z) * (p1.x - p3.x) + (p3.x - p2.x) * (p1.z - p3.z);
    let l1 = ((p2.z - p3.z) * (pos.x - p3.x) + (p3.x - p2.x) * (pos.y - p3.z)) / det;
    let l2 = ((p3.z - p1.z) * (pos.x - p3.x) + (p1.x - p3.x) * (pos.y - p3.z)) / det;
    let l3 = 1.0 - l1 - l2;
    l1 * p1.y + l2 * p2.y + l3 * p3.y
}

// ===== COMPONENT =====

pub trait TerrainComponent {
    fn grid_index(&self) -> (i32, i32);

    /// World position of the tile's minimum corner (`index × size`)
    fn position(&self) -> Vec3;

    fn size(&self) -> f32;

    /// Interpolated height at `world_position`, `None` outside the tile
    fn height_at(&self, world_position: Vec3) -> Option<f32>;

    fn height_map(&self) -> &HeightMap;

    fn min_height(&self) -> f32;
    fn max_height(&self) -> f32;

    /// Replace the height range used for layer blending
    fn set_height_bounds(&mut self, min_height: f32, max_height: f32);

    fn model(&self) -> &Model;

    /// Material layers, bottom to top
    fn materials(&self) -> &[Material];

    /// Normalized height where each material layer starts
    fn height_steps(&self) -> &[f32];

    /// Normalized width of the blend between layers
    fn transition_range(&self) -> f32;
}

declare_capability!(dyn TerrainComponent, "TerrainComponent");

/// Material layer of a terrain tile
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainLayer {
    pub material: Material,
    pub height_step: f32,
}

pub struct Terrain {
    grid_x: i32,
    grid_z: i32,
    size: f32,
    height_map: HeightMap,
    height_bounds: (f32, f32),
    model: Model,
    materials: Vec<Material>,
    height_steps: Vec<f32>,
    transition_range: f32,
}

impl Terrain {
    pub fn new(grid_x: i32, grid_z: i32, size: f32, height_map: HeightMap, model: Model, layers: Vec<TerrainLayer>) -> Self {
        let height_bounds = (height_map.min_height(), height_map.max_height());
        let (materials, height_steps) = layers.into_iter().map(|layer| (layer.material, layer.height_step)).unzip();
        Self {
            grid_x,
            grid_z,
            size,
            height_map,
            height_bounds,
            model,
            materials,
            height_steps,
            transition_range: 0.1,
        }
    }
}

impl TerrainComponent for Terrain {
    fn grid_index(&self) -> (i32, i32) {
        (self.grid_x, self.grid_z)
    }

    fn position(&self) -> Vec3 {
        Vec3::new(self.grid_x as f32 * self.size, 0.0, self.grid_z as f32 * self.size)
    }

    fn size(&self) -> f32 {
        self.size
    }

    fn height_at(&self, world_position: Vec3) -> Option<f32> {
        let local = Vec2::new(world_position.x, world_position.z) - Vec2::new(self.position().x, self.position().z);
        if local.x < 0.0 || local.y < 0.0 || local.x > self.size || local.y > self.size {
            return None;
        }

        let cells = self.height_map.resolution() - 1;
        let cell_size = self.size / cells as f32;
        let column = ((local.x / cell_size).floor() as u32).min(cells - 1);
        let row = ((local.y / cell_size).floor() as u32).min(cells - 1);
        let coords = local / cell_size - Vec2::new(column as f32, row as f32);

        let h = |dc: u32, dr: u32| self.height_map.height(column + dc, row + dr);
        let height = if coords.x <= 1.0 - coords.y {
            barycentric(
                Vec3::new(0.0, h(0, 0), 0.0),
                Vec3::new(1.0, h(1, 0), 0.0),
                Vec3::new(0.0, h(0, 1), 1.0),
                coords,
            )
        } else {
            barycentric(
                Vec3::new(1.0, h(1, 0), 0.0),
                Vec3::new(1.0, h(1, 1), 1.0),
                Vec3::new(0.0, h(0, 1), 1.0),
                coords,
            )
        };
        Some(height)
    }

    fn height_map(&self) -> &HeightMap {
        &self.height_map
    }

    fn min_height(&self) -> f32 {
        self.height_bounds.0
    }

    fn max_height(&self) -> f32 {
        self.height_bounds.1
    }

    fn set_height_bounds(&mut self, min_height: f32, max_height: f32) {
        self.height_bounds = (min_height, max_height);
    }

    fn model(&self) -> &Model {
        &self.model
    }

    fn materials(&self) -> &[Material] {
        &self.materials
    }

    fn height_steps(&self) -> &[f32] {
        &self.height_steps
    }

    fn transition_range(&self) -> f32 {
        self.transition_range
    }
}

/// Builds terrain tiles with a shared generator and tile layout
pub struct TerrainComponentFactory {
    generator: HeightGenerator,
    tile_size: f32,
    resolution: u32,
}

impl TerrainComponentFactory {
    pub fn new(config: &EngineConfig, seed: u32) -> Self {
        Self {
            generator: HeightGenerator::new(seed),
            tile_size: config.terrain_tile_size,
            resolution: config.terrain_heightmap_resolution,
        }
    }

    pub fn with_generator(mut self, generator: HeightGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Generate, mesh and upload tile `(x, z)`
    pub fn create(&self, gpu: &mut dyn GpuResourceProvider, x: i32, z: i32) -> Result<Shared<dyn TerrainComponent>> {
        let height_map = HeightMap::generate(&self.generator, x, z, self.resolution);
        let mesh = Mesh::grid(self.resolution, self.tile_size, height_map.heights())?;
        let model = Model::upload(gpu, Arc::new(mesh))?;

        engine_debug!("prev::TerrainComponentFactory", "tile ({}, {}) heights {:.2}..{:.2}",
            x, z, height_map.min_height(), height_map.max_height());

        Ok(shared(Terrain::new(x, z, self.tile_size, height_map, model, default_layers())))
    }
}

fn default_layers() -> Vec<TerrainLayer> {
    [
        (Vec4::new(0.36, 0.29, 0.18, 1.0), 0.2),
        (Vec4::new(0.33, 0.52, 0.22, 1.0), 0.42),
        (Vec4::new(0.48, 0.47, 0.45, 1.0), 0.62),
        (Vec4::new(0.91, 0.88, 0.80, 1.0), 0.9),
    ]
    .into_iter()
    .map(|(color, height_step)| TerrainLayer {
        material: Material::colored(color).with_specular(20.0, 0.05),
        height_step,
    })
    .collect()
}

#[cfg(test)]
#[path = "terrain_tests.rs"]
mod tests;
