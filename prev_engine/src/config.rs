/// Engine configuration
///
/// Scene-wide constants shared by components and renderers: lighting, fog,
/// shadow cascades, terrain and water tiling, sky and particle motion, and
/// uniform pool sizing. The config is passed explicitly to whoever needs it; the copy
/// stored by `Engine::initialize` is only a convenience for applications.

use glam::Vec4;
use crate::error::Result;
use crate::engine_bail;

/// Engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Maximum number of lights bound per draw
    pub max_lights: usize,
    /// Ambient light factor
    pub ambient_light_intensity: f32,
    /// Fog color (RGBA)
    pub fog_color: Vec4,
    /// Fog density
    pub fog_density: f32,
    /// Fog gradient
    pub fog_gradient: f32,
    /// Whether scene renderers sample the shadow map
    pub shadows_enabled: bool,
    /// Number of shadow cascades
    pub shadow_cascades_count: u32,
    /// Shadow map width and height in texels
    pub shadow_map_dimensions: u32,
    /// Blend between logarithmic (1.0) and uniform (0.0) cascade splits
    pub shadow_cascades_split_lambda: f32,
    /// Tint applied to selected nodes
    pub selected_color: Vec4,
    /// Maximum number of bone matrices per animated draw
    pub max_bones_count: usize,
    /// Clip plane used by the scene pass
    pub default_clip_plane: Vec4,
    /// World-space edge length of a terrain tile
    pub terrain_tile_size: f32,
    /// Heightmap samples per terrain tile edge
    pub terrain_heightmap_resolution: u32,
    /// Frames the GPU may still be reading while the CPU records a new one
    pub frames_in_flight: u32,
    /// Uniform slots available to one renderer in one pass; the shadows
    /// renderer gets this budget once per cascade
    pub max_draws_per_frame: u32,
    /// Uniform buffer offset alignment in bytes
    pub uniform_alignment: u64,
    /// World height of the water surface
    pub water_level: f32,
    /// Lift of the reflection and refraction clip planes over the surface
    pub water_clip_plane_offset: f32,
    /// Distortion scroll speed in cycles per second
    pub water_wave_speed: f32,
    /// Half edge length of a water tile
    pub water_tile_size: f32,
    /// The reflection target is the viewport divided by this
    pub water_reflection_extent_divider: u32,
    /// The refraction target is the viewport divided by this
    pub water_refraction_extent_divider: u32,
    /// Edge length of the sky box cube
    pub sky_box_size: f32,
    /// Sky box spin around Y in degrees per second
    pub sky_box_rotation_speed: f32,
    /// Vertical acceleration applied to particles (scaled per factory)
    pub particles_gravity: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_lights: 4,
            ambient_light_intensity: 0.2,
            fog_color: Vec4::new(0.47, 0.53, 0.58, 1.0),
            fog_density: 0.004,
            fog_gradient: 12.0,
            shadows_enabled: true,
            shadow_cascades_count: 4,
            shadow_map_dimensions: 2048,
            shadow_cascades_split_lambda: 0.86,
            selected_color: Vec4::new(0.7, 0.7, 0.0, 1.0),
            max_bones_count: 100,
            default_clip_plane: Vec4::new(0.0, -1.0, 0.0, 1000.0),
            terrain_tile_size: 100.0,
            terrain_heightmap_resolution: 33,
            frames_in_flight: 3,
            max_draws_per_frame: 512,
            uniform_alignment: 256,
            water_level: -4.0,
            water_clip_plane_offset: 0.08,
            water_wave_speed: 0.03,
            water_tile_size: 20.0,
            water_reflection_extent_divider: 4,
            water_refraction_extent_divider: 3,
            sky_box_size: 300.0,
            sky_box_rotation_speed: 0.5,
            particles_gravity: -50.0,
        }
    }
}

impl EngineConfig {
    /// Check that the pool, cascade and terrain settings are usable
    pub fn validate(&self) -> Result<()> {
        if self.frames_in_flight == 0 {
            engine_bail!("prev::EngineConfig", @InitializationFailed, "frames_in_flight must be at least 1");
        }
        if self.max_draws_per_frame == 0 {
            engine_bail!("prev::EngineConfig", @InitializationFailed, "max_draws_per_frame must be at least 1");
        }
        if self.shadow_cascades_count == 0 {
            engine_bail!("prev::EngineConfig", @InitializationFailed, "shadow_cascades_count must be at least 1");
        }
        if !self.uniform_alignment.is_power_of_two() {
            engine_bail!("prev::EngineConfig", @InitializationFailed,
                "uniform_alignment {} is not a power of two", self.uniform_alignment);
        }
        if self.terrain_tile_size.is_nan() || self.terrain_tile_size <= 0.0 {
            engine_bail!("prev::EngineConfig", @InitializationFailed,
                "terrain_tile_size must be positive, got {}", self.terrain_tile_size);
        }
        if self.terrain_heightmap_resolution < 2 {
            engine_bail!("prev::EngineConfig", @InitializationFailed,
                "terrain_heightmap_resolution must be at least 2, got {}", self.terrain_heightmap_resolution);
        }
        if self.water_reflection_extent_divider == 0 || self.water_refraction_extent_divider == 0 {
            engine_bail!("prev::EngineConfig", @InitializationFailed, "water extent dividers must be at least 1");
        }
        if self.water_tile_size.is_nan() || self.water_tile_size <= 0.0 {
            engine_bail!("prev::EngineConfig", @InitializationFailed,
                "water_tile_size must be positive, got {}", self.water_tile_size);
        }
        Ok(())
    }

    /// Total uniform slots a ring must hold (draws per frame × frames in flight)
    pub fn uniform_ring_capacity(&self) -> u32 {
        self.max_draws_per_frame * self.frames_in_flight
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
