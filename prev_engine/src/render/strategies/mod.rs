//! Shipped render strategies
//!
//! Each strategy plugs into `StrategyRenderer` and decides which nodes it
//! draws, which globals it needs and how a draw's uniform block looks.

mod animation;
mod default;
mod particles;
mod scene_globals;
mod shadows;
mod sky_box;
mod terrain;
mod water;

pub use animation::{AnimationStrategy, AnimationUniforms, MAX_BONES};
pub use default::{DefaultStrategy, DefaultUniforms};
pub use particles::{ParticleUniforms, ParticlesStrategy};
pub use scene_globals::{
    CameraBlock, LightData, LightingBlock, MaterialBlock, SceneGlobals, ShadowData, COLOR_SAMPLER, DEPTH_SAMPLER,
    MAX_CASCADES, MAX_LIGHTS, NORMAL_SAMPLER,
};
pub use shadows::{CascadeGlobals, ShadowsStrategy, ShadowsUniforms};
pub use sky_box::{SkyBoxStrategy, SkyBoxUniforms, CUBE_MAP_SAMPLER, SKY_FOG_LIMITS};
pub use terrain::{TerrainStrategy, TerrainUniforms, LAYER_SAMPLERS, MAX_TERRAIN_LAYERS};
pub use water::{
    near_far, TargetImages, WaterGlobals, WaterStrategy, WaterUniforms, DUDV_SAMPLER, REFLECTION_SAMPLER,
    REFRACTION_SAMPLER, WATER_DEPTH_SAMPLER, WATER_NORMAL_SAMPLER,
};

#[cfg(test)]
#[path = "strategies_tests.rs"]
mod tests;
