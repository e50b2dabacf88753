//! Component module
//!
//! Capabilities attached to scene nodes. Each capability is a trait object
//! type registered with `declare_capability!`, a concrete implementation,
//! and a factory that hands out `Shared` handles ready for
//! `node_component_helper::add_component`.

mod animation_render;
mod bounding_volume;
mod camera;
mod light;
mod particle;
mod ray_casting;
mod render;
mod selectable;
mod shadows;
mod sky;
mod terrain;
mod terrain_manager;
mod transform;
mod water;

pub use animation_render::{AnimatedRender, AnimationRenderComponent, AnimationRenderComponentFactory, AnimationState};
pub use bounding_volume::{
    AabbBoundingVolume, BoundingVolumeComponent, BoundingVolumeComponentFactory, BoundingVolumeType,
    SphereBoundingVolume,
};
pub use camera::{Camera, CameraComponent, CameraComponentFactory, ViewFrustum};
pub use light::{Light, LightComponent, LightComponentFactory};
pub use particle::{
    atlas_offset, EmissionParams, Particle, ParticleFactory, ParticleInstance, ParticleSystem, ParticleSystemBehavior,
    ParticleSystemComponent, ParticleSystemComponentFactory, RandomDirectionParticleFactory,
    RandomInConeParticleFactory,
};
pub use ray_casting::{find_closest_intersecting_node, MousePicker, NodeHit};
pub use render::{RenderComponent, RenderComponentFactory, RenderData, RenderFlags, StaticRender};
pub use selectable::{Selectable, SelectableComponent, SelectableComponentFactory};
pub use shadows::{Shadows, ShadowsCascade, ShadowsComponent, ShadowsComponentFactory};
pub use sky::{SkyBox, SkyBoxBehavior, SkyBoxComponent, SkyBoxComponentFactory};
pub use terrain::{HeightGenerator, HeightMap, Terrain, TerrainComponent, TerrainComponentFactory, TerrainLayer};
pub use terrain_manager::{
    TerrainManager, TerrainManagerBehavior, TerrainManagerComponent, TerrainManagerComponentFactory, TerrainTileBehavior,
};
pub use transform::{Transform, TransformComponent, TransformComponentFactory};
pub use water::{
    divided_extent, tile_center, OffScreenRenderPass, OffScreenRenderPassComponent, OffScreenRenderPassComponentFactory,
    Water, WaterComponent, WaterComponentFactory, WaterTileBehavior, WATER_COLOR,
};
