//! Well-known tags
//!
//! Scene-role tags select "the" main light, camera or shadow caster. The
//! capability tags are added next to a component registration so renderers
//! and queries can filter nodes without touching their repositories.

pub const TAG_LIGHT: &str = "Light";
pub const TAG_MAIN_LIGHT: &str = "MainLight";
pub const TAG_SHADOW: &str = "Shadow";
pub const TAG_CAMERA: &str = "Camera";
pub const TAG_MAIN_CAMERA: &str = "MainCamera";
pub const TAG_PLAYER: &str = "Player";

pub const TAG_TRANSFORM_COMPONENT: &str = "TransformComponent";
pub const TAG_RENDER_COMPONENT: &str = "RenderComponent";
pub const TAG_ANIMATION_RENDER_COMPONENT: &str = "AnimationRenderComponent";
pub const TAG_TERRAIN_COMPONENT: &str = "TerrainComponent";
pub const TAG_TERRAIN_MANAGER_COMPONENT: &str = "TerrainManagerComponent";
pub const TAG_BOUNDING_VOLUME_COMPONENT: &str = "BoundingVolumeComponent";
pub const TAG_SELECTABLE_COMPONENT: &str = "SelectableComponent";
pub const TAG_CAMERA_COMPONENT: &str = "CameraComponent";
pub const TAG_LIGHT_COMPONENT: &str = "LightComponent";
pub const TAG_SHADOWS_COMPONENT: &str = "ShadowsComponent";
pub const TAG_WATER_RENDER_COMPONENT: &str = "WaterRenderComponent";
pub const TAG_WATER_REFLECTION_RENDER_COMPONENT: &str = "WaterReflectionRenderComponent";
pub const TAG_WATER_REFRACTION_RENDER_COMPONENT: &str = "WaterRefractionRenderComponent";
pub const TAG_SKY_BOX_RENDER_COMPONENT: &str = "SkyBoxRenderComponent";
pub const TAG_PARTICLE_SYSTEM_COMPONENT: &str = "ParticleSystemComponent";
