/// Lighting, shadow and camera data shared by the scene-pass strategies.

use std::rc::Rc;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};
use crate::asset::Material;
use crate::component::{LightComponent, SelectableComponent, ShadowsComponent};
use crate::config::EngineConfig;
use crate::engine_bail;
use crate::error::Result;
use crate::render::context::{CameraView, RenderContext};
use crate::render::gpu::{ImageHandle, SamplerHandle, ShaderBindings};
use crate::scene::node_component_helper as helper;
use crate::scene::{NodeKey, SceneGraph};

/// Light slots in a lighting block
pub const MAX_LIGHTS: usize = 4;
/// Cascade slots in a lighting block
pub const MAX_CASCADES: usize = 4;

pub const COLOR_SAMPLER: &str = "colorSampler";
pub const NORMAL_SAMPLER: &str = "normalSampler";
pub const DEPTH_SAMPLER: &str = "depthSampler";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightData {
    pub position: Vec3,
    pub color: Vec3,
    pub attenuation: Vec3,
}

impl LightData {
    fn of(light: &dyn LightComponent) -> Self {
        Self {
            position: light.position(),
            color: light.color(),
            attenuation: light.attenuation(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShadowData {
    /// Biased view-projection of each cascade
    pub matrices: Vec<Mat4>,
    /// View distance where each cascade ends
    pub split_depths: Vec<f32>,
    pub depth_image: ImageHandle,
    pub depth_sampler: SamplerHandle,
}

impl ShadowData {
    fn of(shadows: &dyn ShadowsComponent) -> Self {
        Self {
            matrices: shadows.cascades().iter().map(|c| c.biased_view_projection_matrix()).collect(),
            split_depths: shadows.cascades().iter().map(|c| c.end_split_depth).collect(),
            depth_image: shadows.depth_image(),
            depth_sampler: shadows.depth_sampler(),
        }
    }
}

/// Globals of a scene-pass draw
#[derive(Debug, Clone)]
pub struct SceneGlobals {
    pub view: CameraView,
    /// Main light first, then the other `Light` nodes in pre-order
    pub lights: Vec<LightData>,
    /// Present when shadows are enabled
    pub shadows: Option<ShadowData>,
}

impl SceneGlobals {
    /// # Errors
    ///
    /// - `InvalidResource` if the pass has no view
    /// - `NodeNotFound` without a main light, or without a shadows node
    ///   while shadows are enabled
    pub fn resolve(ctx: &RenderContext, graph: &SceneGraph) -> Result<Self> {
        let Some(view) = ctx.primary_view() else {
            engine_bail!("prev::SceneGlobals", @InvalidResource, "scene pass has no camera view");
        };

        let limit = ctx.config.max_lights.min(MAX_LIGHTS);
        let main = ctx.main_light(graph)?;
        let mut lights = vec![LightData::of(&*main.borrow())];
        for light in ctx.lights(graph)? {
            if lights.len() >= limit {
                break;
            }
            if !Rc::ptr_eq(&light, &main) {
                lights.push(LightData::of(&*light.borrow()));
            }
        }
        lights.truncate(limit);

        let shadows = if ctx.config.shadows_enabled {
            let shadows = ctx.shadows(graph)?;
            let data = ShadowData::of(&*shadows.borrow());
            Some(data)
        } else {
            None
        };

        Ok(Self { view: *view, lights, shadows })
    }
}

/// Whether `node` has a selectable component in the selected state
pub fn is_selected(graph: &SceneGraph, node: NodeKey) -> bool {
    helper::find_component::<dyn SelectableComponent>(graph, node)
        .is_some_and(|selectable| selectable.borrow().is_selected())
}

// ============================================================================
// Uniform blocks
// ============================================================================

/// Camera part of a scene uniform block
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraBlock {
    pub view: Mat4,
    pub projection: Mat4,
    pub position: Vec4,
    pub clip_plane: Vec4,
}

impl CameraBlock {
    pub fn new(view: &CameraView, clip_plane: Vec4) -> Self {
        Self {
            view: view.view,
            projection: view.projection,
            position: view.position.extend(1.0),
            clip_plane,
        }
    }
}

/// Lights, shadow cascades and fog
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LightingBlock {
    pub light_positions: [Vec4; MAX_LIGHTS],
    pub light_colors: [Vec4; MAX_LIGHTS],
    pub light_attenuations: [Vec4; MAX_LIGHTS],
    pub shadow_matrices: [Mat4; MAX_CASCADES],
    pub shadow_split_depths: Vec4,
    pub fog_color: Vec4,
    /// Light count, ambient intensity, fog density, fog gradient
    pub params: Vec4,
    /// Shadows enabled, cascade count
    pub shadow_params: Vec4,
}

impl LightingBlock {
    pub fn new(globals: &SceneGlobals, config: &EngineConfig) -> Self {
        let mut block = Self::zeroed();
        for (i, light) in globals.lights.iter().take(MAX_LIGHTS).enumerate() {
            block.light_positions[i] = light.position.extend(1.0);
            block.light_colors[i] = light.color.extend(1.0);
            block.light_attenuations[i] = light.attenuation.extend(0.0);
        }
        let mut cascades = 0;
        if let Some(shadows) = &globals.shadows {
            for (i, matrix) in shadows.matrices.iter().take(MAX_CASCADES).enumerate() {
                block.shadow_matrices[i] = *matrix;
                cascades += 1;
            }
            for (i, depth) in shadows.split_depths.iter().take(MAX_CASCADES).enumerate() {
                block.shadow_split_depths[i] = *depth;
            }
        }
        block.fog_color = config.fog_color;
        block.params = Vec4::new(
            globals.lights.len().min(MAX_LIGHTS) as f32,
            config.ambient_light_intensity,
            config.fog_density,
            config.fog_gradient,
        );
        block.shadow_params = Vec4::new(
            if globals.shadows.is_some() { 1.0 } else { 0.0 },
            cascades as f32,
            0.0,
            0.0,
        );
        block
    }
}

/// Colour, selection and surface parameters of a draw
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MaterialBlock {
    pub color: Vec4,
    pub selected_color: Vec4,
    /// Shine damper, reflectivity, atlas rows, fake lighting
    pub surface: Vec4,
    /// Texture offset (xy), selected, casted by shadows
    pub state: Vec4,
}

impl MaterialBlock {
    pub fn new(material: &Material, selected: bool, casted_by_shadows: bool, config: &EngineConfig) -> Self {
        Self {
            color: material.color,
            selected_color: config.selected_color,
            surface: Vec4::new(
                material.shine_damper,
                material.reflectivity,
                material.atlas_rows as f32,
                if material.uses_fake_lightning { 1.0 } else { 0.0 },
            ),
            state: Vec4::new(
                material.texture_offset.x,
                material.texture_offset.y,
                if selected { 1.0 } else { 0.0 },
                if casted_by_shadows { 1.0 } else { 0.0 },
            ),
        }
    }
}

// ============================================================================
// Image bindings
// ============================================================================

/// Bind the material's colour and normal images with `sampler`
pub fn bind_material_images(material: &Material, sampler: Option<SamplerHandle>, bindings: &mut ShaderBindings) -> Result<()> {
    if material.image.is_none() && material.normal_image.is_none() {
        return Ok(());
    }
    let Some(sampler) = sampler else {
        engine_bail!("prev::SceneGlobals", @InitializationFailed, "material sampler is not created");
    };
    if let Some(image) = material.image {
        bindings.bind_image(COLOR_SAMPLER, image, sampler);
    }
    if let Some(image) = material.normal_image {
        bindings.bind_image(NORMAL_SAMPLER, image, sampler);
    }
    Ok(())
}

pub fn bind_shadow_map(globals: &SceneGlobals, bindings: &mut ShaderBindings) {
    if let Some(shadows) = &globals.shadows {
        bindings.bind_image(DEPTH_SAMPLER, shadows.depth_image, shadows.depth_sampler);
    }
}
