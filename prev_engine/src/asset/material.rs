/// Resource-level material type.
///
/// Pure data: surface colour and lighting parameters plus optional image
/// handles. Renderers turn it into uniforms and sampler bindings.

use glam::{Vec2, Vec4};
use crate::render::gpu::ImageHandle;

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub color: Vec4,
    pub shine_damper: f32,
    pub reflectivity: f32,
    pub image: Option<ImageHandle>,
    pub normal_image: Option<ImageHandle>,
    /// Rows of a square texture atlas (1 = no atlas)
    pub atlas_rows: u32,
    pub texture_offset: Vec2,
    /// Lighting uses an upward normal (foliage, grass)
    pub uses_fake_lightning: bool,
    pub has_transparency: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Vec4::ONE,
            shine_damper: 10.0,
            reflectivity: 0.0,
            image: None,
            normal_image: None,
            atlas_rows: 1,
            texture_offset: Vec2::ZERO,
            uses_fake_lightning: false,
            has_transparency: false,
        }
    }
}

impl Material {
    /// Untextured material of the given colour
    pub fn colored(color: Vec4) -> Self {
        Self { color, ..Self::default() }
    }

    pub fn with_image(mut self, image: ImageHandle) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_normal_image(mut self, image: ImageHandle) -> Self {
        self.normal_image = Some(image);
        self
    }

    pub fn with_specular(mut self, shine_damper: f32, reflectivity: f32) -> Self {
        self.shine_damper = shine_damper;
        self.reflectivity = reflectivity;
        self
    }

    /// Select atlas cell `index` of an atlas with `rows` rows
    pub fn with_atlas(mut self, rows: u32, index: u32) -> Self {
        let rows = rows.max(1);
        let column = index % rows;
        let row = index / rows;
        self.atlas_rows = rows;
        self.texture_offset = Vec2::new(column as f32, row as f32) / rows as f32;
        self
    }
}
