/// Shadows component: cascaded shadow map state.
///
/// The camera frustum is cut into `cascades_count` slices along the view
/// direction. Each slice gets an orthographic light projection that tightly
/// wraps the slice's bounding sphere; the depth pass renders one layer of
/// the depth image per cascade.

use glam::{Mat4, Vec3, Vec4};
use crate::config::EngineConfig;
use crate::declare_capability;
use crate::engine_bail;
use crate::error::Result;
use crate::render::{
    AddressMode, Filter, GpuResourceProvider, ImageDesc, ImageFormat, ImageHandle, Rect2D, SamplerDesc,
    SamplerHandle,
};
use crate::scene::{shared, Shared};

/// NDC (xy in -1..1) to texture space (uv in 0..1); depth is already 0..1
const SHADOW_BIAS: Mat4 = Mat4::from_cols(
    Vec4::new(0.5, 0.0, 0.0, 0.0),
    Vec4::new(0.0, 0.5, 0.0, 0.0),
    Vec4::new(0.0, 0.0, 1.0, 0.0),
    Vec4::new(0.5, 0.5, 0.0, 1.0),
);

/// One slice of the camera frustum as seen from the light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowsCascade {
    pub view: Mat4,
    pub projection: Mat4,
    /// View distance where this cascade starts
    pub start_split_depth: f32,
    /// View distance where this cascade ends
    pub end_split_depth: f32,
}

impl Default for ShadowsCascade {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            start_split_depth: 0.0,
            end_split_depth: 0.0,
        }
    }
}

impl ShadowsCascade {
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection * self.view
    }

    /// World position to shadow map texture coordinates and depth
    pub fn biased_view_projection_matrix(&self) -> Mat4 {
        SHADOW_BIAS * self.projection * self.view
    }
}

pub trait ShadowsComponent {
    /// Recompute every cascade for the given light and camera
    fn update(&mut self, light_direction: Vec3, near: f32, far: f32, camera_projection: &Mat4, camera_view: &Mat4);

    fn cascades_count(&self) -> u32;

    /// # Errors
    ///
    /// `InvalidResource` if `index` is out of range.
    fn cascade(&self, index: u32) -> Result<&ShadowsCascade>;

    fn cascades(&self) -> &[ShadowsCascade];

    /// Shadow map size (one layer)
    fn extent(&self) -> Rect2D;

    fn depth_image(&self) -> ImageHandle;
    fn depth_sampler(&self) -> SamplerHandle;

    /// Release the depth image and sampler
    fn destroy(&mut self, gpu: &mut dyn GpuResourceProvider) -> Result<()>;
}

declare_capability!(dyn ShadowsComponent, "ShadowsComponent");

pub struct Shadows {
    cascades: Vec<ShadowsCascade>,
    split_lambda: f32,
    dimensions: u32,
    depth_image: ImageHandle,
    depth_sampler: SamplerHandle,
}

impl Shadows {
    pub fn new(
        cascades_count: u32,
        split_lambda: f32,
        dimensions: u32,
        depth_image: ImageHandle,
        depth_sampler: SamplerHandle,
    ) -> Self {
        Self {
            cascades: vec![ShadowsCascade::default(); cascades_count as usize],
            split_lambda,
            dimensions,
            depth_image,
            depth_sampler,
        }
    }

    /// Far end of every cascade as a fraction of the clipping range
    ///
    /// Practical split scheme: a `split_lambda` blend between logarithmic
    /// and uniform distribution.
    pub fn cascade_splits(&self, near: f32, far: f32) -> Vec<f32> {
        let min_z = near.min(far);
        let max_z = near.max(far);
        let range = max_z - min_z;
        let ratio = max_z / min_z;
        let count = self.cascades.len() as f32;

        (0..self.cascades.len())
            .map(|i| {
                let p = (i + 1) as f32 / count;
                let log = min_z * ratio.powf(p);
                let uniform = min_z + range * p;
                let d = self.split_lambda * (log - uniform) + uniform;
                (d - min_z) / range
            })
            .collect()
    }
}

/// World-space corners of the camera frustum: near plane then far plane
fn frustum_corners(camera_projection: &Mat4, camera_view: &Mat4) -> [Vec3; 8] {
    let inverse = (*camera_projection * *camera_view).inverse();
    let mut corners = [Vec3::ZERO; 8];
    let mut i = 0;
    for z in [0.0, 1.0] {
        for (x, y) in [(-1.0, 1.0), (1.0, 1.0), (1.0, -1.0), (-1.0, -1.0)] {
            corners[i] = inverse.project_point3(Vec3::new(x, y, z));
            i += 1;
        }
    }
    corners
}

fn light_view(center: Vec3, light_direction: Vec3, radius: f32) -> Mat4 {
    let up = if light_direction.y.abs() > 0.99 { Vec3::Z } else { Vec3::Y };
    Mat4::look_at_rh(center - light_direction * radius, center, up)
}

impl ShadowsComponent for Shadows {
    fn update(&mut self, light_direction: Vec3, near: f32, far: f32, camera_projection: &Mat4, camera_view: &Mat4) {
        let light_direction = light_direction.normalize_or_zero();
        let corners = frustum_corners(camera_projection, camera_view);
        let splits = self.cascade_splits(near, far);
        let range = far - near;

        let mut last_split = 0.0;
        for (cascade, split) in self.cascades.iter_mut().zip(splits) {
            let mut slice = [Vec3::ZERO; 8];
            for j in 0..4 {
                let ray = corners[j + 4] - corners[j];
                slice[j] = corners[j] + ray * last_split;
                slice[j + 4] = corners[j] + ray * split;
            }

            let center = slice.iter().copied().sum::<Vec3>() / 8.0;
            let radius = slice.iter().map(|c| c.distance(center)).fold(0.0, f32::max);
            // Snap to 1/16 so the projection does not shimmer as the camera turns
            let radius = (radius * 16.0).ceil() / 16.0;

            *cascade = ShadowsCascade {
                view: light_view(center, light_direction, radius),
                projection: Mat4::orthographic_rh(-radius, radius, -radius, radius, 0.0, 2.0 * radius),
                start_split_depth: near + range * last_split,
                end_split_depth: near + range * split,
            };
            last_split = split;
        }
    }

    fn cascades_count(&self) -> u32 {
        self.cascades.len() as u32
    }

    fn cascade(&self, index: u32) -> Result<&ShadowsCascade> {
        match self.cascades.get(index as usize) {
            Some(cascade) => Ok(cascade),
            None => engine_bail!("prev::ShadowsComponent", @InvalidResource,
                "cascade {} out of range (count {})", index, self.cascades.len()),
        }
    }

    fn cascades(&self) -> &[ShadowsCascade] {
        &self.cascades
    }

    fn extent(&self) -> Rect2D {
        Rect2D::from_extent(self.dimensions, self.dimensions)
    }

    fn depth_image(&self) -> ImageHandle {
        self.depth_image
    }

    fn depth_sampler(&self) -> SamplerHandle {
        self.depth_sampler
    }

    fn destroy(&mut self, gpu: &mut dyn GpuResourceProvider) -> Result<()> {
        gpu.destroy_sampler(self.depth_sampler)?;
        gpu.destroy_image(self.depth_image)
    }
}

pub struct ShadowsComponentFactory;

impl ShadowsComponentFactory {
    /// Allocate the layered depth image and its sampler, sized from `config`
    pub fn create(gpu: &mut dyn GpuResourceProvider, config: &EngineConfig) -> Result<Shared<dyn ShadowsComponent>> {
        let depth_image = gpu.create_image(&ImageDesc {
            name: "shadows_depth".to_string(),
            width: config.shadow_map_dimensions,
            height: config.shadow_map_dimensions,
            layers: config.shadow_cascades_count,
            format: ImageFormat::Depth32,
        })?;
        let depth_sampler = gpu.create_sampler(&SamplerDesc {
            filter: Filter::Linear,
            address_mode: AddressMode::ClampToEdge,
        })?;

        Ok(shared(Shadows::new(
            config.shadow_cascades_count,
            config.shadow_cascades_split_lambda,
            config.shadow_map_dimensions,
            depth_image,
            depth_sampler,
        )))
    }
}

#[cfg(test)]
#[path = "shadows_tests.rs"]
mod tests;
