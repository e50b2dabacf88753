use glam::{Mat4, Vec3};
use crate::error::Error;
use crate::render::RecordingGpu;
use super::*;

fn shadows(count: u32) -> Shadows {
    let mut gpu = RecordingGpu::default();
    let image = gpu
        .create_image(&ImageDesc {
            name: "depth".to_string(),
            width: 256,
            height: 256,
            layers: count,
            format: ImageFormat::Depth32,
        })
        .unwrap();
    let sampler = gpu.create_sampler(&SamplerDesc::default()).unwrap();
    Shadows::new(count, 0.86, 256, image, sampler)
}

fn camera() -> (Mat4, Mat4) {
    let projection = Mat4::perspective_rh(60f32.to_radians(), 1.0, 1.0, 100.0);
    let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
    (projection, view)
}

// ============================================================================
// SPLITS
// ============================================================================

#[test]
fn test_splits_increase_up_to_full_range() {
    let splits = shadows(4).cascade_splits(1.0, 100.0);
    assert_eq!(splits.len(), 4);
    assert!(splits.windows(2).all(|w| w[0] < w[1]));
    assert!((splits[3] - 1.0).abs() < 1e-5);
}

#[test]
fn test_zero_lambda_gives_uniform_splits() {
    let mut shadows = shadows(4);
    shadows.split_lambda = 0.0;
    let splits = shadows.cascade_splits(1.0, 101.0);
    for (i, split) in splits.iter().enumerate() {
        assert!((split - (i + 1) as f32 * 0.25).abs() < 1e-5);
    }
}

// ============================================================================
// CASCADES
// ============================================================================

#[test]
fn test_update_covers_consecutive_depth_ranges() {
    let mut shadows = shadows(3);
    let (projection, view) = camera();
    shadows.update(Vec3::new(-1.0, -1.0, 0.0), 1.0, 100.0, &projection, &view);

    let cascades = shadows.cascades();
    assert!((cascades[0].start_split_depth - 1.0).abs() < 1e-4);
    assert!((cascades[2].end_split_depth - 100.0).abs() < 1e-3);
    for pair in cascades.windows(2) {
        assert_eq!(pair[0].end_split_depth, pair[1].start_split_depth);
    }
}

#[test]
fn test_cascade_projection_contains_its_slice() {
    let mut shadows = shadows(3);
    let (projection, view) = camera();
    shadows.update(Vec3::new(0.3, -1.0, 0.2), 1.0, 100.0, &projection, &view);

    for cascade in shadows.cascades() {
        let depth = 0.5 * (cascade.start_split_depth + cascade.end_split_depth);
        let clip = cascade.view_projection_matrix().project_point3(Vec3::new(0.0, 0.0, -depth));
        assert!(clip.x.abs() <= 1.0 && clip.y.abs() <= 1.0, "{clip:?}");
        assert!((0.0..=1.0).contains(&clip.z), "{clip:?}");
    }
}

#[test]
fn test_vertical_light_does_not_produce_nan() {
    let mut shadows = shadows(2);
    let (projection, view) = camera();
    shadows.update(Vec3::NEG_Y, 1.0, 100.0, &projection, &view);
    assert!(!shadows.cascade(0).unwrap().view.is_nan());
}

#[test]
fn test_biased_matrix_maps_to_texture_space() {
    let cascade = ShadowsCascade::default();
    let uv = cascade.biased_view_projection_matrix().project_point3(Vec3::new(-1.0, 1.0, 0.5));
    assert_eq!(uv, Vec3::new(0.0, 1.0, 0.5));
}

#[test]
fn test_cascade_out_of_range() {
    let shadows = shadows(2);
    assert!(shadows.cascade(1).is_ok());
    assert!(matches!(shadows.cascade(2), Err(Error::InvalidResource(_))));
}

// ============================================================================
// RESOURCES
// ============================================================================

#[test]
fn test_factory_allocates_layered_depth_image() {
    let mut gpu = RecordingGpu::default();
    let config = EngineConfig {
        shadow_cascades_count: 3,
        shadow_map_dimensions: 1024,
        ..EngineConfig::default()
    };

    let shadows = ShadowsComponentFactory::create(&mut gpu, &config).unwrap();
    let image = shadows.borrow().depth_image();
    let desc = gpu.image_desc(image).unwrap();
    assert_eq!(desc.layers, 3);
    assert_eq!(desc.format, ImageFormat::Depth32);
    assert_eq!(shadows.borrow().extent(), Rect2D::from_extent(1024, 1024));

    shadows.borrow_mut().destroy(&mut gpu).unwrap();
    assert_eq!(gpu.live_resources(), 0);
}
