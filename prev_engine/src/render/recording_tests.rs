//! Unit tests for recording.rs

use super::*;
use crate::error::Error;
use crate::render::gpu::{BufferUsage, ImageFormat, UniformBinding};

fn uniform_buffer(gpu: &mut RecordingGpu, size: u64) -> BufferHandle {
    gpu.create_buffer(&BufferDesc {
        name: "ubo".to_string(),
        size,
        usage: BufferUsage::Uniform,
    }).unwrap()
}

fn color_image(gpu: &mut RecordingGpu) -> ImageHandle {
    gpu.create_image(&ImageDesc {
        name: "albedo".to_string(),
        width: 4,
        height: 4,
        layers: 1,
        format: ImageFormat::Rgba8,
    }).unwrap()
}

// ============================================================================
// RESOURCES
// ============================================================================

#[test]
fn test_write_buffer_stores_bytes() {
    let mut gpu = RecordingGpu::default();
    let buffer = uniform_buffer(&mut gpu, 16);

    gpu.write_buffer(buffer, 4, &[1, 2, 3]).unwrap();
    assert_eq!(&gpu.buffer_data(buffer).unwrap()[..8], &[0, 0, 0, 0, 1, 2, 3, 0]);
}

#[test]
fn test_write_buffer_out_of_range_fails() {
    let mut gpu = RecordingGpu::default();
    let buffer = uniform_buffer(&mut gpu, 8);
    let result = gpu.write_buffer(buffer, 6, &[0; 4]);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_stale_handles_are_rejected() {
    let mut gpu = RecordingGpu::default();
    let buffer = uniform_buffer(&mut gpu, 8);
    gpu.destroy_buffer(buffer).unwrap();

    assert!(matches!(gpu.destroy_buffer(buffer), Err(Error::InvalidResource(_))));
    assert!(matches!(gpu.write_buffer(buffer, 0, &[1]), Err(Error::InvalidResource(_))));
    assert_eq!(gpu.live_resources(), 0);
}

#[test]
fn test_empty_resources_are_rejected() {
    let mut gpu = RecordingGpu::default();
    assert!(gpu.create_buffer(&BufferDesc {
        name: "empty".to_string(),
        size: 0,
        usage: BufferUsage::Vertex,
    }).is_err());
    assert!(gpu.create_image(&ImageDesc {
        name: "empty".to_string(),
        width: 0,
        height: 4,
        layers: 1,
        format: ImageFormat::Depth32,
    }).is_err());
}

// ============================================================================
// DESCRIPTOR SETS
// ============================================================================

#[test]
fn test_descriptor_set_with_declared_slots() {
    let mut gpu = RecordingGpu::new(64);
    let pipeline = gpu.create_pipeline(&PipelineDesc::opaque("entity", &["ubo"], &["colorSampler"])).unwrap();
    let buffer = uniform_buffer(&mut gpu, 256);
    let image = color_image(&mut gpu);
    let sampler = gpu.create_sampler(&SamplerDesc::default()).unwrap();

    let mut bindings = ShaderBindings::new();
    bindings
        .bind_uniform("ubo", UniformBinding { buffer, offset: 64, range: 64 })
        .bind_image("colorSampler", image, sampler);

    let set = gpu.update_descriptor_set(pipeline, &bindings).unwrap();
    assert_eq!(gpu.descriptor_set(set), Some(&bindings));
    assert_eq!(gpu.descriptor_set_pipeline(set), Some(pipeline));
}

#[test]
fn test_descriptor_set_with_unknown_slot_fails() {
    let mut gpu = RecordingGpu::default();
    let pipeline = gpu.create_pipeline(&PipelineDesc::opaque("entity", &["ubo"], &[])).unwrap();
    let image = color_image(&mut gpu);
    let sampler = gpu.create_sampler(&SamplerDesc::default()).unwrap();

    let mut bindings = ShaderBindings::new();
    bindings.bind_image("normalSampler", image, sampler);
    assert!(matches!(
        gpu.update_descriptor_set(pipeline, &bindings),
        Err(Error::InvalidResource(_))
    ));
}

#[test]
fn test_descriptor_set_with_misaligned_offset_fails() {
    let mut gpu = RecordingGpu::new(256);
    let pipeline = gpu.create_pipeline(&PipelineDesc::opaque("entity", &["ubo"], &[])).unwrap();
    let buffer = uniform_buffer(&mut gpu, 1024);

    let mut bindings = ShaderBindings::new();
    bindings.bind_uniform("ubo", UniformBinding { buffer, offset: 128, range: 64 });
    assert!(gpu.update_descriptor_set(pipeline, &bindings).is_err());
}

#[test]
fn test_destroying_pipeline_drops_its_sets() {
    let mut gpu = RecordingGpu::default();
    let pipeline = gpu.create_pipeline(&PipelineDesc::opaque("entity", &[], &[])).unwrap();
    gpu.update_descriptor_set(pipeline, &ShaderBindings::new()).unwrap();
    assert_eq!(gpu.descriptor_set_count(), 1);

    gpu.destroy_pipeline(pipeline).unwrap();
    assert_eq!(gpu.descriptor_set_count(), 0);
}

// ============================================================================
// COMMAND LIST
// ============================================================================

#[test]
fn test_command_list_records_in_order() {
    let mut gpu = RecordingGpu::default();
    let pipeline = gpu.create_pipeline(&PipelineDesc::opaque("entity", &[], &[])).unwrap();
    let mut cmd = RecordingCommandList::new();

    cmd.begin().unwrap();
    cmd.set_viewport(Rect2D::from_extent(800, 600).viewport()).unwrap();
    cmd.bind_pipeline(pipeline).unwrap();
    cmd.draw_indexed(36, 0, 0).unwrap();
    cmd.end().unwrap();

    assert_eq!(cmd.commands.len(), 5);
    assert_eq!(cmd.commands[0], "begin");
    assert_eq!(cmd.commands[1], "set_viewport(800x600)");
    assert_eq!(cmd.commands[3], "draw_indexed(36, 0, 0)");
    assert_eq!(cmd.count("bind_pipeline"), 1);
    assert!(!cmd.is_recording());
}

#[test]
fn test_command_outside_begin_end_fails() {
    let mut cmd = RecordingCommandList::new();
    assert!(matches!(cmd.draw_indexed(3, 0, 0), Err(Error::BackendError(_))));

    cmd.begin().unwrap();
    assert!(cmd.begin().is_err());
}

#[test]
fn test_instanced_draw_records_instance_count() {
    let mut gpu = RecordingGpu::default();
    let instances = gpu.create_buffer(&BufferDesc {
        name: "instances".to_string(),
        size: 64,
        usage: BufferUsage::Instance,
    }).unwrap();
    let mut cmd = RecordingCommandList::new();

    cmd.begin().unwrap();
    cmd.bind_instance_buffer(instances, 0).unwrap();
    cmd.draw_indexed_instanced(6, 12, 0, 0).unwrap();
    assert!(cmd.draw_indexed_instanced(6, 0, 0, 0).is_err());
    cmd.end().unwrap();

    assert_eq!(cmd.count("bind_instance_buffer"), 1);
    assert_eq!(cmd.commands[2], "draw_indexed_instanced(6, 12, 0, 0)");
}
