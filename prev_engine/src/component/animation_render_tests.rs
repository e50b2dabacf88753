use std::sync::Arc;
use glam::Vec3;
use crate::asset::{BoneTrack, Keyframe, Mesh};
use crate::render::RecordingGpu;
use super::*;

fn sliding_bone() -> BoneTrack {
    let mut bone = BoneTrack::new("root");
    bone.translations = vec![Keyframe::new(0.0, Vec3::ZERO), Keyframe::new(2.0, Vec3::new(4.0, 0.0, 0.0))];
    bone
}

fn animated(bone_count: usize, max_bones: usize) -> AnimatedRender {
    let mut gpu = RecordingGpu::default();
    let model = Model::upload(&mut gpu, Arc::new(Mesh::cube(1.0))).unwrap();
    let animation = Animation::new("slide", 2.0, vec![sliding_bone(); bone_count]).unwrap();
    AnimatedRender::new(
        RenderData::new(model, vec![Material::default()], RenderFlags::CASTS_SHADOWS),
        animation,
        max_bones,
    )
}

fn root_x(component: &AnimatedRender) -> f32 {
    component.bone_transforms()[0].w_axis.x
}

// ============================================================================
// PLAYBACK
// ============================================================================

#[test]
fn test_update_advances_and_loops() {
    let mut component = animated(1, 8);
    component.update(0.5);
    assert!((root_x(&component) - 1.0).abs() < 1e-5);

    component.update(2.0);
    assert!((component.time() - 0.5).abs() < 1e-5);
}

#[test]
fn test_speed_scales_time() {
    let mut component = animated(1, 8);
    component.set_speed(2.0);
    component.update(0.5);
    assert!((component.time() - 1.0).abs() < 1e-5);
}

#[test]
fn test_paused_holds_pose_and_stopped_rewinds() {
    let mut component = animated(1, 8);
    component.update(1.0);

    component.set_state(AnimationState::Paused);
    component.update(0.5);
    assert!((component.time() - 1.0).abs() < 1e-5);

    component.set_state(AnimationState::Stopped);
    assert_eq!(component.time(), 0.0);
    component.update(0.5);
    assert_eq!(component.time(), 0.0);
}

// ============================================================================
// BONES
// ============================================================================

#[test]
fn test_bone_count_is_capped() {
    assert_eq!(animated(5, 3).bone_transforms().len(), 3);
    assert_eq!(animated(2, 3).bone_transforms().len(), 2);
}

#[test]
fn test_render_accessors() {
    let component = animated(1, 1);
    assert!(component.casts_shadows());
    assert!(!component.is_casted_by_shadows());
    assert_eq!(component.animation().name(), "slide");
    assert!(component.material(0).is_some());
}
