use std::f32::consts::FRAC_PI_2;
use glam::{Quat, Vec3, Vec4};
use super::*;

fn close(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < 1e-4
}

// ============================================================================
// DIRECTIONS
// ============================================================================

#[test]
fn test_identity_camera_looks_down_negative_z() {
    let camera = Camera::new(Vec3::ZERO, Quat::IDENTITY, true);
    assert!(close(camera.forward(), Vec3::NEG_Z));
    assert!(close(camera.right(), Vec3::X));
    assert!(close(camera.up(), Vec3::Y));
}

#[test]
fn test_yaw_turns_forward_left() {
    let mut camera = Camera::new(Vec3::ZERO, Quat::IDENTITY, true);
    camera.add_yaw(FRAC_PI_2);
    assert!(close(camera.forward(), Vec3::NEG_X));
    assert!(close(camera.right(), Vec3::NEG_Z));
}

#[test]
fn test_fixed_up_survives_roll() {
    let mut camera = Camera::new(Vec3::ZERO, Quat::IDENTITY, true);
    camera.add_roll(0.3);
    assert_eq!(camera.up(), Vec3::Y);
}

#[test]
fn test_free_camera_rolls_up_direction() {
    let mut camera = Camera::new(Vec3::ZERO, Quat::IDENTITY, false);
    camera.add_roll(FRAC_PI_2);
    assert!(!close(camera.up(), Vec3::Y));
    assert!(camera.up().dot(camera.forward()).abs() < 1e-4);
}

#[test]
fn test_pitch_keeps_orientation_normalized() {
    let mut camera = Camera::new(Vec3::ZERO, Quat::IDENTITY, true);
    for _ in 0..100 {
        camera.add_pitch(0.01);
    }
    assert!((camera.orientation().length() - 1.0).abs() < 1e-5);
    assert!(camera.forward().y > 0.5);
}

// ============================================================================
// VIEW MATRIX
// ============================================================================

#[test]
fn test_view_matrix_follows_position() {
    let mut camera = Camera::new(Vec3::ZERO, Quat::IDENTITY, true);
    camera.add_position(Vec3::new(0.0, 0.0, 5.0));
    assert!(close(camera.position(), Vec3::new(0.0, 0.0, 5.0)));

    let view_space = camera.look_at().transform_point3(Vec3::ZERO);
    assert!(close(view_space, Vec3::new(0.0, 0.0, -5.0)));
}

#[test]
fn test_reset_restores_initial_state() {
    let mut camera = Camera::new(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY, true);
    let initial_view = camera.look_at();

    camera.add_yaw(0.7);
    camera.set_position(Vec3::new(-4.0, 0.0, 0.0));
    camera.reset();

    assert_eq!(camera.position(), Vec3::new(1.0, 2.0, 3.0));
    assert!(camera.look_at().abs_diff_eq(initial_view, 1e-5));
}

#[test]
fn test_set_orientation_replaces_accumulated_rotation() {
    let mut camera = Camera::new(Vec3::ZERO, Quat::IDENTITY, true);
    camera.add_yaw(1.0);
    camera.set_orientation(Quat::IDENTITY);
    assert!(close(camera.forward(), Vec3::NEG_Z));
}

// ============================================================================
// FRUSTUM
// ============================================================================

#[test]
fn test_projection_maps_near_and_far_to_unit_depth() {
    let frustum = ViewFrustum::new(60.0, 1.0, 0.5, 100.0);
    let projection = frustum.projection_matrix();

    let near = projection * Vec4::new(0.0, 0.0, -0.5, 1.0);
    let far = projection * Vec4::new(0.0, 0.0, -100.0, 1.0);
    assert!((near.z / near.w).abs() < 1e-5);
    assert!((far.z / far.w - 1.0).abs() < 1e-5);
}

#[test]
fn test_factory_shares_view_frustum_updates() {
    let camera = CameraComponentFactory::create(Vec3::ZERO, Quat::IDENTITY);
    let frustum = ViewFrustum::new(45.0, 2.0, 1.0, 50.0);
    camera.borrow_mut().set_view_frustum(frustum);
    assert_eq!(camera.borrow().view_frustum(), frustum);
    assert_eq!(frustum.clipping_range(), 49.0);
}
