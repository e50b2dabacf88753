/// Camera component: a free-flying or fixed-up view.
///
/// Orientation changes are applied as deltas (`orientation = delta ·
/// orientation`) and the view matrix is rebuilt eagerly after every change,
/// so `look_at` never lags behind the last mutation.

use glam::{Mat4, Quat, Vec3};
use crate::declare_capability;
use crate::scene::{shared, Shared};

const DEFAULT_UP_DIRECTION: Vec3 = Vec3::Y;

/// Perspective parameters of a camera or light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewFrustum {
    pub vertical_fov_degrees: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ViewFrustum {
    fn default() -> Self {
        Self::new(60.0, 16.0 / 9.0, 0.1, 300.0)
    }
}

impl ViewFrustum {
    pub fn new(vertical_fov_degrees: f32, aspect_ratio: f32, near: f32, far: f32) -> Self {
        Self {
            vertical_fov_degrees,
            aspect_ratio,
            near,
            far,
        }
    }

    /// Right-handed perspective with 0..1 depth
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.vertical_fov_degrees.to_radians(), self.aspect_ratio, self.near, self.far)
    }

    /// Same frustum rendered into a viewport of another shape
    pub fn with_aspect_ratio(mut self, aspect_ratio: f32) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn clipping_range(&self) -> f32 {
        self.far - self.near
    }
}

pub trait CameraComponent {
    /// View matrix
    fn look_at(&self) -> Mat4;

    /// Back to the initial position and orientation
    fn reset(&mut self);

    /// Rotate around the current right direction
    fn add_pitch(&mut self, angle: f32);

    /// Rotate around the current up direction
    fn add_yaw(&mut self, angle: f32);

    /// Rotate around the current forward direction
    fn add_roll(&mut self, angle: f32);

    fn add_orientation(&mut self, delta: Quat);
    fn set_orientation(&mut self, orientation: Quat);

    fn add_position(&mut self, delta: Vec3);
    fn set_position(&mut self, position: Vec3);

    fn forward(&self) -> Vec3;
    fn right(&self) -> Vec3;
    fn up(&self) -> Vec3;

    fn position(&self) -> Vec3;
    fn orientation(&self) -> Quat;

    fn view_frustum(&self) -> ViewFrustum;
    fn set_view_frustum(&mut self, frustum: ViewFrustum);
}

declare_capability!(dyn CameraComponent, "CameraComponent");

pub struct Camera {
    initial_position: Vec3,
    initial_orientation: Quat,
    fixed_up: Option<Vec3>,

    position: Vec3,
    orientation: Quat,
    position_delta: Vec3,
    orientation_delta: Quat,

    forward: Vec3,
    right: Vec3,
    up: Vec3,
    view: Mat4,
    frustum: ViewFrustum,
}

impl Camera {
    /// Camera at `position`; with `fixed_up` the up direction never rolls
    pub fn new(position: Vec3, orientation: Quat, fixed_up: bool) -> Self {
        let mut camera = Self {
            initial_position: position,
            initial_orientation: orientation,
            fixed_up: fixed_up.then_some(DEFAULT_UP_DIRECTION),
            position,
            orientation,
            position_delta: Vec3::ZERO,
            orientation_delta: Quat::IDENTITY,
            forward: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
            view: Mat4::IDENTITY,
            frustum: ViewFrustum::default(),
        };
        camera.refresh();
        camera
    }

    fn refresh(&mut self) {
        let previous = self.orientation;
        self.orientation = (self.orientation_delta * self.orientation).normalize();
        if previous.dot(self.orientation) < 0.0 {
            self.orientation = self.orientation.conjugate();
        }
        self.orientation_delta = Quat::IDENTITY;

        self.forward = (self.orientation * Vec3::NEG_Z).normalize();
        match self.fixed_up {
            Some(up) => {
                self.up = up;
                self.right = self.forward.cross(up).normalize_or_zero();
            }
            None => {
                self.up = (self.orientation * Vec3::Y).normalize();
                self.right = (self.orientation * Vec3::X).normalize();
            }
        }

        self.position += self.position_delta;
        self.position_delta = Vec3::ZERO;

        self.view = Mat4::look_at_rh(self.position, self.position + self.forward, self.up);
    }
}

impl CameraComponent for Camera {
    fn look_at(&self) -> Mat4 {
        self.view
    }

    fn reset(&mut self) {
        self.position = self.initial_position;
        self.orientation = self.initial_orientation;
        self.position_delta = Vec3::ZERO;
        self.orientation_delta = Quat::IDENTITY;
        self.refresh();
    }

    fn add_pitch(&mut self, angle: f32) {
        self.add_orientation(Quat::from_axis_angle(self.right, angle));
    }

    fn add_yaw(&mut self, angle: f32) {
        self.add_orientation(Quat::from_axis_angle(self.up, angle));
    }

    fn add_roll(&mut self, angle: f32) {
        self.add_orientation(Quat::from_axis_angle(self.forward, angle));
    }

    fn add_orientation(&mut self, delta: Quat) {
        self.orientation_delta = (delta * self.orientation_delta).normalize();
        self.refresh();
    }

    fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = orientation.normalize();
        self.refresh();
    }

    fn add_position(&mut self, delta: Vec3) {
        self.position_delta += delta;
        self.refresh();
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.refresh();
    }

    fn forward(&self) -> Vec3 {
        self.forward
    }

    fn right(&self) -> Vec3 {
        self.right
    }

    fn up(&self) -> Vec3 {
        self.up
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn orientation(&self) -> Quat {
        self.orientation
    }

    fn view_frustum(&self) -> ViewFrustum {
        self.frustum
    }

    fn set_view_frustum(&mut self, frustum: ViewFrustum) {
        self.frustum = frustum;
    }
}

pub struct CameraComponentFactory;

impl CameraComponentFactory {
    /// Fixed-up camera, the usual choice for a player view
    pub fn create(position: Vec3, orientation: Quat) -> Shared<dyn CameraComponent> {
        shared(Camera::new(position, orientation, true))
    }

    /// Camera whose up direction follows its orientation
    pub fn create_free(position: Vec3, orientation: Quat) -> Shared<dyn CameraComponent> {
        shared(Camera::new(position, orientation, false))
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
