/// Transform component: position, orientation and scale of a node.
///
/// The world transform is cached and only recomputed by `update`, which
/// composes the parent's cached world transform with the local one. Nothing
/// orders updates automatically: updating a child before its parent picks
/// up the parent's previous world transform. Scene traversal updates parents
/// first, which is what keeps the chain fresh within one frame.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use glam::{Mat4, Quat, Vec3};
use crate::declare_capability;
use crate::scene::{shared, Shared};

pub trait TransformComponent {
    /// Recompute the cached world transform
    fn update(&mut self, delta_time: f32);

    /// `T(position) · R(orientation)`
    fn local_transform(&self) -> Mat4;

    /// `local_transform() · S(scale)`
    fn local_transform_scaled(&self) -> Mat4;

    /// Cached world transform (without this node's scale)
    fn world_transform(&self) -> Mat4;

    /// `world_transform() · S(scale)`
    fn world_transform_scaled(&self) -> Mat4;

    fn position(&self) -> Vec3;
    fn orientation(&self) -> Quat;
    fn scale(&self) -> Vec3;

    fn set_position(&mut self, position: Vec3);
    fn set_orientation(&mut self, orientation: Quat);
    fn set_scale(&mut self, scale: Vec3);

    fn translate(&mut self, delta: Vec3);

    /// `orientation = normalize(orientation · delta)`
    fn rotate(&mut self, delta: Quat);

    /// Additive scale change
    fn scale_by(&mut self, delta: Vec3);

    /// Attach to (or with `None` detach from) a parent transform
    ///
    /// Only a weak link is kept; a dropped parent counts as no parent.
    fn set_parent(&mut self, parent: Option<&Shared<dyn TransformComponent>>);

    fn parent(&self) -> Option<Shared<dyn TransformComponent>>;

    fn is_root(&self) -> bool {
        self.parent().is_none()
    }
}

declare_capability!(dyn TransformComponent, "TransformComponent");

pub struct Transform {
    position: Vec3,
    orientation: Quat,
    scale: Vec3,
    world_transform: Mat4,
    parent: Option<Weak<RefCell<dyn TransformComponent>>>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Quat::IDENTITY, Vec3::ONE)
    }
}

impl Transform {
    pub fn new(position: Vec3, orientation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            orientation,
            scale,
            world_transform: Mat4::IDENTITY,
            parent: None,
        }
    }
}

impl TransformComponent for Transform {
    fn update(&mut self, _delta_time: f32) {
        let local = self.local_transform();
        self.world_transform = match self.parent() {
            Some(parent) => parent.borrow().world_transform() * local,
            None => local,
        };
    }

    fn local_transform(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position)
    }

    fn local_transform_scaled(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.orientation, self.position)
    }

    fn world_transform(&self) -> Mat4 {
        self.world_transform
    }

    fn world_transform_scaled(&self) -> Mat4 {
        self.world_transform * Mat4::from_scale(self.scale)
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn orientation(&self) -> Quat {
        self.orientation
    }

    fn scale(&self) -> Vec3 {
        self.scale
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = orientation;
    }

    fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    fn rotate(&mut self, delta: Quat) {
        self.orientation = (self.orientation * delta).normalize();
    }

    fn scale_by(&mut self, delta: Vec3) {
        self.scale += delta;
    }

    fn set_parent(&mut self, parent: Option<&Shared<dyn TransformComponent>>) {
        self.parent = parent.map(Rc::downgrade);
    }

    fn parent(&self) -> Option<Shared<dyn TransformComponent>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }
}

/// Builds shared transform components
pub struct TransformComponentFactory;

impl TransformComponentFactory {
    pub fn create() -> Shared<dyn TransformComponent> {
        shared(Transform::default())
    }

    pub fn create_at(position: Vec3) -> Shared<dyn TransformComponent> {
        shared(Transform::new(position, Quat::IDENTITY, Vec3::ONE))
    }

    pub fn create_with(position: Vec3, orientation: Quat, scale: Vec3) -> Shared<dyn TransformComponent> {
        shared(Transform::new(position, orientation, scale))
    }
}

#[cfg(test)]
#[path = "transform_tests.rs"]
mod tests;
