/// Light component: a point or directional light source.
///
/// A light always looks at the world origin; its direction is the unit
/// vector from its position toward the origin.

use glam::{Mat4, Vec3};
use crate::declare_capability;
use crate::scene::{shared, Shared};
use super::camera::ViewFrustum;

pub trait LightComponent {
    /// View matrix from the light toward its look-at target
    fn look_at(&self) -> Mat4;

    fn projection_matrix(&self) -> Mat4;

    /// `normalize(-position)`
    fn direction(&self) -> Vec3;

    fn position(&self) -> Vec3;
    fn set_position(&mut self, position: Vec3);

    fn color(&self) -> Vec3;
    fn set_color(&mut self, color: Vec3);

    /// Constant, linear and quadratic attenuation factors
    fn attenuation(&self) -> Vec3;
    fn set_attenuation(&mut self, attenuation: Vec3);

    fn view_frustum(&self) -> ViewFrustum;
    fn set_view_frustum(&mut self, frustum: ViewFrustum);
}

declare_capability!(dyn LightComponent, "LightComponent");

pub struct Light {
    position: Vec3,
    target: Vec3,
    up: Vec3,
    color: Vec3,
    attenuation: Vec3,
    frustum: ViewFrustum,
}

impl Light {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            target: Vec3::ZERO,
            up: Vec3::Y,
            color: Vec3::ONE,
            attenuation: Vec3::new(1.0, 0.0, 0.0),
            frustum: ViewFrustum::new(45.0, 1.0, 10.0, 300.0),
        }
    }
}

impl LightComponent for Light {
    fn look_at(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    fn projection_matrix(&self) -> Mat4 {
        self.frustum.projection_matrix()
    }

    fn direction(&self) -> Vec3 {
        (-self.position).normalize_or_zero()
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn color(&self) -> Vec3 {
        self.color
    }

    fn set_color(&mut self, color: Vec3) {
        self.color = color;
    }

    fn attenuation(&self) -> Vec3 {
        self.attenuation
    }

    fn set_attenuation(&mut self, attenuation: Vec3) {
        self.attenuation = attenuation;
    }

    fn view_frustum(&self) -> ViewFrustum {
        self.frustum
    }

    fn set_view_frustum(&mut self, frustum: ViewFrustum) {
        self.frustum = frustum;
    }
}

pub struct LightComponentFactory;

impl LightComponentFactory {
    pub fn create(position: Vec3) -> Shared<dyn LightComponent> {
        shared(Light::new(position))
    }

    pub fn create_colored(position: Vec3, color: Vec3, attenuation: Vec3) -> Shared<dyn LightComponent> {
        let mut light = Light::new(position);
        light.color = color;
        light.attenuation = attenuation;
        shared(light)
    }
}

#[cfg(test)]
#[path = "light_tests.rs"]
mod tests;
