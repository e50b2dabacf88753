/// Animation render component: a skinned drawable and its playback state.

use glam::Mat4;
use crate::asset::{Animation, Material, Model};
use crate::declare_capability;
use crate::scene::{shared, Shared};
use super::render::{RenderData, RenderFlags};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationState {
    #[default]
    Running,
    Paused,
    /// Playback rewound to the first frame
    Stopped,
}

pub trait AnimationRenderComponent {
    /// Advance playback; time wraps around the animation duration
    fn update(&mut self, delta_time: f32);

    fn model(&self) -> &Model;
    fn material(&self, index: usize) -> Option<&Material>;
    fn materials(&self) -> &[Material];
    fn flags(&self) -> RenderFlags;

    fn casts_shadows(&self) -> bool {
        self.flags().contains(RenderFlags::CASTS_SHADOWS)
    }

    fn is_casted_by_shadows(&self) -> bool {
        self.flags().contains(RenderFlags::CASTED_BY_SHADOWS)
    }

    fn animation(&self) -> &Animation;

    /// Current pose, at most `max_bones_count` matrices
    fn bone_transforms(&self) -> Vec<Mat4>;

    fn time(&self) -> f32;

    fn speed(&self) -> f32;
    fn set_speed(&mut self, speed: f32);

    fn state(&self) -> AnimationState;
    fn set_state(&mut self, state: AnimationState);
}

declare_capability!(dyn AnimationRenderComponent, "AnimationRenderComponent");

pub struct AnimatedRender {
    data: RenderData,
    animation: Animation,
    max_bones: usize,
    time: f32,
    speed: f32,
    state: AnimationState,
}

impl AnimatedRender {
    pub fn new(data: RenderData, animation: Animation, max_bones: usize) -> Self {
        Self {
            data,
            animation,
            max_bones,
            time: 0.0,
            speed: 1.0,
            state: AnimationState::Running,
        }
    }
}

impl AnimationRenderComponent for AnimatedRender {
    fn update(&mut self, delta_time: f32) {
        if self.state != AnimationState::Running {
            return;
        }
        let duration = self.animation.duration();
        if duration <= 0.0 {
            self.time = 0.0;
            return;
        }
        self.time = (self.time + delta_time * self.speed).rem_euclid(duration);
    }

    fn model(&self) -> &Model {
        &self.data.model
    }

    fn material(&self, index: usize) -> Option<&Material> {
        self.data.materials.get(index)
    }

    fn materials(&self) -> &[Material] {
        &self.data.materials
    }

    fn flags(&self) -> RenderFlags {
        self.data.flags
    }

    fn animation(&self) -> &Animation {
        &self.animation
    }

    fn bone_transforms(&self) -> Vec<Mat4> {
        self.animation.sample(self.time, self.max_bones)
    }

    fn time(&self) -> f32 {
        self.time
    }

    fn speed(&self) -> f32 {
        self.speed
    }

    fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    fn state(&self) -> AnimationState {
        self.state
    }

    fn set_state(&mut self, state: AnimationState) {
        if state == AnimationState::Stopped {
            self.time = 0.0;
        }
        self.state = state;
    }
}

pub struct AnimationRenderComponentFactory;

impl AnimationRenderComponentFactory {
    /// `max_bones` is usually `EngineConfig::max_bones_count`
    pub fn create(
        model: Model,
        materials: Vec<Material>,
        animation: Animation,
        flags: RenderFlags,
        max_bones: usize,
    ) -> Shared<dyn AnimationRenderComponent> {
        shared(AnimatedRender::new(RenderData::new(model, materials, flags), animation, max_bones))
    }
}

#[cfg(test)]
#[path = "animation_render_tests.rs"]
mod tests;
