/// Skeletal animation clips.
///
/// An `Animation` is a set of per-bone keyframe tracks. Sampling a bone at
/// time `t` interpolates translation and scale linearly and rotation with
/// slerp; times before the first or after the last keyframe clamp.

use glam::{Mat4, Quat, Vec3};
use crate::error::Result;
use crate::engine_bail;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe<T> {
    pub time: f32,
    pub value: T,
}

impl<T> Keyframe<T> {
    pub fn new(time: f32, value: T) -> Self {
        Self { time, value }
    }
}

/// Keyframes of one bone, each channel sorted by time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoneTrack {
    pub name: String,
    pub translations: Vec<Keyframe<Vec3>>,
    pub rotations: Vec<Keyframe<Quat>>,
    pub scales: Vec<Keyframe<Vec3>>,
}

/// Interpolate a sorted channel at `time` with `mix`
fn sample_channel<T: Copy>(keys: &[Keyframe<T>], time: f32, fallback: T, mix: impl Fn(T, T, f32) -> T) -> T {
    let (Some(first), Some(last)) = (keys.first(), keys.last()) else {
        return fallback;
    };
    if time <= first.time {
        return first.value;
    }
    if time >= last.time {
        return last.value;
    }
    let next = keys.partition_point(|key| key.time <= time);
    let (a, b) = (&keys[next - 1], &keys[next]);
    let span = b.time - a.time;
    let factor = if span > 0.0 { (time - a.time) / span } else { 0.0 };
    mix(a.value, b.value, factor)
}

impl BoneTrack {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), ..Self::default() }
    }

    /// Local bone transform at `time`
    pub fn sample(&self, time: f32) -> Mat4 {
        let translation = sample_channel(&self.translations, time, Vec3::ZERO, |a, b, t| a.lerp(b, t));
        let rotation = sample_channel(&self.rotations, time, Quat::IDENTITY, |a, b, t| a.slerp(b, t));
        let scale = sample_channel(&self.scales, time, Vec3::ONE, |a, b, t| a.lerp(b, t));
        Mat4::from_scale_rotation_translation(scale, rotation.normalize(), translation)
    }

    fn is_sorted(&self) -> bool {
        fn sorted<T>(keys: &[Keyframe<T>]) -> bool {
            keys.windows(2).all(|pair| pair[0].time <= pair[1].time)
        }
        sorted(&self.translations) && sorted(&self.rotations) && sorted(&self.scales)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    name: String,
    duration: f32,
    bones: Vec<BoneTrack>,
}

impl Animation {
    /// # Errors
    ///
    /// `InvalidResource` for a negative duration or unsorted keyframes.
    pub fn new(name: &str, duration: f32, bones: Vec<BoneTrack>) -> Result<Self> {
        if duration.is_nan() || duration < 0.0 {
            engine_bail!("prev::Animation", @InvalidResource,
                "animation '{}' has invalid duration {}", name, duration);
        }
        if let Some(bone) = bones.iter().find(|bone| !bone.is_sorted()) {
            engine_bail!("prev::Animation", @InvalidResource,
                "animation '{}': keyframes of bone '{}' are not sorted", name, bone.name);
        }
        Ok(Self { name: name.to_string(), duration, bones })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn bones(&self) -> &[BoneTrack] {
        &self.bones
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// Local transform of every bone at `time`, at most `max_bones` of them
    pub fn sample(&self, time: f32, max_bones: usize) -> Vec<Mat4> {
        self.bones
            .iter()
            .take(max_bones)
            .map(|bone| bone.sample(time))
            .collect()
    }
}

#[cfg(test)]
#[path = "animation_tests.rs"]
mod tests;
