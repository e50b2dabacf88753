/// Particle system component: billboards emitted around a centre, aged
/// under gravity and animated through a texture atlas.
///
/// Every update emits `floor(rate · dt)` particles, plus one more with a
/// probability equal to the fractional part, then ages all particles and
/// drops the dead ones. The live particles are laid out as
/// `ParticleInstance`s for one instanced draw; each frame in flight owns
/// its own instance buffer.

use std::f32::consts::TAU;
use std::sync::Arc;
use bytemuck::{Pod, Zeroable};
use glam::{Quat, Vec2, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::asset::{Material, Mesh, Model};
use crate::config::EngineConfig;
use crate::declare_capability;
use crate::error::Result;
use crate::render::{BufferDesc, BufferHandle, BufferUsage, GpuResourceProvider};
use crate::scene::node_component_helper as helper;
use crate::scene::{shared, NodeBehavior, NodeContext, Shared};
use crate::{engine_bail, engine_debug};
use super::transform::TransformComponent;

// ===== PARTICLE =====

/// Per-instance vertex data of one particle
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    pub position: Vec3,
    /// Degrees around the view axis
    pub rotation: f32,
    pub scale: Vec2,
    /// Blend from the current atlas stage to the next
    pub blend: f32,
    pub _padding: f32,
    pub current_offset: Vec2,
    pub next_offset: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    position: Vec3,
    velocity: Vec3,
    gravity_effect: f32,
    life_length: f32,
    rotation: f32,
    scale: f32,
    elapsed_time: f32,
    current_offset: Vec2,
    next_offset: Vec2,
    blend: f32,
}

/// Offset of cell `index` in an atlas of `rows × rows` cells
pub fn atlas_offset(index: u32, rows: u32) -> Vec2 {
    let rows = rows.max(1);
    Vec2::new((index % rows) as f32, (index / rows) as f32) / rows as f32
}

impl Particle {
    pub fn new(position: Vec3, velocity: Vec3, gravity_effect: f32, life_length: f32, rotation: f32, scale: f32) -> Self {
        Self {
            position,
            velocity,
            gravity_effect,
            life_length,
            rotation,
            scale,
            elapsed_time: 0.0,
            current_offset: Vec2::ZERO,
            next_offset: Vec2::ZERO,
            blend: 0.0,
        }
    }

    /// Integrate motion, age by `delta_time` and pick the atlas stage for
    /// the new age
    pub fn update(&mut self, delta_time: f32, gravity: f32, atlas_rows: u32) {
        self.velocity.y += gravity * self.gravity_effect * delta_time;
        self.position += self.velocity * delta_time;
        self.elapsed_time += delta_time;
        self.update_stage(atlas_rows);
    }

    fn update_stage(&mut self, atlas_rows: u32) {
        let rows = atlas_rows.max(1);
        let stage_count = rows * rows;
        let life_factor = if self.life_length > 0.0 {
            (self.elapsed_time / self.life_length).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let progression = life_factor * stage_count as f32;
        let current = (progression.floor() as u32).min(stage_count - 1);
        let next = if current + 1 < stage_count { current + 1 } else { current };

        self.blend = progression.fract();
        self.current_offset = atlas_offset(current, rows);
        self.next_offset = atlas_offset(next, rows);
    }

    pub fn is_alive(&self) -> bool {
        self.elapsed_time < self.life_length
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn life_length(&self) -> f32 {
        self.life_length
    }

    pub fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn stage(&self) -> (Vec2, Vec2, f32) {
        (self.current_offset, self.next_offset, self.blend)
    }

    pub fn instance(&self) -> ParticleInstance {
        ParticleInstance {
            position: self.position,
            rotation: self.rotation,
            scale: Vec2::splat(self.scale),
            blend: self.blend,
            _padding: 0.0,
            current_offset: self.current_offset,
            next_offset: self.next_offset,
        }
    }
}

// ===== FACTORIES =====

/// Averages and spreads of emitted particles
///
/// Each value is drawn uniformly from `average ± error`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmissionParams {
    /// Multiplier of `EngineConfig::particles_gravity`
    pub gravity_effect: f32,
    pub average_speed: f32,
    pub speed_error: f32,
    pub average_life_length: f32,
    pub life_length_error: f32,
    pub average_scale: f32,
    pub scale_error: f32,
    /// Random start rotation in `0..360` degrees, otherwise 0
    pub random_rotation: bool,
    /// Particles start up to this far from the centre
    pub radius: f32,
}

impl EmissionParams {
    pub fn new(gravity_effect: f32, average_speed: f32, average_life_length: f32, average_scale: f32) -> Self {
        Self {
            gravity_effect,
            average_speed,
            speed_error: 0.0,
            average_life_length,
            life_length_error: 0.0,
            average_scale,
            scale_error: 0.0,
            random_rotation: false,
            radius: 0.0,
        }
    }

    pub fn with_errors(mut self, speed_error: f32, life_length_error: f32, scale_error: f32) -> Self {
        self.speed_error = speed_error;
        self.life_length_error = life_length_error;
        self.scale_error = scale_error;
        self
    }

    pub fn with_random_rotation(mut self) -> Self {
        self.random_rotation = true;
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }
}

/// Produces new particles
pub trait ParticleFactory {
    /// Material of every particle (atlas rows and image)
    fn material(&self) -> &Material;

    fn params(&self) -> &EmissionParams;

    /// A fresh particle around `center`
    fn emit(&mut self, center: Vec3) -> Particle;
}

fn spread(rng: &mut StdRng, average: f32, error: f32) -> f32 {
    if error <= 0.0 {
        return average;
    }
    average + rng.gen_range(-1.0f32..=1.0) * error
}

/// Uniform direction on the unit sphere
fn random_unit_vector(rng: &mut StdRng) -> Vec3 {
    let theta = rng.gen_range(0.0..TAU);
    let z: f32 = rng.gen_range(-1.0..=1.0);
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(r * theta.cos(), r * theta.sin(), z)
}

fn build_particle(rng: &mut StdRng, params: &EmissionParams, position: Vec3, direction: Vec3) -> Particle {
    let velocity = direction.normalize_or_zero() * spread(rng, params.average_speed, params.speed_error);
    let life_length = spread(rng, params.average_life_length, params.life_length_error);
    let scale = spread(rng, params.average_scale, params.scale_error);
    let rotation = if params.random_rotation { rng.gen_range(0.0..360.0) } else { 0.0 };
    Particle::new(position, velocity, params.gravity_effect, life_length, rotation, scale)
}

/// Emits in every direction from a sphere of `radius` around the centre
pub struct RandomDirectionParticleFactory {
    material: Material,
    params: EmissionParams,
    rng: StdRng,
}

impl RandomDirectionParticleFactory {
    pub fn new(material: Material, params: EmissionParams, seed: u64) -> Self {
        Self {
            material,
            params,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl ParticleFactory for RandomDirectionParticleFactory {
    fn material(&self) -> &Material {
        &self.material
    }

    fn params(&self) -> &EmissionParams {
        &self.params
    }

    fn emit(&mut self, center: Vec3) -> Particle {
        let offset = random_unit_vector(&mut self.rng) * self.rng.gen_range(0.0..=1.0f32) * self.params.radius;
        let direction = random_unit_vector(&mut self.rng);
        build_particle(&mut self.rng, &self.params, center + offset, direction)
    }
}

/// Emits inside a cone around `direction`, from a disc of `radius` across
/// the cone axis
pub struct RandomInConeParticleFactory {
    material: Material,
    params: EmissionParams,
    rng: StdRng,
    direction: Vec3,
    deviation_degrees: f32,
}

impl RandomInConeParticleFactory {
    pub fn new(material: Material, params: EmissionParams, direction: Vec3, deviation_degrees: f32, seed: u64) -> Self {
        Self {
            material,
            params,
            rng: StdRng::seed_from_u64(seed),
            direction: direction.try_normalize().unwrap_or(Vec3::Y),
            deviation_degrees,
        }
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn deviation_degrees(&self) -> f32 {
        self.deviation_degrees
    }

    /// Direction within the cone: sampled around +Z, then turned onto the axis
    fn cone_direction(&mut self) -> Vec3 {
        let cos_angle = self.deviation_degrees.to_radians().cos();
        let theta = self.rng.gen_range(0.0..TAU);
        let z = cos_angle + self.rng.gen_range(0.0..=1.0f32) * (1.0 - cos_angle);
        let r = (1.0 - z * z).max(0.0).sqrt();
        let local = Vec3::new(r * theta.cos(), r * theta.sin(), z);
        Quat::from_rotation_arc(Vec3::Z, self.direction) * local
    }

    fn radius_offset(&mut self) -> Vec3 {
        let normal = self.direction.any_orthonormal_vector();
        let theta = self.rng.gen_range(0.0..TAU);
        let distance = self.rng.gen_range(0.0..=1.0f32) * self.params.radius;
        Quat::from_axis_angle(self.direction, theta) * normal * distance
    }
}

impl ParticleFactory for RandomInConeParticleFactory {
    fn material(&self) -> &Material {
        &self.material
    }

    fn params(&self) -> &EmissionParams {
        &self.params
    }

    fn emit(&mut self, center: Vec3) -> Particle {
        let offset = self.radius_offset();
        let direction = self.cone_direction();
        build_particle(&mut self.rng, &self.params, center + offset, direction)
    }
}

// ===== SYSTEM =====

pub trait ParticleSystemComponent {
    /// Emit around `center`, then age every particle and drop the dead
    fn update(&mut self, delta_time: f32, center: Vec3);

    fn particles(&self) -> &[Particle];

    fn particle_count(&self) -> u32 {
        self.particles().len() as u32
    }

    /// Most particles alive at once
    fn capacity(&self) -> u32;

    /// Emission rate in particles per second
    fn particles_per_second(&self) -> f32;

    /// Billboard quad every particle is drawn with
    fn model(&self) -> &Model;

    fn material(&self) -> &Material;

    /// Instance buffer owned by `frame_in_flight`, `None` once destroyed
    fn instance_buffer(&self, frame_in_flight: u32) -> Option<BufferHandle>;

    /// Live particles in instance layout
    fn instances(&self) -> Vec<ParticleInstance> {
        self.particles().iter().map(Particle::instance).collect()
    }

    /// Release the instance buffers and the quad
    fn destroy(&mut self, gpu: &mut dyn GpuResourceProvider) -> Result<()>;
}

declare_capability!(dyn ParticleSystemComponent, "ParticleSystemComponent");

pub struct ParticleSystem {
    factory: Box<dyn ParticleFactory>,
    model: Model,
    instance_buffers: Vec<BufferHandle>,
    particles: Vec<Particle>,
    capacity: u32,
    particles_per_second: f32,
    gravity: f32,
    rng: StdRng,
}

impl ParticleSystem {
    pub fn new(
        factory: Box<dyn ParticleFactory>,
        model: Model,
        instance_buffers: Vec<BufferHandle>,
        capacity: u32,
        particles_per_second: f32,
        gravity: f32,
        seed: u64,
    ) -> Self {
        Self {
            factory,
            model,
            instance_buffers,
            particles: Vec::new(),
            capacity,
            particles_per_second,
            gravity,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn emit(&mut self, center: Vec3) {
        if self.particles.len() < self.capacity as usize {
            let particle = self.factory.emit(center);
            self.particles.push(particle);
        }
    }
}

impl ParticleSystemComponent for ParticleSystem {
    fn update(&mut self, delta_time: f32, center: Vec3) {
        let to_create = (self.particles_per_second * delta_time).max(0.0);
        for _ in 0..to_create.floor() as u32 {
            self.emit(center);
        }
        if self.rng.gen::<f32>() < to_create.fract() {
            self.emit(center);
        }

        let gravity = self.gravity;
        let atlas_rows = self.factory.material().atlas_rows;
        self.particles.retain_mut(|particle| {
            particle.update(delta_time, gravity, atlas_rows);
            particle.is_alive()
        });
    }

    fn particles(&self) -> &[Particle] {
        &self.particles
    }

    fn capacity(&self) -> u32 {
        self.capacity
    }

    fn particles_per_second(&self) -> f32 {
        self.particles_per_second
    }

    fn model(&self) -> &Model {
        &self.model
    }

    fn material(&self) -> &Material {
        self.factory.material()
    }

    fn instance_buffer(&self, frame_in_flight: u32) -> Option<BufferHandle> {
        if self.instance_buffers.is_empty() {
            return None;
        }
        self.instance_buffers.get(frame_in_flight as usize % self.instance_buffers.len()).copied()
    }

    fn destroy(&mut self, gpu: &mut dyn GpuResourceProvider) -> Result<()> {
        for buffer in self.instance_buffers.drain(..) {
            gpu.destroy_buffer(buffer)?;
        }
        self.model.destroy(gpu)
    }
}

pub struct ParticleSystemComponentFactory;

impl ParticleSystemComponentFactory {
    /// Wrap `factory` with a billboard quad and one instance buffer of
    /// `capacity` particles per frame in flight
    ///
    /// # Errors
    ///
    /// `InvalidResource` for a zero capacity.
    pub fn create(
        gpu: &mut dyn GpuResourceProvider,
        config: &EngineConfig,
        factory: Box<dyn ParticleFactory>,
        capacity: u32,
        particles_per_second: f32,
        seed: u64,
    ) -> Result<Shared<dyn ParticleSystemComponent>> {
        if capacity == 0 {
            engine_bail!("prev::ParticleSystem", @InvalidResource, "particle system needs a non-zero capacity");
        }
        let model = Model::upload(gpu, Arc::new(Mesh::quad(0.5)))?;
        let size = u64::from(capacity) * std::mem::size_of::<ParticleInstance>() as u64;
        let mut instance_buffers = Vec::with_capacity(config.frames_in_flight as usize);
        for frame in 0..config.frames_in_flight.max(1) {
            instance_buffers.push(gpu.create_buffer(&BufferDesc {
                name: format!("particle instances {}", frame),
                size,
                usage: BufferUsage::Instance,
            })?);
        }
        engine_debug!("prev::ParticleSystem", "{} particles/s, capacity {}", particles_per_second, capacity);

        Ok(shared(ParticleSystem::new(
            factory,
            model,
            instance_buffers,
            capacity,
            particles_per_second,
            config.particles_gravity,
            seed,
        )))
    }

    /// Slow, light-gravity puffs in every direction (atlas of 8 rows)
    pub fn create_random(
        gpu: &mut dyn GpuResourceProvider,
        config: &EngineConfig,
        material: Material,
        seed: u64,
    ) -> Result<Shared<dyn ParticleSystemComponent>> {
        let material = Material { atlas_rows: 8, ..material };
        let params = EmissionParams::new(0.1, 5.0, 4.0, 10.0).with_random_rotation();
        let factory = RandomDirectionParticleFactory::new(material, params, seed);
        Self::create(gpu, config, Box::new(factory), 1000, 10.0, seed.wrapping_add(1))
    }

    /// Dense fountain inside a cone of `deviation_degrees` around
    /// `direction` (atlas of 4 rows)
    pub fn create_random_in_cone(
        gpu: &mut dyn GpuResourceProvider,
        config: &EngineConfig,
        material: Material,
        direction: Vec3,
        deviation_degrees: f32,
        seed: u64,
    ) -> Result<Shared<dyn ParticleSystemComponent>> {
        let material = Material { atlas_rows: 4, ..material };
        let params = EmissionParams::new(-0.1, 4.0, 4.0, 7.0)
            .with_errors(0.5, 1.0, 2.0)
            .with_random_rotation()
            .with_radius(10.0);
        let factory = RandomInConeParticleFactory::new(material, params, direction, deviation_degrees, seed);
        Self::create(gpu, config, Box::new(factory), 10_000, 100.0, seed.wrapping_add(1))
    }
}

/// Emitter node behaviour: updates the node's particle system around the
/// node's world position
#[derive(Debug, Default)]
pub struct ParticleSystemBehavior;

impl NodeBehavior for ParticleSystemBehavior {
    fn name(&self) -> &str {
        "ParticleSystem"
    }

    fn update(&mut self, ctx: &mut NodeContext<'_>, delta_time: f32) -> Result<()> {
        let transform = helper::get_component::<dyn TransformComponent>(ctx.graph, ctx.node)?;
        let system = helper::get_component::<dyn ParticleSystemComponent>(ctx.graph, ctx.node)?;
        let center = transform.borrow().world_transform().w_axis.truncate();
        system.borrow_mut().update(delta_time, center);
        Ok(())
    }
}

#[cfg(test)]
#[path = "particle_tests.rs"]
mod tests;
