use glam::{Vec2, Vec3};
use crate::component::TransformComponentFactory;
use crate::config::EngineConfig;
use crate::error::Error;
use crate::render::RecordingGpu;
use crate::scene::tags::{TAG_PARTICLE_SYSTEM_COMPONENT, TAG_TRANSFORM_COMPONENT};
use crate::scene::SceneGraph;
use super::*;

fn test_config() -> EngineConfig {
    EngineConfig { frames_in_flight: 2, ..EngineConfig::default() }
}

/// Factory that emits identical particles at the centre
struct FixedFactory {
    material: Material,
    params: EmissionParams,
}

impl FixedFactory {
    fn boxed(life_length: f32) -> Box<dyn ParticleFactory> {
        Box::new(Self {
            material: Material { atlas_rows: 2, ..Material::default() },
            params: EmissionParams::new(0.0, 1.0, life_length, 1.0),
        })
    }
}

impl ParticleFactory for FixedFactory {
    fn material(&self) -> &Material {
        &self.material
    }

    fn params(&self) -> &EmissionParams {
        &self.params
    }

    fn emit(&mut self, center: Vec3) -> Particle {
        Particle::new(center, Vec3::Y, 0.0, self.params.average_life_length, 0.0, 1.0)
    }
}

// ============================================================================
// PARTICLE
// ============================================================================

#[test]
fn test_particle_moves_falls_and_dies() {
    let mut particle = Particle::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), 1.0, 2.0, 0.0, 1.0);
    particle.update(1.0, -10.0, 1);
    assert_eq!(particle.velocity(), Vec3::new(1.0, -10.0, 0.0));
    assert_eq!(particle.position(), Vec3::new(1.0, -10.0, 0.0));
    assert!(particle.is_alive());

    particle.update(1.0, -10.0, 1);
    assert!(!particle.is_alive());
}

#[test]
fn test_atlas_stage_follows_age() {
    // 2 x 2 atlas, 4 stages over a life of 4
    let mut particle = Particle::new(Vec3::ZERO, Vec3::ZERO, 0.0, 4.0, 0.0, 1.0);
    particle.update(1.5, 0.0, 2);

    let (current, next, blend) = particle.stage();
    assert_eq!(current, Vec2::new(0.5, 0.0));
    assert_eq!(next, Vec2::new(0.0, 0.5));
    assert!((blend - 0.5).abs() < 1e-6);

    particle.update(2.4, 0.0, 2);
    let (current, next, _) = particle.stage();
    assert_eq!(current, Vec2::new(0.5, 0.5));
    assert_eq!(next, current);
}

#[test]
fn test_instance_layout_is_tightly_packed() {
    assert_eq!(std::mem::size_of::<ParticleInstance>(), 48);
    let particle = Particle::new(Vec3::ONE, Vec3::ZERO, 0.0, 1.0, 45.0, 3.0);
    let instance = particle.instance();
    assert_eq!(instance.position, Vec3::ONE);
    assert_eq!(instance.scale, Vec2::splat(3.0));
    assert_eq!(instance.rotation, 45.0);
}

// ============================================================================
// FACTORIES
// ============================================================================

#[test]
fn test_cone_particles_stay_inside_the_cone() {
    let params = EmissionParams::new(0.0, 4.0, 4.0, 7.0).with_errors(0.5, 1.0, 2.0);
    let mut factory = RandomInConeParticleFactory::new(Material::default(), params, Vec3::new(0.0, 2.0, 0.0), 20.0, 7);
    assert_eq!(factory.direction(), Vec3::Y);

    let min_cos = 20f32.to_radians().cos() - 1e-4;
    for _ in 0..200 {
        let particle = factory.emit(Vec3::ZERO);
        let speed = particle.velocity().length();
        assert!((3.5 - 1e-4..=4.5 + 1e-4).contains(&speed));
        assert!(particle.velocity().normalize().dot(Vec3::Y) >= min_cos);
        assert!((3.0..=5.0).contains(&particle.life_length()));
        assert!((5.0..=9.0).contains(&particle.scale()));
    }
}

#[test]
fn test_cone_radius_offsets_across_the_axis() {
    let params = EmissionParams::new(0.0, 1.0, 1.0, 1.0).with_radius(10.0);
    let mut factory = RandomInConeParticleFactory::new(Material::default(), params, Vec3::Y, 5.0, 3);
    for _ in 0..50 {
        let start = factory.emit(Vec3::new(0.0, 5.0, 0.0)).position();
        assert!((start.y - 5.0).abs() < 1e-4);
        assert!(Vec2::new(start.x, start.z).length() <= 10.0 + 1e-4);
    }
}

#[test]
fn test_random_direction_is_seeded() {
    let params = EmissionParams::new(0.1, 5.0, 4.0, 10.0).with_random_rotation();
    let mut first = RandomDirectionParticleFactory::new(Material::default(), params, 42);
    let mut second = RandomDirectionParticleFactory::new(Material::default(), params, 42);
    for _ in 0..10 {
        let particle = first.emit(Vec3::ZERO);
        assert_eq!(particle, second.emit(Vec3::ZERO));
        assert!((particle.velocity().length() - 5.0).abs() < 1e-4);
        assert!((0.0..360.0).contains(&particle.rotation()));
    }
}

// ============================================================================
// SYSTEM
// ============================================================================

#[test]
fn test_emission_rate_and_expiry() {
    let mut gpu = RecordingGpu::default();
    let system = ParticleSystemComponentFactory::create(&mut gpu, &test_config(), FixedFactory::boxed(1.0), 100, 10.0, 1).unwrap();

    system.borrow_mut().update(0.5, Vec3::ZERO);
    assert_eq!(system.borrow().particle_count(), 5);

    system.borrow_mut().update(0.5, Vec3::ZERO);
    // the first five reached their life length of 1.0
    assert_eq!(system.borrow().particle_count(), 5);
    assert!(system.borrow().particles().iter().all(|p| p.elapsed_time() == 0.5));
}

#[test]
fn test_fractional_emission_averages_out() {
    let mut gpu = RecordingGpu::default();
    let system = ParticleSystemComponentFactory::create(&mut gpu, &test_config(), FixedFactory::boxed(1000.0), 1000, 0.5, 9).unwrap();

    for _ in 0..400 {
        system.borrow_mut().update(0.1, Vec3::ZERO);
    }
    // 0.05 expected per step, 20 in total
    let count = system.borrow().particle_count();
    assert!((5..=40).contains(&count), "emitted {}", count);
}

#[test]
fn test_capacity_caps_emission() {
    let mut gpu = RecordingGpu::default();
    let system = ParticleSystemComponentFactory::create(&mut gpu, &test_config(), FixedFactory::boxed(10.0), 8, 100.0, 1).unwrap();
    system.borrow_mut().update(1.0, Vec3::ZERO);
    assert_eq!(system.borrow().particle_count(), 8);
    assert_eq!(system.borrow().instances().len(), 8);
}

#[test]
fn test_instance_buffers_per_frame_in_flight() {
    let mut gpu = RecordingGpu::default();
    let system = ParticleSystemComponentFactory::create(&mut gpu, &test_config(), FixedFactory::boxed(1.0), 16, 1.0, 1).unwrap();

    let first = system.borrow().instance_buffer(0).unwrap();
    let second = system.borrow().instance_buffer(1).unwrap();
    assert_ne!(first, second);
    assert_eq!(system.borrow().instance_buffer(2), Some(first));
    assert_eq!(gpu.buffer_desc(first).unwrap().size, 16 * 48);

    system.borrow_mut().destroy(&mut gpu).unwrap();
    assert_eq!(gpu.live_resources(), 0);
    assert!(system.borrow().instance_buffer(0).is_none());
}

#[test]
fn test_zero_capacity_is_rejected() {
    let mut gpu = RecordingGpu::default();
    let result = ParticleSystemComponentFactory::create(&mut gpu, &test_config(), FixedFactory::boxed(1.0), 0, 1.0, 1);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_behavior_emits_at_node_position() {
    let mut gpu = RecordingGpu::default();
    let config = test_config();
    let mut graph = SceneGraph::new(config.clone());
    let emitter = graph.create_node_with("Fire", ParticleSystemBehavior);
    let transform = TransformComponentFactory::create_at(Vec3::new(4.0, 0.0, -2.0));
    transform.borrow_mut().update(0.0);
    helper::add_component(&mut graph, emitter, transform, TAG_TRANSFORM_COMPONENT).unwrap();
    let system = ParticleSystemComponentFactory::create(&mut gpu, &config, FixedFactory::boxed(5.0), 10, 2.0, 1).unwrap();
    helper::add_component(&mut graph, emitter, system.clone(), TAG_PARTICLE_SYSTEM_COMPONENT).unwrap();

    graph.init(emitter).unwrap();
    graph.update(emitter, 1.0).unwrap();

    let system = system.borrow();
    assert_eq!(system.particle_count(), 2);
    // emitted at the node, then moved up by one second of unit velocity
    assert_eq!(system.particles()[0].position(), Vec3::new(4.0, 1.0, -2.0));
}
