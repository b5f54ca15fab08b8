mod common;

use compute_particles::simulation::SPAWN_REGION_RADIUS;
use compute_particles::{
    ConfigError, FramePhase, Particle, ParticleError, ParticleManager, ParticlePrograms, ProtocolViolation,
    SimulationParameters,
};
use glam::Vec2;

use common::{TARGET_FORMAT, frame, gpu, render, target};

fn init(device: &wgpu::Device, params: SimulationParameters, seed: u64) -> ParticleManager {
    let mut manager = ParticleManager::with_seed(seed);
    manager
        .init(device, ParticlePrograms::compile(device), TARGET_FORMAT, params)
        .unwrap();
    manager
}

fn active_count(particles: &[Particle]) -> usize {
    particles.iter().filter(|p| p.is_active()).count()
}

fn assert_protocol(result: Result<impl std::fmt::Debug, ParticleError>, expected: ProtocolViolation) {
    match result {
        Err(ParticleError::ProtocolViolation(violation)) => assert_eq!(violation, expected),
        other => panic!("expected {:?}, got {:?}", expected, other),
    }
}

#[test]
fn init_uploads_an_active_population_on_the_spawn_disc() {
    let Some((device, queue)) = gpu() else { return };
    let center = Vec2::new(0.3, -0.2);
    let params = SimulationParameters::new(1_000, 20, center, 0.9, 0.1, 0.4).unwrap();
    let manager = init(&device, params, 1);

    assert!(manager.is_initialized());
    assert_eq!(manager.phase(), Some(FramePhase::Idle));
    assert_eq!(manager.capacity(), Some(1_000));
    assert_eq!(manager.workgroups(), Some(4));

    let particles = manager.read_particles(&device, &queue).unwrap();
    assert_eq!(particles.len(), 1_000);
    for particle in &particles {
        assert!(particle.is_active());
        assert!(particle.position().distance(center) <= SPAWN_REGION_RADIUS + 1e-5);
    }
}

#[test]
fn update_integrates_in_bounds_particles() {
    let Some((device, queue)) = gpu() else { return };
    let view = target(&device);
    // Nothing can leave a radius this large in one step
    let params = SimulationParameters::new(700, 10, Vec2::ZERO, 10.0, 0.1, 0.5).unwrap();
    let mut manager = init(&device, params, 2);

    let before = manager.read_particles(&device, &queue).unwrap();
    assert_eq!(frame(&mut manager, &device, &queue, &view, 0.25), 700);
    let after = manager.read_particles(&device, &queue).unwrap();

    for (old, new) in before.iter().zip(&after) {
        let expected = old.position() + old.velocity() * 0.25;
        assert!((new.position() - expected).length() < 1e-4);
        assert_eq!(new.velocity(), old.velocity());
        assert!(new.is_active());
    }
}

#[test]
fn recycling_respects_the_per_frame_quota() {
    let Some((device, queue)) = gpu() else { return };
    let view = target(&device);
    let params = SimulationParameters::new(4_096, 100, Vec2::ZERO, 0.2, 1.0, 1.0).unwrap();
    let mut manager = init(&device, params, 3);

    // First step carries every particle well past the kill radius
    frame(&mut manager, &device, &queue, &view, 1.0);
    let escaped = manager.read_particles(&device, &queue).unwrap();
    assert!(escaped.iter().all(|p| p.position().length() > 0.2));

    // Second step finds all of them out of bounds, but only 100 may respawn
    frame(&mut manager, &device, &queue, &view, 1.0);
    let particles = manager.read_particles(&device, &queue).unwrap();
    assert_eq!(active_count(&particles), 100);
    for particle in particles.iter().filter(|p| p.is_active()) {
        assert!(particle.position().length() <= SPAWN_REGION_RADIUS + 1e-5);
    }

    // Deactivated particles stay where they froze and take later slots
    frame(&mut manager, &device, &queue, &view, 0.0);
    let particles = manager.read_particles(&device, &queue).unwrap();
    assert_eq!(active_count(&particles), 200);
}

#[test]
fn still_particle_is_drawn_in_place_every_frame() {
    let Some((device, queue)) = gpu() else { return };
    let view = target(&device);
    let params = SimulationParameters::new(1, 1, Vec2::ZERO, 1.0, 0.0, 0.0).unwrap();
    let mut manager = init(&device, params, 4);
    let start = manager.read_particles(&device, &queue).unwrap()[0];

    for _ in 0..50 {
        assert_eq!(frame(&mut manager, &device, &queue, &view, 0.016), 1);
    }

    let particles = manager.read_particles(&device, &queue).unwrap();
    assert_eq!(particles.len(), 1);
    assert_eq!(particles[0].position(), start.position());
    assert!(particles[0].is_active());
}

#[test]
fn zero_quota_drains_the_pool() {
    let Some((device, queue)) = gpu() else { return };
    let view = target(&device);
    let params = SimulationParameters::new(1_000, 0, Vec2::ZERO, 0.5, 0.2, 0.4).unwrap();
    let mut manager = init(&device, params, 5);

    let mut active = 1_000;
    for _ in 0..40 {
        frame(&mut manager, &device, &queue, &view, 0.1);
        let now = active_count(&manager.read_particles(&device, &queue).unwrap());
        assert!(now <= active);
        active = now;
    }
    assert_eq!(active, 0);
}

#[test]
fn frame_protocol_is_enforced() {
    let Some((device, queue)) = gpu() else { return };
    let view = target(&device);
    let params = SimulationParameters::new(64, 4, Vec2::ZERO, 0.5, 0.1, 0.2).unwrap();
    let mut manager = init(&device, params, 6);

    assert_protocol(render(&mut manager, &device, &queue, &view), ProtocolViolation::RenderBeforeUpdate);
    assert_protocol(manager.update(&device, &queue, -1.0), ProtocolViolation::InvalidDeltaTime(-1.0));
    assert!(matches!(
        manager.update(&device, &queue, f32::NAN),
        Err(ParticleError::ProtocolViolation(ProtocolViolation::InvalidDeltaTime(_)))
    ));

    manager.update(&device, &queue, 0.016).unwrap();
    assert_eq!(manager.phase(), Some(FramePhase::Updated));
    assert_protocol(manager.update(&device, &queue, 0.016), ProtocolViolation::UpdateBeforeRender);

    // The same state may be drawn more than once
    assert_eq!(render(&mut manager, &device, &queue, &view).unwrap(), 64);
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
    assert_eq!(manager.render_to(&mut encoder, &view, None).unwrap(), 64);
    queue.submit([encoder.finish()]);
    assert_eq!(manager.phase(), Some(FramePhase::Rendered));

    assert_protocol(
        manager.init(&device, ParticlePrograms::compile(&device), TARGET_FORMAT, params),
        ProtocolViolation::AlreadyInitialized,
    );
}

#[test]
fn cleanup_releases_and_allows_reinit() {
    let Some((device, queue)) = gpu() else { return };
    let view = target(&device);
    let params = SimulationParameters::new(256, 8, Vec2::new(-0.5, 0.5), 0.6, 0.1, 0.3).unwrap();
    let programs = ParticlePrograms::compile(&device);
    let mut manager = ParticleManager::with_seed(7);
    manager.init(&device, programs.clone(), TARGET_FORMAT, params).unwrap();
    frame(&mut manager, &device, &queue, &view, 0.016);

    manager.cleanup().unwrap();
    assert!(!manager.is_initialized());
    assert_eq!(manager.phase(), None);
    assert_protocol(manager.cleanup(), ProtocolViolation::AlreadyReleased);
    assert_protocol(manager.update(&device, &queue, 0.016), ProtocolViolation::AlreadyReleased);
    assert_protocol(render(&mut manager, &device, &queue, &view), ProtocolViolation::AlreadyReleased);
    assert_protocol(manager.read_particles(&device, &queue), ProtocolViolation::AlreadyReleased);

    // Program handles are shared, so the caller's copy still builds a new pool
    manager.init(&device, programs, TARGET_FORMAT, params).unwrap();
    assert_eq!(manager.capacity(), Some(256));
    let particles = manager.read_particles(&device, &queue).unwrap();
    assert_eq!(particles.len(), 256);
    assert!(particles.iter().all(|p| p.is_active()
        && p.position().distance(params.emitter_center()) <= SPAWN_REGION_RADIUS + 1e-5));
    assert_eq!(frame(&mut manager, &device, &queue, &view, 0.016), 256);
}

#[test]
fn capacity_beyond_adapter_limits_is_rejected_before_allocation() {
    let Some((device, _queue)) = gpu() else { return };
    let params = SimulationParameters::new(u32::MAX, 1, Vec2::ZERO, 1.0, 0.1, 0.2).unwrap();
    let mut manager = ParticleManager::new();

    let result = manager.init(&device, ParticlePrograms::compile(&device), TARGET_FORMAT, params);
    assert!(matches!(
        result,
        Err(ParticleError::Configuration(ConfigError::PlatformLimitExceeded { .. }))
    ));
    assert!(!manager.is_initialized());
    assert!(manager.cleanup().is_ok());
}

#[test]
fn failed_init_leaves_nothing_behind() {
    let Some((device, queue)) = gpu() else { return };
    let view = target(&device);
    let params = SimulationParameters::new(128, 4, Vec2::ZERO, 0.5, 0.1, 0.2).unwrap();
    let programs = ParticlePrograms {
        update_entry: "no_such_entry",
        ..ParticlePrograms::compile(&device)
    };
    let mut manager = ParticleManager::with_seed(8);

    let result = manager.init(&device, programs, TARGET_FORMAT, params);
    match result {
        Err(ParticleError::InvalidProgram(message)) => assert!(message.contains("no_such_entry")),
        other => panic!("expected an invalid program error, got {:?}", other),
    }
    assert!(!manager.is_initialized());
    assert_eq!(manager.phase(), None);
    assert_protocol(manager.update(&device, &queue, 0.016), ProtocolViolation::NotInitialized);
    assert!(manager.cleanup().is_ok());

    // The same manager still initializes with valid programs
    manager
        .init(&device, ParticlePrograms::compile(&device), TARGET_FORMAT, params)
        .unwrap();
    assert_eq!(frame(&mut manager, &device, &queue, &view, 0.016), 128);
}
