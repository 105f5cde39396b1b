// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Particles in a Round Container
//!
//! A handful of particles fall under gravity inside a circular container.
//! The container is a static, zero-radius marker at the centre; each
//! particle is tethered to it by an inverse-inequality distance constraint,
//! so it may move freely inside the circle but never beyond it. Particles
//! collide with each other through the collision constraint generator.
//!
//! # Running
//!
//! ```bash
//! RUST_LOG=info cargo run --example particle_box
//!
//! # Show per-frame profiler output
//! RUST_LOG=trace cargo run --example particle_box
//! ```

use glam::Vec2;
use pbd_engine::ecs::components::Transform;
use pbd_engine::ecs::{EntityId, World};
use pbd_engine::pbd::{
    CollisionConstraintGenerator, ConstraintKind, DistanceConstraint, PbdConfig, PbdParticle,
    PbdSystem,
};
use pbd_engine::render::LineRecorder;
use std::sync::{Arc, Mutex};

const CONTAINER_RADIUS: f32 = 10.0;
const PARTICLE_RADIUS: f32 = 0.5;
const PARTICLE_COUNT: usize = 24;
const FRAMES: usize = 300;
const DT: f32 = 1.0 / 60.0;

fn spawn(world: &mut World, particle: PbdParticle) -> EntityId {
    let entity = world.create_entity();
    *world.add_component::<PbdParticle>(entity) = particle;
    world.add_component::<Transform>(entity);
    entity
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = PbdConfig::default()
        .with_grid_cell_size(PARTICLE_RADIUS * 2.0)
        .with_solver_iterations(8)
        .with_debug_draw(true);
    let mut system =
        PbdSystem::new(config)?.with_constraint_generator(CollisionConstraintGenerator::new());

    let mut world = World::new();
    let lines = Arc::new(Mutex::new(LineRecorder::new()));
    world.set_renderer(Arc::clone(&lines));
    world.profiler_mut().set_enabled(true);

    let centre = spawn(
        &mut world,
        PbdParticle::new(Vec2::ZERO).with_radius(0.0).make_static(),
    );

    // Loose grid in the upper half of the container
    let mut particles = Vec::with_capacity(PARTICLE_COUNT);
    for i in 0..PARTICLE_COUNT {
        let column = (i % 6) as f32;
        let row = (i / 6) as f32;
        let position = Vec2::new(-3.0 + column * 1.2, -6.0 + row * 1.2);
        let mass = if i % 4 == 0 { 2.0 } else { 1.0 };
        let entity = spawn(
            &mut world,
            PbdParticle::new(position)
                .with_radius(PARTICLE_RADIUS)
                .with_mass(mass),
        );
        system.add_constraint(
            vec![centre, entity],
            ConstraintKind::InverseInequality,
            DistanceConstraint::new(CONTAINER_RADIUS - PARTICLE_RADIUS),
        )?;
        particles.push(entity);
    }

    world.register_system(system)?;

    println!("=== Particles in a Round Container ===");
    println!("Particles: {}", PARTICLE_COUNT);
    println!("Container radius: {}", CONTAINER_RADIUS);
    println!("Frames: {} at dt = {:.4}", FRAMES, DT);
    println!();

    for frame in 0..FRAMES {
        if let Ok(mut recorder) = lines.lock() {
            recorder.clear();
        }
        world.update_systems(DT);

        if frame % 60 == 0 {
            let deepest = particles
                .iter()
                .map(|&e| world.component::<Transform>(e).position.y)
                .fold(f32::MIN, f32::max);
            let line_count = lines.lock().map(|r| r.lines.len()).unwrap_or(0);
            let solve = world.profiler().last("pbd.solve").unwrap_or_default();
            println!(
                "frame {:>3}: deepest y = {:>7.3}, debug lines = {:>4}, solve = {:?}",
                frame, deepest, line_count, solve
            );
        }
    }

    println!();
    println!("Final positions:");
    for &entity in &particles {
        let position = world.component::<Transform>(entity).position;
        let distance = position.truncate().length();
        println!(
            "  {}: ({:>7.3}, {:>7.3})  |r| = {:.3}",
            entity, position.x, position.y, distance
        );
    }

    if let Some(pbd) = world.system::<PbdSystem>() {
        let stats = pbd.stats();
        println!();
        println!("Frames simulated: {}", stats.frames);
        println!("Generated constraints (last frame): {}", stats.generated_constraints);
        println!("Projections (last frame): {}", stats.solve.projections);
    }

    Ok(())
}
