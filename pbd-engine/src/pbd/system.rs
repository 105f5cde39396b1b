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
//! The position-based dynamics system
//!
//! Every frame runs, in order:
//!
//! 1. external forces into velocities, frame start snapshot
//! 2. velocity damping
//! 3. position prediction
//! 4. transient constraint generation from grid neighbourhoods
//! 5. Gauss-Seidel projection of persistent and transient constraints
//! 6. velocities from the corrected displacement
//! 7. transform write-back
//! 8. transient constraints dropped
//!
//! Every step that moves a particle re-files it under its new grid cell
//! before anything else reads the grid.

use crate::ecs::components::Transform;
use crate::ecs::{Components, EntityId, Signature, System, SystemContext};
use crate::error::{EcsResult, PbdResult};
use crate::pbd::{
    Constraint, ConstraintFunction, ConstraintGenerator, ConstraintKind, ForceField, ForceFields,
    CellCoord, GaussSeidelSolver, Gravity, PbdConfig, PbdParticle, SolveStats, SpatialGrid,
};
use crate::render::{Color, DebugRenderer};
use glam::Vec2;
use std::collections::HashMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Thickness of neighbourhood debug lines
const DEBUG_LINE_THICKNESS: f32 = 0.1;

/// Counters from the most recent frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PbdStats {
    /// Frames simulated so far
    pub frames: u64,
    /// Frames skipped because of an invalid time step
    pub skipped_frames: u64,
    /// Particles simulated last frame
    pub particles: usize,
    /// Persistent constraints solved last frame
    pub persistent_constraints: usize,
    /// Constraints emitted by generators last frame
    pub generated_constraints: usize,
    /// Solver counters from last frame
    pub solve: SolveStats,
}

/// Particle simulation driven by positional constraints
///
/// Members are entities carrying both a [`PbdParticle`] and a [`Transform`].
///
/// # Example
///
/// ```
/// use pbd_engine::ecs::World;
/// use pbd_engine::ecs::components::Transform;
/// use pbd_engine::pbd::{CollisionConstraintGenerator, PbdConfig, PbdParticle, PbdSystem};
/// use glam::Vec2;
///
/// let config = PbdConfig::default().with_gravity(Vec2::ZERO);
/// let system = PbdSystem::new(config)
///     .unwrap()
///     .with_constraint_generator(CollisionConstraintGenerator::new());
///
/// let mut world = World::new();
/// world.register_system(system).unwrap();
///
/// for x in [0.0, 1.5] {
///     let entity = world.create_entity();
///     *world.add_component::<PbdParticle>(entity) = PbdParticle::new(Vec2::new(x, 0.0));
///     world.add_component::<Transform>(entity);
/// }
///
/// world.update_systems(1.0 / 60.0);
/// let stats = world.system::<PbdSystem>().unwrap().stats();
/// assert_eq!(stats.generated_constraints, 1);
/// ```
pub struct PbdSystem {
    config: PbdConfig,
    grid: SpatialGrid,
    pending_cell_size: Option<f32>,
    /// Cell each member is filed under in `grid`
    homes: HashMap<EntityId, CellCoord>,
    /// Persistent constraints first, transient ones after `persistent_len`
    constraints: Vec<Constraint>,
    persistent_len: usize,
    generators: Vec<Box<dyn ConstraintGenerator>>,
    forces: ForceFields,
    solver: GaussSeidelSolver,
    neighbors: Vec<EntityId>,
    stats: PbdStats,
}

impl PbdSystem {
    /// Create a system from a validated configuration
    ///
    /// Non-zero gravity is registered as the first force field.
    pub fn new(config: PbdConfig) -> PbdResult<Self> {
        config.validate()?;

        let mut forces = ForceFields::new();
        if config.gravity != Vec2::ZERO {
            forces.register(Box::new(Gravity::new(config.gravity)));
        }

        Ok(PbdSystem {
            grid: SpatialGrid::new(config.grid_cell_size)?,
            config,
            pending_cell_size: None,
            homes: HashMap::new(),
            constraints: Vec::new(),
            persistent_len: 0,
            generators: Vec::new(),
            forces,
            solver: GaussSeidelSolver::new(),
            neighbors: Vec::new(),
            stats: PbdStats::default(),
        })
    }

    /// Add a generator, builder style
    pub fn with_constraint_generator<G: ConstraintGenerator + 'static>(mut self, generator: G) -> Self {
        self.register_constraint_generator(generator);
        self
    }

    /// Add a generator; generators run in registration order
    pub fn register_constraint_generator<G: ConstraintGenerator + 'static>(&mut self, generator: G) {
        log::debug!("registered constraint generator {}", generator.name());
        self.generators.push(Box::new(generator));
    }

    /// Add a force field; fields are summed in registration order
    pub fn register_force_field<F: ForceField + 'static>(&mut self, field: F) {
        self.forces.register(Box::new(field));
    }

    /// Bind `function` to `entities` as a persistent constraint
    pub fn add_constraint<F>(
        &mut self,
        entities: Vec<EntityId>,
        kind: ConstraintKind,
        function: F,
    ) -> PbdResult<&mut Constraint>
    where
        F: ConstraintFunction + 'static,
    {
        let constraint = Constraint::new(entities, kind, function)?;
        Ok(self.add_persistent(constraint))
    }

    /// Keep `constraint` until one of its particles leaves the system
    pub fn add_persistent(&mut self, constraint: Constraint) -> &mut Constraint {
        let index = self.persistent_len;
        self.constraints.insert(index, constraint);
        self.persistent_len += 1;
        &mut self.constraints[index]
    }

    /// Change the number of solver passes per frame
    pub fn set_solver_iterations(&mut self, iterations: usize) {
        self.config.solver_iterations = iterations;
    }

    /// Change the grid cell size
    ///
    /// Particles are re-filed under the new cells at the start of the next frame.
    pub fn set_grid_cell_size(&mut self, size: f32) -> PbdResult<()> {
        SpatialGrid::new(size)?;
        self.config.grid_cell_size = size;
        self.pending_cell_size = Some(size);
        Ok(())
    }

    /// Turn neighbourhood debug lines on or off
    pub fn set_debug_draw(&mut self, enabled: bool) {
        self.config.debug_draw = enabled;
    }

    /// Persistent constraints (transient ones only exist during a frame)
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints[..self.persistent_len]
    }

    /// Spatial index of the members
    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    /// Current configuration
    pub fn config(&self) -> &PbdConfig {
        &self.config
    }

    /// Counters from the most recent frame
    pub fn stats(&self) -> &PbdStats {
        &self.stats
    }

    /// Step 1: forces into velocities, frame start snapshot
    fn apply_external_forces(&mut self, components: &mut Components, members: &[EntityId], dt: f32) {
        if let Some(size) = self.pending_cell_size.take() {
            match SpatialGrid::new(size) {
                Ok(grid) => {
                    log::debug!("rebuilding spatial grid with cell size {}", size);
                    // Re-homing below files every member under the new cells
                    self.grid = grid;
                    self.homes.clear();
                }
                Err(e) => log::warn!("keeping spatial grid: {}", e),
            }
        }

        for &entity in members {
            let particle = components.get_mut::<PbdParticle>(entity);
            if particle.invmass != 0.0 && particle.mass > 0.0 {
                particle.invmass = 1.0 / particle.mass;
            }
            let force = self.forces.accumulate(entity, particle);
            particle.velocity += dt * particle.invmass * force;

            // Picks up positions moved from outside the solver
            rehome(&mut self.grid, &mut self.homes, entity, particle);
            particle.old_position = particle.position;
        }
    }

    /// Step 2
    fn damp_velocities(&self, components: &mut Components, members: &[EntityId]) {
        if self.config.damping == 0.0 {
            return;
        }
        let keep = 1.0 - self.config.damping;
        for &entity in members {
            components.get_mut::<PbdParticle>(entity).velocity *= keep;
        }
    }

    /// Step 3
    fn predict_positions(&mut self, components: &mut Components, members: &[EntityId], dt: f32) {
        for &entity in members {
            let particle = components.get_mut::<PbdParticle>(entity);
            particle.position += dt * particle.velocity;
            rehome(&mut self.grid, &mut self.homes, entity, particle);
        }
    }

    /// Step 4; `members` must be sorted
    fn generate_constraints(&mut self, components: &Components, members: &[EntityId]) {
        self.persistent_len = self.constraints.len();

        #[cfg(feature = "parallel")]
        {
            let grid = &self.grid;
            let neighborhoods: Vec<Vec<EntityId>> = members
                .par_iter()
                .map(|&entity| {
                    let mut neighbors = Vec::new();
                    collidable_neighbors(grid, components, entity, &mut neighbors);
                    neighbors
                })
                .collect();

            for (&entity, neighbors) in members.iter().zip(&neighborhoods) {
                if neighbors.is_empty() {
                    continue;
                }
                for generator in self.generators.iter_mut() {
                    generator.generate(entity, neighbors, components, &mut self.constraints);
                }
            }
        }

        #[cfg(not(feature = "parallel"))]
        {
            let mut neighbors = std::mem::take(&mut self.neighbors);
            for &entity in members {
                neighbors.clear();
                collidable_neighbors(&self.grid, components, entity, &mut neighbors);
                if neighbors.is_empty() {
                    continue;
                }
                for generator in self.generators.iter_mut() {
                    generator.generate(entity, &neighbors, components, &mut self.constraints);
                }
            }
            self.neighbors = neighbors;
        }
    }

    /// Step 6
    fn update_velocities(&mut self, components: &mut Components, members: &[EntityId], dt: f32) {
        for &entity in members {
            let particle = components.get_mut::<PbdParticle>(entity);
            particle.velocity = (particle.position - particle.old_position) / dt;
            rehome(&mut self.grid, &mut self.homes, entity, particle);
        }
    }

    /// Step 7
    fn sync_transforms(components: &mut Components, members: &[EntityId]) {
        for &entity in members {
            let position = components.get::<PbdParticle>(entity).position;
            components.get_mut::<Transform>(entity).position = position.extend(0.0);
        }
    }

    /// Lines from every collidable particle to everything in its neighbourhood
    fn draw_neighborhoods(
        &mut self,
        components: &Components,
        renderer: &mut dyn DebugRenderer,
        members: &[EntityId],
    ) {
        for &entity in members {
            let particle = components.get::<PbdParticle>(entity);
            if !particle.is_collidable() {
                continue;
            }
            self.neighbors.clear();
            self.grid.surrounding(particle.position, &mut self.neighbors);
            for &neighbor in &self.neighbors {
                let Some(other) = components.try_get::<PbdParticle>(neighbor) else {
                    continue;
                };
                renderer.draw_line(
                    other.position.extend(0.0),
                    particle.position.extend(0.0),
                    Color::WHITE,
                    DEBUG_LINE_THICKNESS,
                );
            }
        }
    }
}

/// File `entity` under the cell of its current position
///
/// The previous cell comes from `homes`, never from the particle, so a
/// particle overwritten from outside the system cannot leave a stale entry.
fn rehome(
    grid: &mut SpatialGrid,
    homes: &mut HashMap<EntityId, CellCoord>,
    entity: EntityId,
    particle: &mut PbdParticle,
) {
    let cell = grid.cell_of(particle.position);
    if let Some(previous) = homes.insert(entity, cell) {
        if previous != cell {
            grid.remove_from(previous, entity);
        }
    }
    grid.insert_into(cell, entity);
    particle.temp_position = particle.position;
}

/// Collidable particles around `entity`, or nothing if `entity` itself is not collidable
fn collidable_neighbors(
    grid: &SpatialGrid,
    components: &Components,
    entity: EntityId,
    out: &mut Vec<EntityId>,
) {
    let particle = components.get::<PbdParticle>(entity);
    if !particle.is_collidable() {
        return;
    }
    grid.surrounding(particle.position, out);
    out.retain(|&neighbor| {
        components
            .try_get::<PbdParticle>(neighbor)
            .map_or(false, PbdParticle::is_collidable)
    });
}

impl System for PbdSystem {
    fn required_components(&self, components: &mut Components) -> EcsResult<Signature> {
        components.signature_of::<(PbdParticle, Transform)>()
    }

    fn start(&mut self, _ctx: &mut SystemContext<'_>) {
        log::debug!(
            "PBD system started: {} solver iterations, cell size {}, {} generators",
            self.config.solver_iterations,
            self.config.grid_cell_size,
            self.generators.len()
        );
    }

    fn awake(&mut self, ctx: &mut SystemContext<'_>, entity: EntityId) {
        let particle = ctx.components.get_mut::<PbdParticle>(entity);
        particle.old_position = particle.position;
        rehome(&mut self.grid, &mut self.homes, entity, particle);
    }

    fn update(&mut self, ctx: &mut SystemContext<'_>, members: &mut [EntityId], dt: f32) {
        if !(dt > 0.0 && dt.is_finite()) {
            log::warn!("PBD update skipped: invalid time step {}", dt);
            self.stats.skipped_frames += 1;
            return;
        }
        ctx.profiler.begin("pbd");

        self.apply_external_forces(ctx.components, members, dt);
        self.damp_velocities(ctx.components, members);
        self.predict_positions(ctx.components, members, dt);

        ctx.profiler.begin("pbd.generate");
        members.sort_unstable();
        self.generate_constraints(ctx.components, members);
        ctx.profiler.end("pbd.generate");

        ctx.profiler.begin("pbd.solve");
        let solve = self
            .solver
            .solve(self.config.solver_iterations, &self.constraints, ctx.components);
        ctx.profiler.end("pbd.solve");

        self.update_velocities(ctx.components, members, dt);
        Self::sync_transforms(ctx.components, members);

        self.stats.frames += 1;
        self.stats.particles = members.len();
        self.stats.persistent_constraints = self.persistent_len;
        self.stats.generated_constraints = self.constraints.len() - self.persistent_len;
        self.stats.solve = solve;
        self.constraints.truncate(self.persistent_len);

        if self.config.debug_draw {
            self.draw_neighborhoods(ctx.components, &mut *ctx.renderer, members);
        }

        ctx.profiler.end("pbd");
        log::trace!(
            "PBD frame {}: {} particles, {} generated constraints, {} projections",
            self.stats.frames,
            self.stats.particles,
            self.stats.generated_constraints,
            solve.projections
        );
    }

    fn remove(&mut self, _ctx: &mut SystemContext<'_>, entity: EntityId) {
        if let Some(cell) = self.homes.remove(&entity) {
            self.grid.remove_from(cell, entity);
        }

        let before = self.constraints.len();
        self.constraints.retain(|c| !c.involves(entity));
        self.persistent_len = self.constraints.len();
        if self.constraints.len() != before {
            log::debug!(
                "dropped {} constraints bound to {}",
                before - self.constraints.len(),
                entity
            );
        }
    }
}
