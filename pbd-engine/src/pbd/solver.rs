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
//! Gauss-Seidel constraint projection
//!
//! Each pass walks the constraint list in order. For every constraint the
//! bound particles are gathered, the constraint is linearised around their
//! current positions and every particle is moved along its gradient,
//! weighted by inverse mass:
//!
//! ```text
//! s     = C(p) / sum_j(w_j * |grad_j C|^2)
//! dp_j  = -s * w_j * grad_j C
//! p_j  += k' * dp_j        with k' = 1 - (1 - k)^n
//! ```
//!
//! Corrections are written back before the next constraint is visited, so
//! later constraints see earlier corrections within the same pass.

use crate::ecs::{Components, EntityId};
use crate::pbd::{Constraint, PbdParticle};
use glam::Vec2;

/// Counters from one call to [`GaussSeidelSolver::solve`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolveStats {
    /// Constraints whose particles were moved
    pub projections: usize,
    /// Constraints skipped because every gradient was zero or every particle static
    pub skipped_degenerate: usize,
    /// Constraints skipped because they were already satisfied
    pub skipped_satisfied: usize,
    /// Constraints skipped because a bound entity has no particle
    pub skipped_missing: usize,
}

/// Fixed-iteration Gauss-Seidel solver
#[derive(Debug, Default)]
pub struct GaussSeidelSolver {
    particles: Vec<PbdParticle>,
    gradients: Vec<Vec2>,
}

impl GaussSeidelSolver {
    /// Create a solver with empty scratch buffers
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `iterations` passes over `constraints`
    pub fn solve(
        &mut self,
        iterations: usize,
        constraints: &[Constraint],
        components: &mut Components,
    ) -> SolveStats {
        let mut stats = SolveStats::default();
        let Some(storage) = components.storage_mut::<PbdParticle>() else {
            return stats;
        };

        for _ in 0..iterations {
            for constraint in constraints {
                if !self.gather(constraint.entities(), |e| storage.get(e).copied()) {
                    stats.skipped_missing += 1;
                    continue;
                }

                self.gradients.clear();
                let mut denominator = 0.0;
                for (index, particle) in self.particles.iter().enumerate() {
                    let gradient = constraint.gradient(index, &self.particles);
                    denominator += particle.invmass * gradient.length_squared();
                    self.gradients.push(gradient);
                }
                if denominator == 0.0 {
                    stats.skipped_degenerate += 1;
                    continue;
                }

                let error = constraint.value(&self.particles);
                if !constraint.kind().needs_projection(error) {
                    stats.skipped_satisfied += 1;
                    continue;
                }

                let scale = error / denominator;
                let stiffness = constraint.corrected_stiffness();
                for (index, &entity) in constraint.entities().iter().enumerate() {
                    let delta = -scale * self.particles[index].invmass * self.gradients[index];
                    if let Some(particle) = storage.get_mut(entity) {
                        particle.position += stiffness * delta;
                    }
                }
                stats.projections += 1;
            }
        }
        stats
    }

    /// Copy the bound particles into the scratch buffer
    fn gather(
        &mut self,
        entities: &[EntityId],
        mut lookup: impl FnMut(EntityId) -> Option<PbdParticle>,
    ) -> bool {
        self.particles.clear();
        for &entity in entities {
            match lookup(entity) {
                Some(particle) => self.particles.push(particle),
                None => return false,
            }
        }
        true
    }
}
