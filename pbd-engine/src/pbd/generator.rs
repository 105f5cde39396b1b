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
//! Per-frame constraint generators

use crate::ecs::{Components, EntityId};
use crate::pbd::{Constraint, PbdParticle};

/// Source of transient constraints
///
/// Generators run once per collidable particle per frame, after prediction.
/// Whatever they emit is solved together with the persistent constraints
/// and discarded at the end of the frame.
pub trait ConstraintGenerator: Send {
    /// Append constraints for `particle` to `out`
    ///
    /// `neighbors` holds the collidable particles in the 3x3 cell block
    /// around `particle`, including `particle` itself.
    fn generate(
        &mut self,
        particle: EntityId,
        neighbors: &[EntityId],
        components: &Components,
        out: &mut Vec<Constraint>,
    );

    /// Get a descriptive name for this generator
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Emits a non-penetration constraint for every nearby pair
///
/// Each unordered pair is produced once, from its lower id, with a rest
/// distance equal to the sum of the radii. Pairs that are already apart
/// still get a constraint; the solver skips it while it is satisfied.
#[derive(Debug, Default, Clone, Copy)]
pub struct CollisionConstraintGenerator;

impl CollisionConstraintGenerator {
    /// Create the generator
    pub fn new() -> Self {
        CollisionConstraintGenerator
    }
}

impl ConstraintGenerator for CollisionConstraintGenerator {
    fn generate(
        &mut self,
        particle: EntityId,
        neighbors: &[EntityId],
        components: &Components,
        out: &mut Vec<Constraint>,
    ) {
        let radius = components.get::<PbdParticle>(particle).radius;

        for &neighbor in neighbors {
            if particle >= neighbor {
                continue;
            }
            let other = components.get::<PbdParticle>(neighbor);
            if !other.is_collidable() {
                continue;
            }
            out.push(Constraint::collision(particle, neighbor, radius + other.radius));
        }
    }
}
