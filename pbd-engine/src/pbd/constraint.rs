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
//! Positional constraints
//!
//! A constraint binds a small ordered set of particles to a scalar function
//! `C(p_0, ..., p_{k-1})` and its per-particle gradient. The solver moves
//! the particles along the gradients until `C` reaches the target implied
//! by the constraint's [`ConstraintKind`].

use crate::ecs::EntityId;
use crate::error::{PbdError, PbdResult};
use crate::pbd::PbdParticle;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the solver treats the constraint value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// Drive the value to zero
    Equality,
    /// Keep the value non-negative; only negative values are corrected
    Inequality,
    /// Keep the value non-positive; only positive values are corrected
    InverseInequality,
}

impl ConstraintKind {
    /// Check if a constraint of this kind with the given value must be projected
    ///
    /// NaN values are never projected for the inequality kinds.
    pub fn needs_projection(&self, value: f32) -> bool {
        match self {
            ConstraintKind::Equality => true,
            ConstraintKind::Inequality => value < 0.0,
            ConstraintKind::InverseInequality => value > 0.0,
        }
    }
}

/// Scalar function over a fixed number of particles
///
/// `particles[i]` is the particle bound at position `i` of the owning
/// constraint. Implementations must return a zero gradient rather than NaN
/// for degenerate configurations.
pub trait ConstraintFunction: Send + Sync {
    /// Number of particles the function reads
    fn cardinality(&self) -> usize;

    /// Constraint value
    fn value(&self, particles: &[PbdParticle]) -> f32;

    /// Gradient of the value with respect to `particles[index].position`
    fn gradient(&self, index: usize, particles: &[PbdParticle]) -> Vec2;

    /// Name used in debug output
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Distance between two particles minus a rest length
///
/// As an [`ConstraintKind::Inequality`] this keeps particles at least
/// `distance` apart (collisions); as a
/// [`ConstraintKind::InverseInequality`] it keeps them at most `distance`
/// apart (tethers, containment); as an [`ConstraintKind::Equality`] it is a
/// rigid rod.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceConstraint {
    /// Rest length
    pub distance: f32,
}

impl DistanceConstraint {
    /// Create a distance function with the given rest length
    pub fn new(distance: f32) -> Self {
        DistanceConstraint { distance }
    }
}

impl ConstraintFunction for DistanceConstraint {
    fn cardinality(&self) -> usize {
        2
    }

    fn value(&self, particles: &[PbdParticle]) -> f32 {
        (particles[0].position - particles[1].position).length() - self.distance
    }

    fn gradient(&self, index: usize, particles: &[PbdParticle]) -> Vec2 {
        let direction = (particles[0].position - particles[1].position).normalize_or_zero();
        if index == 0 {
            direction
        } else {
            -direction
        }
    }
}

/// Distance from a particle to a fixed point
///
/// As an equality this pins the particle onto `target`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorConstraint {
    /// Anchor point
    pub target: Vec2,
}

impl AnchorConstraint {
    /// Create an anchor at `target`
    pub fn new(target: Vec2) -> Self {
        AnchorConstraint { target }
    }
}

impl ConstraintFunction for AnchorConstraint {
    fn cardinality(&self) -> usize {
        1
    }

    fn value(&self, particles: &[PbdParticle]) -> f32 {
        (particles[0].position - self.target).length()
    }

    fn gradient(&self, _index: usize, particles: &[PbdParticle]) -> Vec2 {
        (particles[0].position - self.target).normalize_or_zero()
    }
}

/// A constraint function bound to concrete entities
pub struct Constraint {
    entities: Vec<EntityId>,
    stiffness: f32,
    kind: ConstraintKind,
    function: Box<dyn ConstraintFunction>,
}

impl Constraint {
    /// Bind `function` to `entities` with stiffness 1
    ///
    /// Fails if the number of entities differs from the function's cardinality.
    pub fn new<F>(entities: Vec<EntityId>, kind: ConstraintKind, function: F) -> PbdResult<Self>
    where
        F: ConstraintFunction + 'static,
    {
        if entities.len() != function.cardinality() {
            return Err(PbdError::CardinalityMismatch {
                expected: function.cardinality(),
                actual: entities.len(),
            });
        }
        Ok(Constraint {
            entities,
            stiffness: 1.0,
            kind,
            function: Box::new(function),
        })
    }

    /// Non-penetration constraint keeping `a` and `b` at least `distance` apart
    pub fn collision(a: EntityId, b: EntityId, distance: f32) -> Self {
        Constraint {
            entities: vec![a, b],
            stiffness: 1.0,
            kind: ConstraintKind::Inequality,
            function: Box::new(DistanceConstraint::new(distance)),
        }
    }

    /// Return a copy with the given stiffness
    pub fn with_stiffness(mut self, stiffness: f32) -> PbdResult<Self> {
        self.set_stiffness(stiffness)?;
        Ok(self)
    }

    /// Change the stiffness; fails unless it lies in `[0, 1]`
    pub fn set_stiffness(&mut self, stiffness: f32) -> PbdResult<()> {
        if !(0.0..=1.0).contains(&stiffness) {
            return Err(PbdError::InvalidStiffness(stiffness));
        }
        self.stiffness = stiffness;
        Ok(())
    }

    /// Bound entities, in gradient order
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// Number of bound entities
    pub fn cardinality(&self) -> usize {
        self.entities.len()
    }

    /// Stiffness in `[0, 1]`
    pub fn stiffness(&self) -> f32 {
        self.stiffness
    }

    /// Constraint kind
    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }

    /// The underlying function
    pub fn function(&self) -> &dyn ConstraintFunction {
        self.function.as_ref()
    }

    /// Stiffness adjusted so the effect after one solver pass does not
    /// depend on the number of bound particles: `1 - (1 - s)^k`
    pub fn corrected_stiffness(&self) -> f32 {
        1.0 - (1.0 - self.stiffness).powi(self.cardinality() as i32)
    }

    /// Check if `entity` is bound by this constraint
    pub fn involves(&self, entity: EntityId) -> bool {
        self.entities.contains(&entity)
    }

    /// Constraint value for the gathered particles
    pub fn value(&self, particles: &[PbdParticle]) -> f32 {
        self.function.value(particles)
    }

    /// Gradient for the particle at `index`
    pub fn gradient(&self, index: usize, particles: &[PbdParticle]) -> Vec2 {
        self.function.gradient(index, particles)
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constraint")
            .field("function", &self.function.name())
            .field("entities", &self.entities)
            .field("kind", &self.kind)
            .field("stiffness", &self.stiffness)
            .finish()
    }
}
