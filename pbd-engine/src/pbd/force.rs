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
//! External force fields
//!
//! Force fields are sampled once per particle at the start of every frame.
//! Their sum is scaled by the particle's inverse mass and the time step and
//! added to its velocity. Static particles (`invmass == 0`) are unaffected.

use crate::ecs::EntityId;
use crate::pbd::PbdParticle;
use glam::Vec2;

/// Trait for force providers that can be registered with the PBD system
///
/// Force fields can represent gravity, drag, wind, user input, or any other
/// force-generating mechanism.
pub trait ForceField: Send + Sync {
    /// Compute the force acting on `particle`
    fn force_at(&self, entity: EntityId, particle: &PbdParticle) -> Vec2;

    /// Get a descriptive name for this force field
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Constant force applied to every particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gravity {
    /// Force vector
    pub force: Vec2,
}

impl Gravity {
    /// Gravity with the given force vector
    pub fn new(force: Vec2) -> Self {
        Gravity { force }
    }
}

impl ForceField for Gravity {
    fn force_at(&self, _entity: EntityId, _particle: &PbdParticle) -> Vec2 {
        self.force
    }
}

/// Linear drag opposing the velocity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drag {
    /// Force per unit velocity
    pub coefficient: f32,
}

impl Drag {
    /// Drag with the given coefficient
    pub fn new(coefficient: f32) -> Self {
        Drag { coefficient }
    }
}

impl ForceField for Drag {
    fn force_at(&self, _entity: EntityId, particle: &PbdParticle) -> Vec2 {
        -self.coefficient * particle.velocity
    }
}

/// Ordered set of force fields with guarded accumulation
pub struct ForceFields {
    fields: Vec<Box<dyn ForceField>>,
    /// Accumulated forces longer than this are clamped
    pub max_force_magnitude: f32,
}

impl ForceFields {
    /// Create an empty set
    pub fn new() -> Self {
        ForceFields {
            fields: Vec::new(),
            max_force_magnitude: 1e10,
        }
    }

    /// Add a field; fields are sampled in registration order
    pub fn register(&mut self, field: Box<dyn ForceField>) {
        log::debug!("registered force field {}", field.name());
        self.fields.push(field);
    }

    /// Number of registered fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if no field is registered
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Sum of all fields acting on `particle`
    ///
    /// Non-finite contributions are skipped with a warning and the total is
    /// clamped to [`ForceFields::max_force_magnitude`].
    pub fn accumulate(&self, entity: EntityId, particle: &PbdParticle) -> Vec2 {
        let mut total = Vec2::ZERO;
        for field in &self.fields {
            let force = field.force_at(entity, particle);
            if !force.is_finite() {
                log::warn!("force field {} produced an invalid force for {}", field.name(), entity);
                continue;
            }
            total += force;
        }

        let magnitude = total.length();
        if magnitude > self.max_force_magnitude {
            log::warn!(
                "total force magnitude {:.2e} exceeds limit {:.2e} for {}",
                magnitude,
                self.max_force_magnitude,
                entity
            );
            total *= self.max_force_magnitude / magnitude;
        }
        total
    }
}

impl Default for ForceFields {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl ForceField for Broken {
        fn force_at(&self, _entity: EntityId, _particle: &PbdParticle) -> Vec2 {
            Vec2::new(f32::NAN, 0.0)
        }
    }

    #[test]
    fn test_fields_sum() {
        let mut fields = ForceFields::new();
        fields.register(Box::new(Gravity::new(Vec2::new(0.0, 9.81))));
        fields.register(Box::new(Gravity::new(Vec2::new(1.0, 0.0))));

        let force = fields.accumulate(EntityId::new(0), &PbdParticle::default());
        assert_eq!(force, Vec2::new(1.0, 9.81));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_invalid_force_is_skipped() {
        let mut fields = ForceFields::new();
        fields.register(Box::new(Broken));
        fields.register(Box::new(Gravity::new(Vec2::Y)));

        let force = fields.accumulate(EntityId::new(0), &PbdParticle::default());
        assert_eq!(force, Vec2::Y);
    }

    #[test]
    fn test_force_is_clamped() {
        let mut fields = ForceFields::new();
        fields.max_force_magnitude = 2.0;
        fields.register(Box::new(Gravity::new(Vec2::new(0.0, 10.0))));

        let force = fields.accumulate(EntityId::new(0), &PbdParticle::default());
        assert!((force.length() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_drag_opposes_velocity() {
        let particle = PbdParticle::default().with_velocity(Vec2::new(2.0, -4.0));
        let force = Drag::new(0.5).force_at(EntityId::new(0), &particle);
        assert_eq!(force, Vec2::new(-1.0, 2.0));
    }
}
