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
//! Particle component simulated by the PBD system

use crate::ecs::Component;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A 2D point mass with a collision radius
///
/// `invmass == 0` marks a static particle that the solver never moves;
/// `radius == 0` marks a particle that takes no part in collisions. For
/// dynamic particles `invmass` is recomputed from `mass` every frame.
///
/// # Examples
///
/// ```
/// use pbd_engine::pbd::PbdParticle;
/// use glam::Vec2;
///
/// let particle = PbdParticle::new(Vec2::new(1.0, 2.0)).with_mass(2.0);
/// assert_eq!(particle.invmass, 0.5);
/// assert!(particle.is_collidable());
/// assert!(!particle.is_static());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PbdParticle {
    /// Current (predicted, then corrected) position
    pub position: Vec2,
    /// Position at the start of the frame
    pub old_position: Vec2,
    /// Position the spatial grid currently files this particle under
    pub temp_position: Vec2,
    /// Velocity
    pub velocity: Vec2,
    /// Mass in kilograms
    pub mass: f32,
    /// Inverse mass, zero for static particles
    pub invmass: f32,
    /// Collision radius, zero for non-colliding particles
    pub radius: f32,
}

impl PbdParticle {
    /// Create a unit-mass, unit-radius particle at rest at `position`
    pub fn new(position: Vec2) -> Self {
        PbdParticle {
            position,
            old_position: position,
            temp_position: position,
            ..Default::default()
        }
    }

    /// Return a copy with the given mass
    ///
    /// # Panics
    ///
    /// Panics if the mass is not positive and finite. Use
    /// [`PbdParticle::make_static`] for immovable particles.
    pub fn with_mass(mut self, mass: f32) -> Self {
        assert!(mass > 0.0 && mass.is_finite(), "Mass must be positive and finite");
        self.mass = mass;
        if self.invmass != 0.0 {
            self.invmass = 1.0 / mass;
        }
        self
    }

    /// Return a copy with the given collision radius
    ///
    /// # Panics
    ///
    /// Panics if the radius is negative or not finite.
    pub fn with_radius(mut self, radius: f32) -> Self {
        assert!(radius >= 0.0 && radius.is_finite(), "Radius must be non-negative and finite");
        self.radius = radius;
        self
    }

    /// Return a copy with the given velocity
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Pin the particle in place
    pub fn make_static(mut self) -> Self {
        self.invmass = 0.0;
        self.velocity = Vec2::ZERO;
        self
    }

    /// Check if the solver never moves this particle
    pub fn is_static(&self) -> bool {
        self.invmass == 0.0
    }

    /// Check if the particle takes part in collisions
    pub fn is_collidable(&self) -> bool {
        self.radius != 0.0
    }

    /// Check if every field is finite
    pub fn is_valid(&self) -> bool {
        self.position.is_finite()
            && self.velocity.is_finite()
            && self.mass.is_finite()
            && self.invmass.is_finite()
    }

    /// Move to `position` and stop, as if placed there at the start of a frame
    pub fn teleport(&mut self, position: Vec2) {
        self.position = position;
        self.old_position = position;
        self.velocity = Vec2::ZERO;
    }
}

impl Default for PbdParticle {
    fn default() -> Self {
        PbdParticle {
            position: Vec2::ZERO,
            old_position: Vec2::ZERO,
            temp_position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            mass: 1.0,
            invmass: 1.0,
            radius: 1.0,
        }
    }
}

impl Component for PbdParticle {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_particle() {
        let particle = PbdParticle::default();
        assert_eq!(particle.position, Vec2::ZERO);
        assert_eq!(particle.velocity, Vec2::ZERO);
        assert_eq!(particle.mass, 1.0);
        assert_eq!(particle.invmass, 1.0);
        assert_eq!(particle.radius, 1.0);
    }

    #[test]
    fn test_static_particle_keeps_zero_invmass() {
        let particle = PbdParticle::new(Vec2::ONE).make_static().with_mass(5.0);
        assert!(particle.is_static());
        assert_eq!(particle.mass, 5.0);
    }

    #[test]
    fn test_non_colliding_particle() {
        let particle = PbdParticle::default().with_radius(0.0);
        assert!(!particle.is_collidable());
    }

    #[test]
    #[should_panic(expected = "Mass must be positive and finite")]
    fn test_zero_mass_panics() {
        PbdParticle::default().with_mass(0.0);
    }

    #[test]
    #[should_panic(expected = "Radius must be non-negative and finite")]
    fn test_negative_radius_panics() {
        PbdParticle::default().with_radius(-1.0);
    }

    #[test]
    fn test_teleport() {
        let mut particle = PbdParticle::default().with_velocity(Vec2::X);
        particle.teleport(Vec2::new(3.0, 4.0));
        assert_eq!(particle.position, Vec2::new(3.0, 4.0));
        assert_eq!(particle.old_position, Vec2::new(3.0, 4.0));
        assert_eq!(particle.velocity, Vec2::ZERO);
    }
}
