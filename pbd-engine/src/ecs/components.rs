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
//! Shared engine components
//!
//! Components here are owned by the engine at large rather than by a single
//! system. Solver-specific components live next to their systems.

use crate::ecs::Component;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// World-space placement of an entity
///
/// Consumed by renderers and written by simulation systems. The particle
/// solver only ever writes `position`.
///
/// # Examples
///
/// ```
/// use pbd_engine::ecs::components::Transform;
/// use glam::Vec3;
///
/// let transform = Transform::from_position(Vec3::new(1.0, 2.0, 0.0));
/// assert_eq!(transform.scale, Vec3::ONE);
/// assert!(transform.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Translation
    pub position: Vec3,
    /// Per-axis scale
    pub scale: Vec3,
    /// Orientation
    pub rotation: Quat,
}

impl Transform {
    /// Identity transform: origin, unit scale, no rotation
    pub const IDENTITY: Transform = Transform {
        position: Vec3::ZERO,
        scale: Vec3::ONE,
        rotation: Quat::IDENTITY,
    };

    /// Identity transform translated to `position`
    pub fn from_position(position: Vec3) -> Self {
        Transform {
            position,
            ..Self::IDENTITY
        }
    }

    /// Return a copy with the given scale
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Return a copy with the given rotation
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Check if every field is finite
    pub fn is_valid(&self) -> bool {
        self.position.is_finite() && self.scale.is_finite() && self.rotation.is_finite()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Component for Transform {}
