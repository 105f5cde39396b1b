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
//! Solver configuration

use crate::error::{PbdError, PbdResult};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Default number of Gauss-Seidel passes per frame
pub const DEFAULT_SOLVER_ITERATIONS: usize = 10;

/// Default spatial grid cell size
pub const DEFAULT_GRID_CELL_SIZE: f32 = 2.0;

/// Default gravity force (y grows downwards in screen space)
pub const DEFAULT_GRAVITY: Vec2 = Vec2::new(0.0, 9.81);

/// Configuration for the PBD system
///
/// Every field has a default, so partial documents deserialize:
///
/// ```
/// use pbd_engine::pbd::PbdConfig;
///
/// let config: PbdConfig = serde_json::from_str(r#"{ "solver_iterations": 4 }"#).unwrap();
/// assert_eq!(config.solver_iterations, 4);
/// assert_eq!(config.grid_cell_size, 2.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PbdConfig {
    /// Gauss-Seidel passes per frame
    pub solver_iterations: usize,
    /// Edge length of a spatial grid cell; should be at least one particle diameter
    pub grid_cell_size: f32,
    /// Constant force applied to every dynamic particle
    pub gravity: Vec2,
    /// Fraction of velocity removed each frame, in `[0, 1]`
    pub damping: f32,
    /// Draw neighbourhood lines through the debug renderer
    pub debug_draw: bool,
}

impl Default for PbdConfig {
    fn default() -> Self {
        PbdConfig {
            solver_iterations: DEFAULT_SOLVER_ITERATIONS,
            grid_cell_size: DEFAULT_GRID_CELL_SIZE,
            gravity: DEFAULT_GRAVITY,
            damping: 0.0,
            debug_draw: false,
        }
    }
}

impl PbdConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of solver passes
    pub fn with_solver_iterations(mut self, iterations: usize) -> Self {
        self.solver_iterations = iterations;
        self
    }

    /// Set the grid cell size
    pub fn with_grid_cell_size(mut self, size: f32) -> Self {
        self.grid_cell_size = size;
        self
    }

    /// Set the gravity force
    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set the velocity damping
    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping;
        self
    }

    /// Enable or disable neighbourhood debug lines
    pub fn with_debug_draw(mut self, enabled: bool) -> Self {
        self.debug_draw = enabled;
        self
    }

    /// Check every field
    pub fn validate(&self) -> PbdResult<()> {
        if !(self.grid_cell_size > 0.0 && self.grid_cell_size.is_finite()) {
            return Err(PbdError::InvalidCellSize(self.grid_cell_size));
        }
        if !self.gravity.is_finite() {
            return Err(PbdError::InvalidConfig(format!(
                "gravity must be finite, got {}",
                self.gravity
            )));
        }
        if !(0.0..=1.0).contains(&self.damping) {
            return Err(PbdError::InvalidConfig(format!(
                "damping must lie in [0, 1], got {}",
                self.damping
            )));
        }
        Ok(())
    }
}
