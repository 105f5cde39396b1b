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
//! Error types
//!
//! Setup operations (registering component types, adding components,
//! building constraints, configuring the solver) report failures through
//! these enums. The per-frame hot path never returns errors: degenerate
//! input is skipped and precondition violations panic.

use crate::ecs::EntityId;
use thiserror::Error;

/// Errors raised by the ECS runtime
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// More distinct component types were registered than a signature can hold
    #[error("component type capacity exceeded: at most {max} component types are supported")]
    ComponentCapacityExceeded {
        /// Maximum number of component types
        max: usize,
    },

    /// The entity is not alive
    #[error("{0} is not alive")]
    DeadEntity(EntityId),
}

/// Errors raised by the PBD solver and its constraint model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PbdError {
    /// Grid cell size must be positive and finite
    #[error("invalid grid cell size {0}: must be positive and finite")]
    InvalidCellSize(f32),

    /// Stiffness must lie in [0, 1]
    #[error("invalid stiffness {0}: must lie in [0, 1]")]
    InvalidStiffness(f32),

    /// The number of bound entities does not match what the constraint function expects
    #[error("constraint binds {actual} entities but its function expects {expected}")]
    CardinalityMismatch {
        /// Cardinality declared by the constraint function
        expected: usize,
        /// Number of entities supplied
        actual: usize,
    },

    /// A configuration value is out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for ECS operations
pub type EcsResult<T> = Result<T, EcsError>;

/// Result type for PBD operations
pub type PbdResult<T> = Result<T, PbdError>;
