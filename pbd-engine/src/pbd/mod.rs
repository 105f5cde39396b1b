//! Position-based dynamics
//!
//! Particles are advanced by predicting positions from velocities and then
//! projecting those predictions onto a set of positional constraints.
//! Velocities are derived afterwards from the corrected displacement, which
//! keeps the simulation stable at large time steps.
//!
//! This module provides:
//! - The [`PbdParticle`] component
//! - A uniform [`SpatialGrid`] for neighbourhood queries
//! - The constraint model and pluggable constraint generators
//! - A fixed-iteration Gauss-Seidel solver
//! - [`PbdSystem`], which runs the whole frame

mod config;
mod constraint;
mod force;
mod generator;
mod grid;
mod particle;
mod solver;
mod system;

pub use config::{PbdConfig, DEFAULT_GRAVITY, DEFAULT_GRID_CELL_SIZE, DEFAULT_SOLVER_ITERATIONS};
pub use constraint::{AnchorConstraint, Constraint, ConstraintFunction, ConstraintKind, DistanceConstraint};
pub use force::{Drag, ForceField, ForceFields, Gravity};
pub use generator::{CollisionConstraintGenerator, ConstraintGenerator};
pub use grid::{CellCoord, SpatialGrid};
pub use particle::PbdParticle;
pub use solver::{GaussSeidelSolver, SolveStats};
pub use system::{PbdStats, PbdSystem};
