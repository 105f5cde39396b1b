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
//! # PBD Engine
//!
//! An ECS (Entity Component System) runtime with a position-based-dynamics
//! particle solver built on top of it.
//!
//! ## Features
//!
//! - **ECS Architecture**: dense per-type component storage, signature-based
//!   system membership and lifecycle hooks
//! - **Position-Based Dynamics**: prediction, constraint projection and
//!   velocity reconstruction for 2D particles
//! - **Spatial Hashing**: uniform grid for neighbourhood queries
//! - **Extensibility**: custom systems, constraint functions, constraint
//!   generators and force fields
//! - **Parallelization**: optional Rayon integration for neighbourhood
//!   gathering (`parallel` feature)
//!
//! ## Example
//!
//! ```rust
//! use pbd_engine::ecs::World;
//! use pbd_engine::ecs::components::Transform;
//! use pbd_engine::pbd::{CollisionConstraintGenerator, PbdConfig, PbdParticle, PbdSystem};
//! use glam::Vec2;
//!
//! let system = PbdSystem::new(PbdConfig::default())
//!     .unwrap()
//!     .with_constraint_generator(CollisionConstraintGenerator::new());
//!
//! let mut world = World::new();
//! world.register_system(system).unwrap();
//!
//! let entity = world.create_entity();
//! *world.add_component::<PbdParticle>(entity) = PbdParticle::new(Vec2::new(0.0, 0.0));
//! world.add_component::<Transform>(entity);
//!
//! world.update_systems(1.0 / 60.0);
//! assert!(world.component::<Transform>(entity).position.y > 0.0);
//! ```

#![warn(missing_docs)]

/// Entity Component System implementation
pub mod ecs;

/// Error types
pub mod error;

/// Position-based dynamics
pub mod pbd;

/// Frame profiling
pub mod profiling;

/// Debug rendering collaborator
pub mod render;

pub use ecs::{EntityId, World};
