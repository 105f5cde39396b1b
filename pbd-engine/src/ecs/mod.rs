//! Entity Component System (ECS) core implementation
//!
//! This module provides the foundational ECS architecture including:
//! - Entity allocation with batched, recycled ids
//! - Dense per-type component storage with swap-remove
//! - Signature-based system membership
//! - The frame driver that runs system lifecycle hooks

mod component;
mod entity;
mod signature;
mod system;
mod world;

/// Engine-wide components
pub mod components;

pub use component::{Component, ComponentSet, ComponentStorage, Components, DenseStorage};
pub use entity::{EntityId, EntityRegistry, ENTITY_BATCH_SIZE};
pub use signature::{ComponentTypeId, Signature, MAX_COMPONENT_TYPES};
pub use system::{AsAny, System, SystemContext, SystemId};
pub use world::World;
