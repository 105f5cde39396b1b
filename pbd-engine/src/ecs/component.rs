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
//! Component storage and management
//!
//! Components are plain data attached to entities. Each component type
//! lives in its own [`DenseStorage`], a contiguous array addressed through
//! an entity-to-index map, so systems can walk a type's values without
//! chasing pointers. [`Components`] owns one storage per registered type
//! together with the per-entity [`Signature`] index.

use crate::ecs::signature::{ComponentTypeId, Signature, MAX_COMPONENT_TYPES};
use crate::ecs::EntityId;
use crate::error::{EcsError, EcsResult};
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;

/// Trait that all components must implement
///
/// Components should be plain data structures without behavior.
/// They are default-constructed when added to an entity.
pub trait Component: Default + Send + Sync + 'static {}

/// Type-erased view of a component storage
///
/// Lets the world drop every component of a deleted entity without
/// knowing the concrete types involved.
pub trait ComponentStorage: Send + Sync {
    /// Remove the entity's component, if present
    fn remove_entity(&mut self, entity: EntityId) -> bool;

    /// Check if an entity has a component in this storage
    fn contains(&self, entity: EntityId) -> bool;

    /// Number of stored components
    fn len(&self) -> usize;

    /// Check if the storage is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the stored component type
    fn type_name(&self) -> &'static str;

    /// Downcast support
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast support
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Dense component storage
///
/// Components are stored contiguously in insertion order. A sparse map from
/// entity to array index gives O(1) lookup, and removal swaps the last
/// element into the freed slot so the array never has holes.
///
/// # Ordering
///
/// Order among components is not stable across removals.
///
/// # Example
///
/// ```
/// use pbd_engine::ecs::{DenseStorage, EntityId};
/// use pbd_engine::ecs::components::Transform;
/// use glam::Vec3;
///
/// let mut storage = DenseStorage::<Transform>::new();
/// let entity = EntityId::new(1);
///
/// storage.insert(entity, Transform::from_position(Vec3::new(1.0, 2.0, 3.0)));
/// assert!(storage.contains(entity));
/// assert_eq!(storage.get(entity).unwrap().position.x, 1.0);
/// ```
pub struct DenseStorage<T: Component> {
    /// Mapping from entity to dense array index
    entity_to_index: HashMap<EntityId, usize>,
    /// Mapping from dense array index back to entity (for swap_remove)
    index_to_entity: Vec<EntityId>,
    components: Vec<T>,
}

impl<T: Component> DenseStorage<T> {
    /// Create a new empty storage
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a new storage with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        DenseStorage {
            entity_to_index: HashMap::with_capacity(capacity),
            index_to_entity: Vec::with_capacity(capacity),
            components: Vec::with_capacity(capacity),
        }
    }

    /// Get the number of components stored
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Check if the storage is empty
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Insert a component, replacing any existing value for the entity
    pub fn insert(&mut self, entity: EntityId, component: T) -> &mut T {
        let index = match self.entity_to_index.get(&entity) {
            Some(&index) => {
                self.components[index] = component;
                index
            }
            None => {
                let index = self.components.len();
                self.components.push(component);
                self.entity_to_index.insert(entity, index);
                self.index_to_entity.push(entity);
                index
            }
        };

        debug_assert_eq!(self.entity_to_index.len(), self.index_to_entity.len());
        debug_assert_eq!(self.entity_to_index.len(), self.components.len());

        &mut self.components[index]
    }

    /// Remove the entity's component, swapping the last element into its slot
    pub fn remove(&mut self, entity: EntityId) -> Option<T> {
        let index = self.entity_to_index.remove(&entity)?;
        let last_index = self.components.len() - 1;

        let component = self.components.swap_remove(index);
        self.index_to_entity.swap_remove(index);
        if index != last_index {
            // The former last entity now lives at `index`
            let moved = self.index_to_entity[index];
            self.entity_to_index.insert(moved, index);
        }

        debug_assert_eq!(self.entity_to_index.len(), self.index_to_entity.len());
        debug_assert_eq!(self.entity_to_index.len(), self.components.len());

        Some(component)
    }

    /// Get a reference to the entity's component
    pub fn get(&self, entity: EntityId) -> Option<&T> {
        let index = self.entity_to_index.get(&entity)?;
        Some(&self.components[*index])
    }

    /// Get a mutable reference to the entity's component
    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut T> {
        let index = self.entity_to_index.get(&entity)?;
        Some(&mut self.components[*index])
    }

    /// Check if an entity has a component in this storage
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entity_to_index.contains_key(&entity)
    }

    /// Get the dense index for an entity, if it exists
    pub fn get_index(&self, entity: EntityId) -> Option<usize> {
        self.entity_to_index.get(&entity).copied()
    }

    /// Entities in dense order
    pub fn entities(&self) -> &[EntityId] {
        &self.index_to_entity
    }

    /// The dense component array
    pub fn components(&self) -> &[T] {
        &self.components
    }

    /// The dense component array, mutably
    pub fn components_mut(&mut self) -> &mut [T] {
        &mut self.components
    }

    /// Iterate over `(entity, component)` pairs in dense order
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> + '_ {
        self.index_to_entity.iter().copied().zip(self.components.iter())
    }

    /// Clear all components
    pub fn clear(&mut self) {
        self.entity_to_index.clear();
        self.index_to_entity.clear();
        self.components.clear();
    }
}

impl<T: Component> Default for DenseStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> ComponentStorage for DenseStorage<T> {
    fn remove_entity(&mut self, entity: EntityId) -> bool {
        self.remove(entity).is_some()
    }

    fn contains(&self, entity: EntityId) -> bool {
        DenseStorage::contains(self, entity)
    }

    fn len(&self) -> usize {
        DenseStorage::len(self)
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// All component storages of a world plus the signature index
///
/// Type ids are assigned monotonically the first time a Rust type is
/// registered and stay stable for the lifetime of the value. Systems get
/// mutable access to this through their context, but only the world can
/// add or remove components so that system membership stays in sync.
pub struct Components {
    type_ids: HashMap<TypeId, ComponentTypeId>,
    storages: Vec<Box<dyn ComponentStorage>>,
    signatures: HashMap<EntityId, Signature>,
}

impl Components {
    /// Create an empty component manager
    pub fn new() -> Self {
        Components {
            type_ids: HashMap::new(),
            storages: Vec::new(),
            signatures: HashMap::new(),
        }
    }

    /// Register a component type, returning its id
    ///
    /// Registering an already known type returns the existing id.
    pub fn register<T: Component>(&mut self) -> EcsResult<ComponentTypeId> {
        if let Some(&id) = self.type_ids.get(&TypeId::of::<T>()) {
            return Ok(id);
        }
        if self.storages.len() >= MAX_COMPONENT_TYPES {
            return Err(EcsError::ComponentCapacityExceeded {
                max: MAX_COMPONENT_TYPES,
            });
        }

        let id = ComponentTypeId::new(self.storages.len() as u32);
        self.type_ids.insert(TypeId::of::<T>(), id);
        self.storages.push(Box::new(DenseStorage::<T>::new()));
        log::debug!("registered component type {} as #{}", type_name::<T>(), id.index());
        Ok(id)
    }

    /// Build the signature for a set of component types, registering them as needed
    pub fn signature_of<S: ComponentSet>(&mut self) -> EcsResult<Signature> {
        S::signature(self)
    }

    /// Get the id of a registered type
    pub fn type_id_of<T: Component>(&self) -> Option<ComponentTypeId> {
        self.type_ids.get(&TypeId::of::<T>()).copied()
    }

    /// Number of registered component types
    pub fn type_count(&self) -> usize {
        self.storages.len()
    }

    /// Name of a registered component type
    pub fn type_name(&self, id: ComponentTypeId) -> Option<&'static str> {
        self.storages.get(id.index()).map(|s| s.type_name())
    }

    /// The entity's current signature (empty if it has no components)
    pub fn signature(&self, entity: EntityId) -> Signature {
        self.signatures.get(&entity).copied().unwrap_or_default()
    }

    /// Typed storage for `T`, if the type has been registered
    pub fn storage<T: Component>(&self) -> Option<&DenseStorage<T>> {
        let id = self.type_id_of::<T>()?;
        self.storages[id.index()].as_any().downcast_ref()
    }

    /// Mutable typed storage for `T`, if the type has been registered
    pub fn storage_mut<T: Component>(&mut self) -> Option<&mut DenseStorage<T>> {
        let id = self.type_id_of::<T>()?;
        self.storages[id.index()].as_any_mut().downcast_mut()
    }

    /// Check if the entity carries a `T`
    pub fn has<T: Component>(&self, entity: EntityId) -> bool {
        self.type_id_of::<T>()
            .map_or(false, |id| self.signature(entity).contains(id))
    }

    /// Get the entity's `T`, if present
    pub fn try_get<T: Component>(&self, entity: EntityId) -> Option<&T> {
        self.storage::<T>()?.get(entity)
    }

    /// Get the entity's `T` mutably, if present
    pub fn try_get_mut<T: Component>(&mut self, entity: EntityId) -> Option<&mut T> {
        self.storage_mut::<T>()?.get_mut(entity)
    }

    /// Get the entity's `T`
    ///
    /// # Panics
    ///
    /// Panics if the entity does not carry a `T`. Systems only see entities
    /// whose signature covers their required types, so inside a system this
    /// is a precondition rather than a runtime condition.
    pub fn get<T: Component>(&self, entity: EntityId) -> &T {
        match self.try_get(entity) {
            Some(component) => component,
            None => missing_component::<T>(entity),
        }
    }

    /// Get the entity's `T` mutably
    ///
    /// # Panics
    ///
    /// Panics if the entity does not carry a `T`.
    pub fn get_mut<T: Component>(&mut self, entity: EntityId) -> &mut T {
        match self.try_get_mut(entity) {
            Some(component) => component,
            None => missing_component::<T>(entity),
        }
    }

    /// Attach a default `T` to the entity and set its signature bit
    pub(crate) fn insert_default<T: Component>(
        &mut self,
        entity: EntityId,
    ) -> EcsResult<ComponentTypeId> {
        let id = self.register::<T>()?;
        if let Some(storage) = self.storage_mut::<T>() {
            storage.insert(entity, T::default());
        }
        self.signatures.entry(entity).or_default().set(id);
        Ok(id)
    }

    /// Detach the entity's `T` and clear its signature bit
    pub(crate) fn remove<T: Component>(&mut self, entity: EntityId) -> Option<T> {
        let id = self.type_id_of::<T>()?;
        let value = self.storage_mut::<T>()?.remove(entity)?;
        if let Some(signature) = self.signatures.get_mut(&entity) {
            signature.clear(id);
        }
        Some(value)
    }

    /// Drop every component of the entity
    pub(crate) fn remove_entity(&mut self, entity: EntityId) {
        if let Some(signature) = self.signatures.remove(&entity) {
            for id in signature.iter() {
                self.storages[id.index()].remove_entity(entity);
            }
        }
    }
}

impl Default for Components {
    fn default() -> Self {
        Self::new()
    }
}

fn missing_component<T: Component>(entity: EntityId) -> ! {
    panic!("{} has no {} component", entity, type_name::<T>())
}

/// A tuple of component types, used to declare a system's requirements
///
/// Implemented for tuples of up to eight components:
///
/// ```
/// use pbd_engine::ecs::Components;
/// use pbd_engine::ecs::components::Transform;
/// use pbd_engine::pbd::PbdParticle;
///
/// let mut components = Components::new();
/// let signature = components.signature_of::<(PbdParticle, Transform)>().unwrap();
/// assert_eq!(signature.len(), 2);
/// ```
pub trait ComponentSet {
    /// Register every type in the set and return the combined signature
    fn signature(components: &mut Components) -> EcsResult<Signature>;
}

macro_rules! impl_component_set {
    ($($name:ident),+) => {
        impl<$($name: Component),+> ComponentSet for ($($name,)+) {
            fn signature(components: &mut Components) -> EcsResult<Signature> {
                let mut signature = Signature::empty();
                $( signature.set(components.register::<$name>()?); )+
                Ok(signature)
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);
impl_component_set!(A, B, C, D, E, F, G);
impl_component_set!(A, B, C, D, E, F, G, H);
