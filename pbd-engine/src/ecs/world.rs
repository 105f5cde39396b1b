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
//! World - the container for all entities, components and systems

use crate::ecs::system::{sorted_intersection, SystemSlot};
use crate::ecs::{Component, Components, EntityId, EntityRegistry, System, SystemContext, SystemId};
use crate::error::{EcsError, EcsResult};
use crate::profiling::Profiler;
use crate::render::{DebugRenderer, NoopRenderer};

/// The world contains all entities, their components and the registered systems
///
/// Every structural change (entity creation and deletion, component add
/// and remove, system registration) goes through the world so that
/// signatures and system member lists stay consistent.
pub struct World {
    entities: EntityRegistry,
    components: Components,
    systems: Vec<SystemSlot>,
    /// Entities created since the last frame, awaiting `awake`
    new_entities: Vec<EntityId>,
    locked: bool,
    renderer: Box<dyn DebugRenderer>,
    profiler: Profiler,
}

impl World {
    /// Create a new empty world
    pub fn new() -> Self {
        Self::with_registry(EntityRegistry::new())
    }

    /// Create a world whose entity pool grows by `batch_size` ids at a time
    pub fn with_batch_size(batch_size: usize) -> Self {
        Self::with_registry(EntityRegistry::with_batch_size(batch_size))
    }

    fn with_registry(entities: EntityRegistry) -> Self {
        World {
            entities,
            components: Components::new(),
            systems: Vec::new(),
            new_entities: Vec::new(),
            locked: false,
            renderer: Box::new(NoopRenderer),
            profiler: Profiler::disabled(),
        }
    }

    /// Replace the debug renderer, builder style
    pub fn with_renderer<R: DebugRenderer + 'static>(mut self, renderer: R) -> Self {
        self.set_renderer(renderer);
        self
    }

    /// Replace the debug renderer
    pub fn set_renderer<R: DebugRenderer + 'static>(&mut self, renderer: R) {
        self.renderer = Box::new(renderer);
    }

    /// Create a new entity
    pub fn create_entity(&mut self) -> EntityId {
        let entity = self.entities.allocate();
        self.new_entities.push(entity);

        // Systems without requirements take every entity
        for slot in self.systems.iter_mut().filter(|s| s.signature.is_empty()) {
            slot.members.push(entity);
        }
        entity
    }

    /// Delete an entity with all of its components
    ///
    /// Every system the entity belongs to gets its `remove` hook first.
    /// Returns false (and logs a warning) if the entity is not alive.
    pub fn delete_entity(&mut self, entity: EntityId) -> bool {
        if !self.entities.is_alive(entity) {
            log::warn!("delete_entity: {} is not alive", entity);
            return false;
        }

        let World {
            components,
            systems,
            renderer,
            profiler,
            ..
        } = self;
        let mut ctx = SystemContext {
            components,
            renderer: &mut **renderer,
            profiler,
        };
        for slot in systems.iter_mut() {
            if slot.contains(entity) {
                slot.system.remove(&mut ctx, entity);
                slot.forget(entity);
            }
        }

        self.components.remove_entity(entity);
        self.entities.release(entity);
        self.new_entities.retain(|&e| e != entity);
        true
    }

    /// Check if an entity is alive
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.entities.is_alive(entity)
    }

    /// Get the number of alive entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Alive entities in creation order
    pub fn entities(&self) -> &[EntityId] {
        self.entities.live()
    }

    /// Attach a default-constructed `T`, replacing an existing one
    ///
    /// The entity joins every system whose requirements it now meets.
    pub fn try_add_component<T: Component>(&mut self, entity: EntityId) -> EcsResult<&mut T> {
        if !self.entities.is_alive(entity) {
            return Err(EcsError::DeadEntity(entity));
        }

        self.components.insert_default::<T>(entity)?;
        let signature = self.components.signature(entity);
        let pending = self.new_entities.contains(&entity);
        for slot in self.systems.iter_mut() {
            if signature.is_superset_of(&slot.signature) && !slot.contains(entity) {
                slot.members.push(entity);
                if !pending {
                    slot.joined.push(entity);
                }
            }
        }

        Ok(self.components.get_mut::<T>(entity))
    }

    /// Attach a default-constructed `T`, replacing an existing one
    ///
    /// # Panics
    ///
    /// Panics if the entity is dead or the component type capacity is exhausted.
    pub fn add_component<T: Component>(&mut self, entity: EntityId) -> &mut T {
        match self.try_add_component::<T>(entity) {
            Ok(component) => component,
            Err(e) => panic!("add_component::<{}>: {}", std::any::type_name::<T>(), e),
        }
    }

    /// Detach the entity's `T` and return it
    ///
    /// Systems requiring `T` get their `remove` hook while the component is
    /// still attached. Returns `None` if the entity did not carry a `T`.
    pub fn remove_component<T: Component>(&mut self, entity: EntityId) -> Option<T> {
        let id = self.components.type_id_of::<T>()?;
        if !self.components.signature(entity).contains(id) {
            return None;
        }

        let World {
            components,
            systems,
            renderer,
            profiler,
            ..
        } = self;
        let mut ctx = SystemContext {
            components,
            renderer: &mut **renderer,
            profiler,
        };
        for slot in systems.iter_mut() {
            if slot.signature.contains(id) && slot.contains(entity) {
                slot.system.remove(&mut ctx, entity);
                slot.forget(entity);
            }
        }

        self.components.remove::<T>(entity)
    }

    /// Get the entity's `T` mutably
    ///
    /// # Panics
    ///
    /// Panics if the entity does not carry a `T`.
    pub fn get_component<T: Component>(&mut self, entity: EntityId) -> &mut T {
        self.components.get_mut::<T>(entity)
    }

    /// Get the entity's `T`
    ///
    /// # Panics
    ///
    /// Panics if the entity does not carry a `T`.
    pub fn component<T: Component>(&self, entity: EntityId) -> &T {
        self.components.get::<T>(entity)
    }

    /// Get the entity's `T`, if present
    pub fn try_component<T: Component>(&self, entity: EntityId) -> Option<&T> {
        self.components.try_get::<T>(entity)
    }

    /// Get the entity's `T` mutably, if present
    pub fn try_component_mut<T: Component>(&mut self, entity: EntityId) -> Option<&mut T> {
        self.components.try_get_mut::<T>(entity)
    }

    /// Check if the entity carries a `T`
    pub fn has_component<T: Component>(&self, entity: EntityId) -> bool {
        self.components.has::<T>(entity)
    }

    /// Component stores
    pub fn components(&self) -> &Components {
        &self.components
    }

    /// Component stores, mutably
    ///
    /// Values may be changed freely; attaching or detaching components must
    /// still go through the world.
    pub fn components_mut(&mut self) -> &mut Components {
        &mut self.components
    }

    /// Register a system
    ///
    /// Entities that already meet the system's requirements become members
    /// right away and are awakened on the next frame. `start` runs before
    /// this returns.
    pub fn register_system<S: System>(&mut self, system: S) -> EcsResult<SystemId> {
        let signature = system.required_components(&mut self.components)?;
        let mut slot = SystemSlot::new(Box::new(system), signature);

        for &entity in self.entities.live() {
            if self.components.signature(entity).is_superset_of(&signature) {
                slot.members.push(entity);
                if !self.new_entities.contains(&entity) {
                    slot.joined.push(entity);
                }
            }
        }

        let mut ctx = SystemContext {
            components: &mut self.components,
            renderer: &mut *self.renderer,
            profiler: &mut self.profiler,
        };
        slot.system.start(&mut ctx);

        let id = SystemId(self.systems.len());
        log::debug!(
            "registered system {} with {} initial members",
            slot.system.name(),
            slot.members.len()
        );
        self.systems.push(slot);
        Ok(id)
    }

    /// Typed access to the first registered system of type `S`
    pub fn system<S: System>(&self) -> Option<&S> {
        self.systems.iter().find_map(|slot| slot.downcast_ref::<S>())
    }

    /// Typed mutable access to the first registered system of type `S`
    pub fn system_mut<S: System>(&mut self) -> Option<&mut S> {
        self.systems.iter_mut().find_map(|slot| slot.downcast_mut::<S>())
    }

    /// Current members of a system
    ///
    /// # Panics
    ///
    /// Panics if the id did not come from this world.
    pub fn members(&self, id: SystemId) -> &[EntityId] {
        &self.systems[id.0].members
    }

    /// Number of registered systems
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Run one frame
    ///
    /// Pending entities are awakened first, then every system is updated in
    /// registration order. Does nothing while the world is locked.
    pub fn update_systems(&mut self, dt: f32) {
        if self.locked {
            return;
        }

        let World {
            components,
            systems,
            new_entities,
            renderer,
            profiler,
            ..
        } = self;
        let mut ctx = SystemContext {
            components,
            renderer: &mut **renderer,
            profiler,
        };
        ctx.profiler.begin("update_systems");

        new_entities.sort_unstable();
        for slot in systems.iter_mut() {
            for entity in awake_order(new_entities, slot) {
                slot.system.awake(&mut ctx, entity);
            }
        }
        new_entities.clear();

        for slot in systems.iter_mut() {
            slot.system.update(&mut ctx, &mut slot.members, dt);
            for &entity in slot.members.iter() {
                slot.system.update_entity(&mut ctx, entity, dt);
            }
        }

        ctx.profiler.end("update_systems");
    }

    /// Suspend frame updates
    pub fn lock(&mut self) {
        self.locked = true;
    }

    /// Resume frame updates
    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// Check if frame updates are suspended
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Frame profiler
    pub fn profiler(&self) -> &Profiler {
        &self.profiler
    }

    /// Frame profiler, mutably (e.g. to enable it)
    pub fn profiler_mut(&mut self) -> &mut Profiler {
        &mut self.profiler
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Members of `slot` to awaken this frame, ascending
fn awake_order(new_entities: &[EntityId], slot: &mut SystemSlot) -> Vec<EntityId> {
    if new_entities.is_empty() && slot.joined.is_empty() {
        return Vec::new();
    }

    let mut members = slot.members.clone();
    members.sort_unstable();

    let mut woken = sorted_intersection(new_entities, &members);
    if !slot.joined.is_empty() {
        let mut joined = std::mem::take(&mut slot.joined);
        joined.sort_unstable();
        joined.dedup();
        woken.extend(sorted_intersection(&joined, &members));
        woken.sort_unstable();
        woken.dedup();
    }
    woken
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::Transform;
    use crate::ecs::Signature;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    struct Health(u32);

    impl Component for Health {}

    type Log = Arc<Mutex<Vec<String>>>;

    /// Records every hook call into a shared log
    struct Recorder {
        log: Log,
    }

    impl System for Recorder {
        fn required_components(&self, components: &mut Components) -> EcsResult<Signature> {
            components.signature_of::<(Health,)>()
        }

        fn start(&mut self, _ctx: &mut SystemContext<'_>) {
            self.log.lock().unwrap().push("start".into());
        }

        fn awake(&mut self, _ctx: &mut SystemContext<'_>, entity: EntityId) {
            self.log.lock().unwrap().push(format!("awake {}", entity.raw()));
        }

        fn update(&mut self, _ctx: &mut SystemContext<'_>, members: &mut [EntityId], _dt: f32) {
            self.log.lock().unwrap().push(format!("update {}", members.len()));
        }

        fn update_entity(&mut self, ctx: &mut SystemContext<'_>, entity: EntityId, _dt: f32) {
            ctx.components.get_mut::<Health>(entity).0 += 1;
            self.log.lock().unwrap().push(format!("entity {}", entity.raw()));
        }

        fn remove(&mut self, ctx: &mut SystemContext<'_>, entity: EntityId) {
            // The component is still attached while the hook runs
            assert!(ctx.components.has::<Health>(entity));
            self.log.lock().unwrap().push(format!("remove {}", entity.raw()));
        }
    }

    fn recorder_world() -> (World, Log, SystemId) {
        let log: Log = Arc::default();
        let mut world = World::new();
        let id = world
            .register_system(Recorder { log: Arc::clone(&log) })
            .unwrap();
        (world, log, id)
    }

    fn drain(log: &Log) -> Vec<String> {
        std::mem::take(&mut *log.lock().unwrap())
    }

    #[test]
    fn test_world_entity_lifecycle() {
        let mut world = World::new();

        let e1 = world.create_entity();
        let e2 = world.create_entity();

        assert_eq!(world.entity_count(), 2);
        assert!(world.is_alive(e1));
        assert!(world.is_alive(e2));

        assert!(world.delete_entity(e1));
        assert_eq!(world.entity_count(), 1);
        assert!(!world.is_alive(e1));
        assert!(world.is_alive(e2));
        assert!(!world.delete_entity(e1));
    }

    #[test]
    fn test_hook_order() {
        let (mut world, log, id) = recorder_world();
        assert_eq!(drain(&log), vec!["start"]);

        let b = world.create_entity();
        let a = world.create_entity();
        world.add_component::<Health>(a);
        world.add_component::<Health>(b);
        assert_eq!(world.members(id), &[a, b]);

        world.update_systems(0.1);
        assert_eq!(
            drain(&log),
            vec!["awake 0", "awake 1", "update 2", "entity 1", "entity 0"]
        );

        // Awake happens once
        world.update_systems(0.1);
        assert_eq!(drain(&log), vec!["update 2", "entity 1", "entity 0"]);
        assert_eq!(world.component::<Health>(a).0, 2);
    }

    #[test]
    fn test_late_component_is_awakened() {
        let (mut world, log, _) = recorder_world();
        let entity = world.create_entity();
        world.update_systems(0.1);
        drain(&log);

        world.add_component::<Health>(entity);
        world.update_systems(0.1);
        assert_eq!(drain(&log), vec!["awake 0", "update 1", "entity 0"]);
    }

    #[test]
    fn test_backfill_on_registration() {
        let mut world = World::new();
        let entity = world.create_entity();
        world.add_component::<Health>(entity);
        world.update_systems(0.1);

        let log: Log = Arc::default();
        let id = world
            .register_system(Recorder { log: Arc::clone(&log) })
            .unwrap();
        assert_eq!(world.members(id), &[entity]);

        world.update_systems(0.1);
        assert_eq!(
            drain(&log),
            vec!["start", "awake 0", "update 1", "entity 0"]
        );
    }

    #[test]
    fn test_remove_component_calls_remove_hook() {
        let (mut world, log, id) = recorder_world();
        let entity = world.create_entity();
        world.add_component::<Health>(entity).0 = 7;
        world.add_component::<Transform>(entity);
        drain(&log);

        let removed = world.remove_component::<Health>(entity);
        assert_eq!(removed.map(|h| h.0), Some(7));
        assert_eq!(drain(&log), vec!["remove 0"]);
        assert!(world.members(id).is_empty());
        assert!(world.has_component::<Transform>(entity));

        // Removing an unrelated or absent component touches no system
        assert!(world.remove_component::<Health>(entity).is_none());
        world.remove_component::<Transform>(entity);
        assert!(drain(&log).is_empty());
    }

    #[test]
    fn test_delete_entity_calls_remove_hook() {
        let (mut world, log, id) = recorder_world();
        let entity = world.create_entity();
        world.add_component::<Health>(entity);
        drain(&log);

        world.delete_entity(entity);
        assert_eq!(drain(&log), vec!["remove 0"]);
        assert!(world.members(id).is_empty());
        assert!(world.components().signature(entity).is_empty());

        // Deleted before its first frame, so it is never awakened
        world.update_systems(0.1);
        assert_eq!(drain(&log), vec!["update 0"]);
    }

    #[test]
    fn test_lock_skips_frames() {
        let (mut world, log, _) = recorder_world();
        drain(&log);

        world.lock();
        assert!(world.is_locked());
        world.update_systems(0.1);
        assert!(drain(&log).is_empty());

        world.unlock();
        world.update_systems(0.1);
        assert_eq!(drain(&log), vec!["update 0"]);
    }

    #[test]
    fn test_add_component_resets_to_default() {
        let mut world = World::new();
        let entity = world.create_entity();
        world.add_component::<Health>(entity).0 = 3;
        world.add_component::<Health>(entity);
        assert_eq!(world.component::<Health>(entity).0, 0);
    }

    #[test]
    fn test_add_component_to_dead_entity() {
        let mut world = World::new();
        let entity = world.create_entity();
        world.delete_entity(entity);

        let result = world.try_add_component::<Health>(entity);
        assert!(matches!(result, Err(EcsError::DeadEntity(e)) if e == entity));
    }

    #[test]
    #[should_panic(expected = "has no")]
    fn test_get_component_missing_panics() {
        let mut world = World::new();
        let entity = world.create_entity();
        world.get_component::<Health>(entity);
    }

    #[test]
    fn test_typed_system_access() {
        let (mut world, _, _) = recorder_world();
        assert!(world.system::<Recorder>().is_some());
        assert!(world.system_mut::<Recorder>().is_some());
        assert_eq!(world.system_count(), 1);
    }

    #[test]
    fn test_profiler_records_frames_when_enabled() {
        let mut world = World::new();
        world.update_systems(0.1);
        assert!(world.profiler().last("update_systems").is_none());

        world.profiler_mut().set_enabled(true);
        world.update_systems(0.1);
        assert!(world.profiler().last("update_systems").is_some());
    }

    struct Idle;

    impl System for Idle {
        fn required_components(&self, _components: &mut Components) -> EcsResult<Signature> {
            Ok(Signature::empty())
        }
    }

    #[test]
    fn test_awake_order_without_pending_entities() {
        let ids = |raw: &[u32]| raw.iter().map(|&i| EntityId::new(i)).collect::<Vec<_>>();
        let mut slot = SystemSlot::new(Box::new(Idle), Signature::empty());
        slot.members = ids(&[3, 1, 2]);

        assert!(awake_order(&[], &mut slot).is_empty());
        assert_eq!(slot.members, ids(&[3, 1, 2]));

        slot.joined = ids(&[1]);
        assert_eq!(awake_order(&[], &mut slot), ids(&[1]));
        assert!(slot.joined.is_empty());

        assert_eq!(awake_order(&ids(&[2, 5]), &mut slot), ids(&[2]));
    }
}
