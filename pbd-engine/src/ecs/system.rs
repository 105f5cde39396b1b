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
//! System execution framework
//!
//! Systems contain the logic that operates on entities and components.
//! Each system declares the component types it needs; the world keeps a
//! member list per system holding every entity whose signature covers
//! those types, and drives the lifecycle hooks below.
//!
//! # Lifecycle
//!
//! - `start` once, when the system is registered
//! - `awake` once per entity, on the first frame after it joins the system
//! - `update` once per frame with the member list
//! - `update_entity` once per frame per member, after `update`
//! - `remove` when an entity leaves the system

use crate::ecs::{Components, EntityId, Signature};
use crate::error::EcsResult;
use crate::profiling::Profiler;
use crate::render::DebugRenderer;
use std::any::Any;

/// Everything a system may touch while a hook runs
///
/// Systems get the component stores and the frame collaborators, but not
/// the world itself, so they cannot create entities or change signatures
/// mid-frame.
pub struct SystemContext<'a> {
    /// Component stores
    pub components: &'a mut Components,
    /// Debug line sink
    pub renderer: &'a mut dyn DebugRenderer,
    /// Frame profiler
    pub profiler: &'a mut Profiler,
}

/// Upcast to [`Any`] so registered systems can be looked up by type
pub trait AsAny: Any {
    /// Borrow as `&dyn Any`
    fn as_any(&self) -> &dyn Any;

    /// Borrow as `&mut dyn Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Trait for systems that operate on the ECS world
///
/// Only [`System::required_components`] is mandatory; every hook defaults to
/// doing nothing.
///
/// # Example
///
/// ```
/// use pbd_engine::ecs::{Components, EntityId, Signature, System, SystemContext, World};
/// use pbd_engine::ecs::components::Transform;
/// use pbd_engine::error::EcsResult;
///
/// #[derive(Default)]
/// struct Drift;
///
/// impl System for Drift {
///     fn required_components(&self, components: &mut Components) -> EcsResult<Signature> {
///         components.signature_of::<(Transform,)>()
///     }
///
///     fn update_entity(&mut self, ctx: &mut SystemContext<'_>, entity: EntityId, dt: f32) {
///         ctx.components.get_mut::<Transform>(entity).position.x += dt;
///     }
/// }
///
/// let mut world = World::new();
/// world.register_system(Drift).unwrap();
/// let entity = world.create_entity();
/// world.add_component::<Transform>(entity);
/// world.update_systems(0.5);
/// assert_eq!(world.component::<Transform>(entity).position.x, 0.5);
/// ```
pub trait System: AsAny + Send {
    /// Component types an entity must carry to be a member
    ///
    /// Called once at registration; types are registered as needed.
    fn required_components(&self, components: &mut Components) -> EcsResult<Signature>;

    /// Called once when the system is registered
    fn start(&mut self, _ctx: &mut SystemContext<'_>) {}

    /// Called once for each entity on the first frame after it joins
    fn awake(&mut self, _ctx: &mut SystemContext<'_>, _entity: EntityId) {}

    /// Called once per frame with the current members
    ///
    /// The slice may be reordered; later per-entity updates follow the new order.
    fn update(&mut self, _ctx: &mut SystemContext<'_>, _members: &mut [EntityId], _dt: f32) {}

    /// Called once per frame per member, after [`System::update`]
    fn update_entity(&mut self, _ctx: &mut SystemContext<'_>, _entity: EntityId, _dt: f32) {}

    /// Called when an entity leaves the system, before its components are dropped
    fn remove(&mut self, _ctx: &mut SystemContext<'_>, _entity: EntityId) {}

    /// Get the name of this system for debugging
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Handle to a registered system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SystemId(pub(crate) usize);

impl SystemId {
    /// Registration index
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A registered system plus its bookkeeping
pub(crate) struct SystemSlot {
    pub(crate) system: Box<dyn System>,
    pub(crate) signature: Signature,
    pub(crate) members: Vec<EntityId>,
    /// Members that joined after their creation frame and still await `awake`
    pub(crate) joined: Vec<EntityId>,
}

impl SystemSlot {
    pub(crate) fn new(system: Box<dyn System>, signature: Signature) -> Self {
        SystemSlot {
            system,
            signature,
            members: Vec::new(),
            joined: Vec::new(),
        }
    }

    /// Drop an entity from the member list, keeping member order
    pub(crate) fn forget(&mut self, entity: EntityId) -> bool {
        self.joined.retain(|&e| e != entity);
        match self.members.iter().position(|&e| e == entity) {
            Some(index) => {
                self.members.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn contains(&self, entity: EntityId) -> bool {
        self.members.contains(&entity)
    }

    /// Typed view of the boxed system
    pub(crate) fn downcast_ref<S: System>(&self) -> Option<&S> {
        (*self.system).as_any().downcast_ref()
    }

    pub(crate) fn downcast_mut<S: System>(&mut self) -> Option<&mut S> {
        (*self.system).as_any_mut().downcast_mut()
    }
}

/// Entities present in both sorted slices, in ascending order
pub(crate) fn sorted_intersection(a: &[EntityId], b: &[EntityId]) -> Vec<EntityId> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}
