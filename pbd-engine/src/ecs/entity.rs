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
//! Entity management
//!
//! Entities are opaque identifiers that tie components together. Ids are
//! handed out from a FIFO free queue that is refilled with a fresh batch
//! whenever it runs dry; deleted ids go to the back of the queue and are
//! reused once the ids ahead of them have been consumed.

use std::collections::{HashSet, VecDeque};
use std::fmt;

/// Number of fresh ids added to the free queue each time it runs dry
pub const ENTITY_BATCH_SIZE: usize = 5000;

/// Unique identifier for an entity
///
/// Ids are unique while the entity is alive and recycled after deletion.
/// Their ordering is only used to make iteration deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(u32);

impl EntityId {
    /// Create a new EntityId from a raw u32 value
    pub fn new(id: u32) -> Self {
        EntityId(id)
    }

    /// Get the raw u32 value
    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Allocates and recycles entity ids
#[derive(Debug)]
pub struct EntityRegistry {
    available: VecDeque<EntityId>,
    issued: u32,
    batch_size: usize,
    live: Vec<EntityId>,
    alive: HashSet<EntityId>,
}

impl EntityRegistry {
    /// Create a registry that refills in batches of [`ENTITY_BATCH_SIZE`]
    pub fn new() -> Self {
        Self::with_batch_size(ENTITY_BATCH_SIZE)
    }

    /// Create a registry with a custom refill batch size
    ///
    /// # Panics
    ///
    /// Panics if `batch_size` is zero.
    pub fn with_batch_size(batch_size: usize) -> Self {
        assert!(batch_size > 0, "Entity batch size must be positive");
        let mut registry = EntityRegistry {
            available: VecDeque::with_capacity(batch_size),
            issued: 0,
            batch_size,
            live: Vec::new(),
            alive: HashSet::new(),
        };
        registry.refill();
        registry
    }

    /// Hand out a fresh or recycled id
    pub fn allocate(&mut self) -> EntityId {
        let entity = loop {
            if let Some(entity) = self.available.pop_front() {
                break entity;
            }
            self.refill();
        };
        self.live.push(entity);
        self.alive.insert(entity);
        entity
    }

    /// Return an id to the free queue
    ///
    /// Returns false if the id was not alive.
    pub fn release(&mut self, entity: EntityId) -> bool {
        if !self.alive.remove(&entity) {
            return false;
        }
        self.live.retain(|&e| e != entity);
        self.available.push_back(entity);
        true
    }

    /// Check if an id is currently alive
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.alive.contains(&entity)
    }

    /// Live ids in creation order
    pub fn live(&self) -> &[EntityId] {
        &self.live
    }

    /// Number of live ids
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Check if no ids are alive
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Total number of distinct ids ever created
    pub fn capacity(&self) -> usize {
        self.issued as usize
    }

    fn refill(&mut self) {
        let start = self.issued;
        let end = start.saturating_add(self.batch_size as u32);
        assert!(end > start, "Entity id space exhausted");
        self.available.extend((start..end).map(EntityId::new));
        self.issued = end;
        log::trace!("entity pool grown to {} ids", self.issued);
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_ordering() {
        let e1 = EntityId::new(1);
        let e2 = EntityId::new(2);
        assert!(e1 < e2);
        assert_eq!(e1.raw(), 1);
        assert_eq!(format!("{}", e2), "Entity(2)");
    }

    #[test]
    fn test_allocation_is_sequential() {
        let mut registry = EntityRegistry::new();
        let ids: Vec<u32> = (0..4).map(|_| registry.allocate().raw()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.capacity(), ENTITY_BATCH_SIZE);
    }

    #[test]
    fn test_refill_in_batches() {
        let mut registry = EntityRegistry::with_batch_size(2);
        assert_eq!(registry.capacity(), 2);

        registry.allocate();
        registry.allocate();
        let third = registry.allocate();

        assert_eq!(third.raw(), 2);
        assert_eq!(registry.capacity(), 4);
    }

    #[test]
    fn test_recycling_is_fifo() {
        let mut registry = EntityRegistry::with_batch_size(2);
        let e0 = registry.allocate();
        let e1 = registry.allocate();

        assert!(registry.release(e0));
        assert!(!registry.is_alive(e0));

        // The queue was empty, so the released id comes straight back
        let recycled = registry.allocate();
        assert_eq!(recycled, e0);
        assert!(registry.is_alive(e1));

        registry.release(e1);
        assert_eq!(registry.allocate(), e1);
    }

    #[test]
    fn test_fresh_ids_before_recycled() {
        let mut registry = EntityRegistry::with_batch_size(4);
        let e0 = registry.allocate();
        assert!(registry.release(e0));

        // 1..=3 are still queued ahead of the released id
        let order: Vec<u32> = (0..4).map(|_| registry.allocate().raw()).collect();
        assert_eq!(order, vec![1, 2, 3, 0]);
        assert_eq!(registry.capacity(), 4);
    }

    #[test]
    fn test_release_dead_entity() {
        let mut registry = EntityRegistry::new();
        let e = registry.allocate();
        assert!(registry.release(e));
        assert!(!registry.release(e));
        assert!(!registry.release(EntityId::new(9999)));
    }

    #[test]
    fn test_live_order() {
        let mut registry = EntityRegistry::new();
        let a = registry.allocate();
        let b = registry.allocate();
        let c = registry.allocate();
        registry.release(b);
        assert_eq!(registry.live(), &[a, c]);
    }
}
