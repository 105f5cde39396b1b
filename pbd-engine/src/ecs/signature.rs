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
//! Component signatures
//!
//! A signature is a fixed-width bitset over component type ids. Every live
//! entity has one recording which component types it carries, and every
//! system has one recording which types it requires.

use std::fmt;

/// Maximum number of distinct component types a world can register
pub const MAX_COMPONENT_TYPES: usize = 128;

/// Identifier assigned to a component type on first registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentTypeId(u32);

impl ComponentTypeId {
    /// Create a type id from its raw index
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below [`MAX_COMPONENT_TYPES`].
    pub fn new(index: u32) -> Self {
        assert!(
            (index as usize) < MAX_COMPONENT_TYPES,
            "Component type id out of range"
        );
        ComponentTypeId(index)
    }

    /// Index into per-type storage
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Bitset of component types
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Signature(u128);

impl Signature {
    /// The empty signature
    pub const fn empty() -> Self {
        Signature(0)
    }

    /// Return a copy with `id` set
    pub fn with(mut self, id: ComponentTypeId) -> Self {
        self.set(id);
        self
    }

    /// Set the bit for `id`
    pub fn set(&mut self, id: ComponentTypeId) {
        self.0 |= 1u128 << id.0;
    }

    /// Clear the bit for `id`
    pub fn clear(&mut self, id: ComponentTypeId) {
        self.0 &= !(1u128 << id.0);
    }

    /// Check the bit for `id`
    pub fn contains(&self, id: ComponentTypeId) -> bool {
        self.0 & (1u128 << id.0) != 0
    }

    /// True if every bit set in `required` is also set here
    pub fn is_superset_of(&self, required: &Signature) -> bool {
        self.0 & required.0 == required.0
    }

    /// Number of set bits
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// True if no bit is set
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterate over the set type ids in ascending order
    pub fn iter(&self) -> impl Iterator<Item = ComponentTypeId> + '_ {
        let bits = self.0;
        (0..MAX_COMPONENT_TYPES as u32)
            .filter(move |i| bits & (1u128 << i) != 0)
            .map(ComponentTypeId)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(|id| id.0)).finish()
    }
}
