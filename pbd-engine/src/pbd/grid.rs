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
//! Uniform spatial hash grid
//!
//! Space is cut into square cells of a fixed size. Each occupied cell keeps
//! the ids filed under it in insertion order, so neighbourhood queries are
//! deterministic. Cells are created on demand and dropped once empty.
//!
//! Coordinates are floored and converted with Rust's saturating float to
//! integer cast: positions beyond the `i32` range land in the outermost
//! cells and NaN lands in cell 0. No position is ever rejected.

use crate::ecs::EntityId;
use crate::error::{PbdError, PbdResult};
use glam::Vec2;
use std::collections::HashMap;

/// Integer coordinates of a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellCoord {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl CellCoord {
    /// Create a cell coordinate
    pub const fn new(x: i32, y: i32) -> Self {
        CellCoord { x, y }
    }

    /// Cell offset by `(dx, dy)`, clamped at the edges of the coordinate range
    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        CellCoord::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }
}

/// Map from cells to the entities inside them
///
/// # Example
///
/// ```
/// use pbd_engine::pbd::SpatialGrid;
/// use pbd_engine::ecs::EntityId;
/// use glam::Vec2;
///
/// let mut grid = SpatialGrid::new(2.0).unwrap();
/// let a = EntityId::new(0);
/// let b = EntityId::new(1);
/// grid.insert(Vec2::new(0.5, 0.5), a);
/// grid.insert(Vec2::new(2.5, 0.5), b);
///
/// let mut near = Vec::new();
/// grid.surrounding(Vec2::new(0.5, 0.5), &mut near);
/// assert_eq!(near, vec![a, b]);
/// ```
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<CellCoord, Vec<EntityId>>,
}

impl SpatialGrid {
    /// Create an empty grid
    ///
    /// Fails unless `cell_size` is positive and finite.
    pub fn new(cell_size: f32) -> PbdResult<Self> {
        if !(cell_size > 0.0 && cell_size.is_finite()) {
            return Err(PbdError::InvalidCellSize(cell_size));
        }
        Ok(SpatialGrid {
            cell_size,
            cells: HashMap::new(),
        })
    }

    /// Edge length of a cell
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Cell containing `position`
    pub fn cell_of(&self, position: Vec2) -> CellCoord {
        CellCoord::new(
            (position.x / self.cell_size).floor() as i32,
            (position.y / self.cell_size).floor() as i32,
        )
    }

    /// File `entity` under the cell of `position`
    ///
    /// Inserting an entity already present in that cell does nothing.
    pub fn insert(&mut self, position: Vec2, entity: EntityId) {
        self.insert_into(self.cell_of(position), entity);
    }

    /// File `entity` under `coord`; does nothing if it is already there
    pub fn insert_into(&mut self, coord: CellCoord, entity: EntityId) {
        let cell = self.cells.entry(coord).or_default();
        if !cell.contains(&entity) {
            cell.push(entity);
        }
    }

    /// Remove `entity` from the cell of `position`
    ///
    /// Returns false if it was not filed there.
    pub fn remove(&mut self, position: Vec2, entity: EntityId) -> bool {
        self.remove_from(self.cell_of(position), entity)
    }

    /// Remove `entity` from `coord`, dropping the cell once it is empty
    pub fn remove_from(&mut self, coord: CellCoord, entity: EntityId) -> bool {
        let Some(cell) = self.cells.get_mut(&coord) else {
            return false;
        };
        let Some(index) = cell.iter().position(|&e| e == entity) else {
            return false;
        };

        cell.remove(index);
        if cell.is_empty() {
            self.cells.remove(&coord);
        }
        true
    }

    /// Move `entity` from the cell of `old` to the cell of `new`
    ///
    /// When both positions share a cell nothing moves, but the entity is
    /// guaranteed to be present afterwards.
    pub fn change(&mut self, old: Vec2, new: Vec2, entity: EntityId) {
        if self.cell_of(old) != self.cell_of(new) {
            self.remove(old, entity);
        }
        self.insert(new, entity);
    }

    /// Append every id in the 3x3 block of cells around `position`
    ///
    /// Cells are visited row by row starting at the lower-left one. No
    /// distance filtering is done; callers test actual proximity.
    pub fn surrounding(&self, position: Vec2, out: &mut Vec<EntityId>) {
        let center = self.cell_of(position);
        let mut visited: [Option<CellCoord>; 9] = [None; 9];
        let mut count = 0;

        for dy in -1..=1 {
            for dx in -1..=1 {
                let coord = center.offset(dx, dy);
                // Saturation folds neighbours together at the range edges
                if visited[..count].contains(&Some(coord)) {
                    continue;
                }
                visited[count] = Some(coord);
                count += 1;

                if let Some(cell) = self.cells.get(&coord) {
                    out.extend_from_slice(cell);
                }
            }
        }
    }

    /// Check if `entity` is filed under the cell of `position`
    pub fn contains(&self, position: Vec2, entity: EntityId) -> bool {
        self.cells
            .get(&self.cell_of(position))
            .map_or(false, |cell| cell.contains(&entity))
    }

    /// Ids filed under a cell
    pub fn cell(&self, coord: CellCoord) -> &[EntityId] {
        self.cells.get(&coord).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of filed ids
    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    /// Check if nothing is filed
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of occupied cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Remove everything
    pub fn clear(&mut self) {
        self.cells.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(id: u32) -> EntityId {
        EntityId::new(id)
    }

    #[test]
    fn test_invalid_cell_size() {
        assert_eq!(SpatialGrid::new(0.0).unwrap_err(), PbdError::InvalidCellSize(0.0));
        assert!(SpatialGrid::new(-1.0).is_err());
        assert!(SpatialGrid::new(f32::INFINITY).is_err());
        assert!(SpatialGrid::new(f32::NAN).is_err());
    }

    #[test]
    fn test_cell_of_floors() {
        let grid = SpatialGrid::new(2.0).unwrap();
        assert_eq!(grid.cell_of(Vec2::new(0.0, 0.0)), CellCoord::new(0, 0));
        assert_eq!(grid.cell_of(Vec2::new(1.99, 3.9)), CellCoord::new(0, 1));
        assert_eq!(grid.cell_of(Vec2::new(-0.1, -2.0)), CellCoord::new(-1, -1));
        assert_eq!(grid.cell_of(Vec2::new(-2.1, 4.0)), CellCoord::new(-2, 2));
    }

    #[test]
    fn test_cell_of_saturates() {
        let grid = SpatialGrid::new(1.0).unwrap();
        assert_eq!(
            grid.cell_of(Vec2::new(f32::MAX, f32::MIN)),
            CellCoord::new(i32::MAX, i32::MIN)
        );
        assert_eq!(grid.cell_of(Vec2::new(f32::NAN, 0.5)), CellCoord::new(0, 0));
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut grid = SpatialGrid::new(1.0).unwrap();
        grid.insert(Vec2::new(0.2, 0.2), e(1));
        grid.insert(Vec2::new(0.8, 0.3), e(1));
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.cell_count(), 1);
    }

    #[test]
    fn test_remove_drops_empty_cells() {
        let mut grid = SpatialGrid::new(1.0).unwrap();
        let p = Vec2::new(5.5, 5.5);
        grid.insert(p, e(1));
        grid.insert(p, e(2));

        assert!(grid.remove(p, e(1)));
        assert!(!grid.remove(p, e(1)));
        assert_eq!(grid.cell(grid.cell_of(p)), &[e(2)]);

        assert!(grid.remove(p, e(2)));
        assert!(grid.is_empty());
        assert!(!grid.remove(Vec2::ZERO, e(2)));
    }

    #[test]
    fn test_cell_addressed_operations() {
        let mut grid = SpatialGrid::new(1.0).unwrap();
        let coord = CellCoord::new(-3, 7);
        grid.insert_into(coord, e(1));
        grid.insert_into(coord, e(1));
        assert_eq!(grid.cell(coord), &[e(1)]);
        assert!(grid.contains(Vec2::new(-2.5, 7.5), e(1)));

        assert!(grid.remove_from(coord, e(1)));
        assert!(!grid.remove_from(coord, e(1)));
        assert!(grid.is_empty());
    }

    #[test]
    fn test_change_across_cells() {
        let mut grid = SpatialGrid::new(1.0).unwrap();
        let old = Vec2::new(0.5, 0.5);
        let new = Vec2::new(3.5, 0.5);
        grid.insert(old, e(1));

        grid.change(old, new, e(1));
        assert!(!grid.contains(old, e(1)));
        assert!(grid.contains(new, e(1)));
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_change_within_cell_guarantees_presence() {
        let mut grid = SpatialGrid::new(1.0).unwrap();
        let old = Vec2::new(0.1, 0.1);
        let new = Vec2::new(0.9, 0.9);

        // Not filed yet: change still inserts
        grid.change(old, new, e(1));
        assert!(grid.contains(new, e(1)));

        grid.change(old, new, e(1));
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_surrounding_covers_3x3_block() {
        let mut grid = SpatialGrid::new(1.0).unwrap();
        // One entity per cell in a 5x5 block centred on the origin cell
        let mut id = 0;
        for y in -2..=2 {
            for x in -2..=2 {
                grid.insert(Vec2::new(x as f32 + 0.5, y as f32 + 0.5), e(id));
                id += 1;
            }
        }

        let mut near = Vec::new();
        grid.surrounding(Vec2::new(0.5, 0.5), &mut near);
        // Row-major from the lower-left cell (-1, -1)
        assert_eq!(near, vec![e(6), e(7), e(8), e(11), e(12), e(13), e(16), e(17), e(18)]);
    }

    #[test]
    fn test_surrounding_appends() {
        let mut grid = SpatialGrid::new(1.0).unwrap();
        grid.insert(Vec2::ZERO, e(4));

        let mut out = vec![e(99)];
        grid.surrounding(Vec2::ZERO, &mut out);
        assert_eq!(out, vec![e(99), e(4)]);
    }

    #[test]
    fn test_surrounding_at_range_edge_visits_cells_once() {
        let mut grid = SpatialGrid::new(1.0).unwrap();
        let far = Vec2::new(f32::MAX, f32::MAX);
        grid.insert(far, e(1));

        let mut near = Vec::new();
        grid.surrounding(far, &mut near);
        assert_eq!(near, vec![e(1)]);
    }
}
