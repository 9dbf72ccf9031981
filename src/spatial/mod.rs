use glam::Vec2;

use crate::config::Bounds;
use crate::ecs::components::PetId;

/// Snapshot of a pet's state for pairwise interaction checks.
/// Stored alongside the grid to avoid ECS lookups in the pair loop.
#[derive(Debug, Clone, Copy)]
pub struct PetSnapshot {
    pub entity: hecs::Entity,
    pub id: PetId,
    pub pos: Vec2,
    /// Free to start a new interaction this tick.
    pub available: bool,
}

/// Dense uniform grid over the canvas for neighbor queries.
///
/// Cell size should be at least the largest query radius so the 3x3 block
/// around a cell covers every candidate. Positions off the canvas land in
/// the border cells.
pub struct SpatialGrid {
    inv_cell_size: f32,
    cols: usize,
    rows: usize,
    /// Each cell holds snapshot indices. Cleared, not freed, on rebuild.
    cells: Vec<Vec<u32>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32, bounds: Bounds) -> Self {
        let mut grid = Self {
            inv_cell_size: 1.0 / cell_size,
            cols: 0,
            rows: 0,
            cells: Vec::new(),
        };
        grid.resize(bounds);
        grid
    }

    /// Re-shape for a new canvas size. Drops current contents.
    pub fn resize(&mut self, bounds: Bounds) {
        let cols = ((bounds.width * self.inv_cell_size).ceil() as usize).max(1);
        let rows = ((bounds.height * self.inv_cell_size).ceil() as usize).max(1);
        if cols == self.cols && rows == self.rows {
            self.clear();
            return;
        }
        self.cols = cols;
        self.rows = rows;
        self.cells = (0..cols * rows).map(|_| Vec::with_capacity(4)).collect();
    }

    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    pub fn insert(&mut self, pos: Vec2, index: u32) {
        let (cx, cy) = self.cell_coords(pos);
        let slot = cy * self.cols + cx;
        self.cells[slot].push(index);
    }

    /// Visit every index in the same cell and the 8 surrounding cells.
    /// Each stored index is visited at most once.
    pub fn query_neighbors(&self, pos: Vec2, mut callback: impl FnMut(u32)) {
        let (cx, cy) = self.cell_coords(pos);
        let x_range = cx.saturating_sub(1)..=(cx + 1).min(self.cols - 1);
        for y in cy.saturating_sub(1)..=(cy + 1).min(self.rows - 1) {
            for x in x_range.clone() {
                for &index in &self.cells[y * self.cols + x] {
                    callback(index);
                }
            }
        }
    }

    fn cell_coords(&self, pos: Vec2) -> (usize, usize) {
        let cx = (pos.x * self.inv_cell_size).floor().max(0.0) as usize;
        let cy = (pos.y * self.inv_cell_size).floor().max(0.0) as usize;
        (cx.min(self.cols - 1), cy.min(self.rows - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_query() {
        let mut grid = SpatialGrid::new(80.0, Bounds::new(800.0, 600.0));
        grid.insert(Vec2::new(100.0, 100.0), 0);
        grid.insert(Vec2::new(150.0, 105.0), 1);
        grid.insert(Vec2::new(700.0, 500.0), 2);

        let mut found = Vec::new();
        grid.query_neighbors(Vec2::new(105.0, 102.0), |idx| found.push(idx));

        assert!(found.contains(&0));
        assert!(found.contains(&1));
        assert!(!found.contains(&2));
    }

    #[test]
    fn off_canvas_positions_land_on_border() {
        let mut grid = SpatialGrid::new(80.0, Bounds::new(800.0, 600.0));
        grid.insert(Vec2::new(-50.0, 9000.0), 5);

        let mut found = Vec::new();
        grid.query_neighbors(Vec2::new(10.0, 590.0), |idx| found.push(idx));
        assert_eq!(found, vec![5]);
    }

    #[test]
    fn clear_and_resize() {
        let mut grid = SpatialGrid::new(80.0, Bounds::new(800.0, 600.0));
        grid.insert(Vec2::new(50.0, 50.0), 42);
        grid.resize(Bounds::new(1600.0, 900.0));

        let mut found = Vec::new();
        grid.query_neighbors(Vec2::new(50.0, 50.0), |idx| found.push(idx));
        assert!(found.is_empty());
    }
}
