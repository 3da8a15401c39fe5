//! Food cells on the grid

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use super::location::{Grid, Location};

/// Food cells in spawn order. Cells are distinct.
#[derive(Debug, Clone, Default)]
pub struct FoodSupply {
    cells: Vec<Location>,
}

impl FoodSupply {
    pub fn new() -> Self {
        Self { cells: Vec::new() }
    }

    /// Food cells in spawn order
    pub fn cells(&self) -> &[Location] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Check if there is food at `loc`
    pub fn is_at(&self, loc: Location) -> bool {
        self.cells.contains(&loc)
    }

    /// Remove the food at `loc`. Returns whether there was any.
    pub fn take(&mut self, loc: Location) -> bool {
        match self.cells.iter().position(|cell| *cell == loc) {
            Some(index) => {
                self.cells.remove(index);
                true
            }
            None => false,
        }
    }

    /// Place food at an explicit cell, ignoring duplicates
    pub fn place(&mut self, loc: Location) -> bool {
        if self.is_at(loc) {
            return false;
        }
        self.cells.push(loc);
        true
    }

    /// Spawn one food item on a uniformly chosen cell that is neither in
    /// `occupied` nor already food. Returns `None` when the grid is full.
    pub fn spawn<R: Rng + ?Sized>(
        &mut self,
        grid: &Grid,
        occupied: &HashSet<Location>,
        rng: &mut R,
    ) -> Option<Location> {
        let empty: Vec<Location> = grid
            .cells()
            .filter(|cell| !occupied.contains(cell) && !self.is_at(*cell))
            .collect();

        let chosen = *empty.choose(rng)?;
        self.cells.push(chosen);
        Some(chosen)
    }
}
