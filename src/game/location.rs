//! Grid positions and torus topology

use serde::{Deserialize, Serialize};
use std::hash::Hash;

use super::direction::Direction;

/// A cell on the game grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub x: i32,
    pub y: i32,
}

impl Location {
    /// Create a new location
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Largest grid side the simulation accepts
pub const MAX_GRID_SIZE: u32 = 256;

/// Square wrap-around grid. Opposite edges are adjacent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    size: i32,
}

impl Grid {
    /// Create a grid of `size` x `size` cells, clamped to `1..=MAX_GRID_SIZE`
    pub fn new(size: u32) -> Self {
        let size = size.clamp(1, MAX_GRID_SIZE);
        Self {
            size: i32::try_from(size).unwrap_or(i32::MAX),
        }
    }

    /// Number of cells along one side
    pub fn size(&self) -> i32 {
        self.size
    }

    /// Reduce a coordinate pair modulo the grid size on both axes
    pub fn wrap(&self, loc: Location) -> Location {
        Location::new(loc.x.rem_euclid(self.size), loc.y.rem_euclid(self.size))
    }

    /// The neighbouring cell one step in `direction`, wrapped
    pub fn adjacent(&self, loc: Location, direction: Direction) -> Location {
        let (dx, dy) = direction.vector();
        self.wrap(Location::new(loc.x + dx, loc.y + dy))
    }

    /// Per-axis shortest distance under wrap-around
    pub fn axis_distances(&self, a: Location, b: Location) -> (i32, i32) {
        let a = self.wrap(a);
        let b = self.wrap(b);
        let dx = (a.x - b.x).abs();
        let dy = (a.y - b.y).abs();
        (dx.min(self.size - dx), dy.min(self.size - dy))
    }

    /// Manhattan distance on the torus
    pub fn toroidal_distance(&self, a: Location, b: Location) -> i32 {
        let (dx, dy) = self.axis_distances(a, b);
        dx + dy
    }

    /// The quarter point `(size/4, size/4)` scaled by `quarters`
    pub fn quarter_point(&self, quarters: i32) -> Location {
        Location::new(quarters * self.size / 4, quarters * self.size / 4)
    }

    /// Every cell, column-major (x outer, y inner)
    pub fn cells(&self) -> impl Iterator<Item = Location> + '_ {
        (0..self.size).flat_map(move |x| (0..self.size).map(move |y| Location::new(x, y)))
    }

    /// Total number of cells
    pub fn cell_count(&self) -> usize {
        (self.size as usize) * (self.size as usize)
    }
}
