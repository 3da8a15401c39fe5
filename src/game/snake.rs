//! Snake entity with movement and growth rules

use std::collections::VecDeque;

use super::direction::Direction;
use super::location::{Grid, Location};

/// A snake in an arena
#[derive(Debug, Clone)]
pub struct Snake {
    /// Snake colour (hex format)
    pub color: String,
    /// Current movement direction
    direction: Direction,
    /// Body segments (head is front, tail is back)
    body: VecDeque<Location>,
    /// Food eaten
    score: u32,
    /// Whether the snake is alive
    alive: bool,
    /// Moves left in which the tail is kept
    growth_pending: u32,
}

impl Snake {
    /// Create a one-cell snake heading right with `growth_pending` segments still to grow
    pub fn new(start: Location, color: impl Into<String>, growth_pending: u32) -> Self {
        let mut body = VecDeque::new();
        body.push_front(start);

        Self {
            color: color.into(),
            direction: Direction::Right,
            body,
            score: 0,
            alive: true,
            growth_pending,
        }
    }

    /// Build a snake from explicit cells, head first
    pub fn from_body(
        cells: impl IntoIterator<Item = Location>,
        direction: Direction,
        color: impl Into<String>,
    ) -> Option<Self> {
        let body: VecDeque<Location> = cells.into_iter().collect();
        if body.is_empty() {
            return None;
        }

        Some(Self {
            color: color.into(),
            direction,
            body,
            score: 0,
            alive: true,
            growth_pending: 0,
        })
    }

    /// The snake's head cell
    pub fn head(&self) -> Location {
        // The body is never empty: it starts with one cell and `move_forward`
        // pushes before it pops.
        self.body[0]
    }

    /// The last body cell
    pub fn tail(&self) -> Location {
        self.body[self.body.len() - 1]
    }

    /// All body cells, head first
    pub fn body(&self) -> &VecDeque<Location> {
        &self.body
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn growth_pending(&self) -> u32 {
        self.growth_pending
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Advance one cell. The tail is kept while growth is pending.
    pub fn move_forward(&mut self, grid: &Grid) {
        if !self.alive {
            return;
        }

        let new_head = grid.adjacent(self.head(), self.direction);
        self.body.push_front(new_head);

        if self.growth_pending > 0 {
            self.growth_pending -= 1;
        } else {
            self.body.pop_back();
        }
    }

    /// Turn to `direction` unless it reverses the current heading.
    /// Returns whether the direction was accepted.
    pub fn change_direction(&mut self, direction: Direction) -> bool {
        if self.direction.is_opposite(direction) {
            return false;
        }
        self.direction = direction;
        true
    }

    /// Queue one segment of growth and score a point
    pub fn grow(&mut self) {
        self.growth_pending += 1;
        self.score += 1;
    }

    /// Mark dead. Irreversible.
    pub fn kill(&mut self) {
        self.alive = false;
    }

    /// Head appears elsewhere in its own body
    pub fn collides_with_self(&self) -> bool {
        let head = self.head();
        self.body.iter().skip(1).any(|cell| *cell == head)
    }

    /// Head appears anywhere in `other`'s body, other's head included
    pub fn collides_with(&self, other: &Snake) -> bool {
        other.occupies(self.head())
    }

    /// Whether `loc` is one of this snake's cells
    pub fn occupies(&self, loc: Location) -> bool {
        self.body.contains(&loc)
    }
}
