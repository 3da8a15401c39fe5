//! Game module

pub mod arena;
pub mod collision;
pub mod direction;
pub mod food;
pub mod location;
pub mod snake;

pub use arena::{Arena, ArenaSnapshot, GameMode, PlayerId, SnakeSnapshot, TickOutcome};
pub use direction::Direction;
pub use location::{Grid, Location};
pub use snake::Snake;
