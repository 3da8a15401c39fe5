//! Direction enum for snake movement

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Direction of movement on the torus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Moving up (y decreases)
    Up,
    /// Moving down (y increases)
    Down,
    /// Moving left (x decreases)
    Left,
    /// Moving right (x increases)
    Right,
}

impl Direction {
    /// All directions in enumeration order. The medium AI breaks ties by this order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit vector `(dx, dy)`
    pub fn vector(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// The 180 degree reversal
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Check if this direction is opposite to another
    pub fn is_opposite(self, other: Direction) -> bool {
        self.opposite() == other
    }

    /// The three directions that are not a reversal of `self`
    pub fn turns(self) -> impl Iterator<Item = Direction> {
        Direction::ALL
            .into_iter()
            .filter(move |d| !self.is_opposite(*d))
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" | "north" => Ok(Direction::Up),
            "down" | "south" => Ok(Direction::Down),
            "left" | "west" => Ok(Direction::Left),
            "right" | "east" => Ok(Direction::Right),
            other => Err(format!("unknown direction '{other}'")),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!("north".parse::<Direction>(), Ok(Direction::Up));
        assert_eq!("DOWN".parse::<Direction>(), Ok(Direction::Down));
        assert_eq!(" west ".parse::<Direction>(), Ok(Direction::Left));
        assert!("invalid".parse::<Direction>().is_err());
    }

    #[test]
    fn test_is_opposite() {
        assert!(Direction::Up.is_opposite(Direction::Down));
        assert!(Direction::Right.is_opposite(Direction::Left));
        assert!(!Direction::Up.is_opposite(Direction::Right));
        assert!(!Direction::Up.is_opposite(Direction::Up));
    }

    #[test]
    fn test_turns_exclude_reversal() {
        let turns: Vec<_> = Direction::Right.turns().collect();
        assert_eq!(turns, vec![Direction::Up, Direction::Down, Direction::Right]);
    }

    #[test]
    fn test_vectors_are_unit() {
        for d in Direction::ALL {
            let (dx, dy) = d.vector();
            assert_eq!(dx.abs() + dy.abs(), 1);
            let (ox, oy) = d.opposite().vector();
            assert_eq!((dx + ox, dy + oy), (0, 0));
        }
    }
}
