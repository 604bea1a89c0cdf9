use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Direction;

/// A point on a deployment zone grid. North is `+y`, east is `+x`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl Coordinate {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset from this coordinate to `other`, as `(dx, dy)`.
    pub fn difference(self, other: Coordinate) -> (i32, i32) {
        (other.x - self.x, other.y - self.y)
    }

    /// Direction of `other` seen from here. Only defined when the two share an axis;
    /// diagonal offsets yield `Direction::Indeterminate`.
    pub fn direction(self, other: Coordinate) -> Direction {
        match self.difference(other) {
            (0, 0) => Direction::Center,
            (dx, 0) if dx > 0 => Direction::East,
            (_, 0) => Direction::West,
            (0, dy) if dy > 0 => Direction::North,
            (0, _) => Direction::South,
            _ => Direction::Indeterminate,
        }
    }

    /// One step in `direction`. `Center` and `Indeterminate` stay in place.
    pub fn translate(self, direction: Direction) -> Coordinate {
        match direction {
            Direction::North => Coordinate::new(self.x, self.y + 1),
            Direction::South => Coordinate::new(self.x, self.y - 1),
            Direction::East => Coordinate::new(self.x + 1, self.y),
            Direction::West => Coordinate::new(self.x - 1, self.y),
            Direction::Center | Direction::Indeterminate => self,
        }
    }

    /// Neighbours in the order contexts are reported: north, south, east, west.
    pub fn cardinals(self) -> [Coordinate; 4] {
        Direction::CARDINALS.map(|direction| self.translate(direction))
    }

    pub fn manhattan(self, other: Coordinate) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    pub fn is_adjacent(self, other: Coordinate) -> bool {
        self.manhattan(other) == 1
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
