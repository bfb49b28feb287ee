//! Grid primitives: cells, directions, and door masks.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An integer grid coordinate identifying a potential room slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
}

impl GridCell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell one step away in `dir`.
    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.offset();
        Self::new(self.x + dx, self.y + dy)
    }

    /// All four axis-aligned neighbours, in `Direction::ALL` order.
    pub fn neighbors(self) -> [GridCell; 4] {
        Direction::ALL.map(|d| self.step(d))
    }

    pub fn in_bounds(self, width: i32, height: i32) -> bool {
        self.x >= 0 && self.x < width && self.y >= 0 && self.y < height
    }

    /// Manhattan distance; adjacency is exactly distance 1.
    pub fn manhattan(self, other: GridCell) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Direction from `self` to an adjacent `other`, if they are adjacent.
    pub fn direction_to(self, other: GridCell) -> Option<Direction> {
        Direction::ALL.into_iter().find(|d| self.step(*d) == other)
    }
}

impl From<(i32, i32)> for GridCell {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl fmt::Display for GridCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Axis-aligned direction. North is `+y`, East is `+x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::South => (0, -1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    fn bit(self) -> u8 {
        match self {
            Direction::North => 0b0001,
            Direction::South => 0b0010,
            Direction::East => 0b0100,
            Direction::West => 0b1000,
        }
    }
}

/// One "door present" bit per direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DoorMask(u8);

impl DoorMask {
    pub const NONE: DoorMask = DoorMask(0);
    pub const ALL: DoorMask = DoorMask(0b1111);

    pub fn from_flags(north: bool, south: bool, east: bool, west: bool) -> Self {
        let mut mask = DoorMask::NONE;
        mask.set(Direction::North, north);
        mask.set(Direction::South, south);
        mask.set(Direction::East, east);
        mask.set(Direction::West, west);
        mask
    }

    pub fn has(self, dir: Direction) -> bool {
        self.0 & dir.bit() != 0
    }

    pub fn set(&mut self, dir: Direction, present: bool) {
        if present {
            self.0 |= dir.bit();
        } else {
            self.0 &= !dir.bit();
        }
    }

    pub fn with(mut self, dir: Direction) -> Self {
        self.set(dir, true);
        self
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Directions with a door, in `Direction::ALL` order.
    pub fn directions(self) -> impl Iterator<Item = Direction> {
        Direction::ALL.into_iter().filter(move |d| self.has(*d))
    }
}

impl fmt::Display for DoorMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |d: Direction, c: char| if self.has(d) { c } else { '-' };
        write!(
            f,
            "{}{}{}{}",
            flag(Direction::North, 'N'),
            flag(Direction::South, 'S'),
            flag(Direction::East, 'E'),
            flag(Direction::West, 'W')
        )
    }
}
