//! Grid geometry
//!
//! A fixed TILE_COUNT x TILE_COUNT board. Coordinates are always integral;
//! positions leaving the board either wrap to the opposite edge or count as
//! out of bounds, depending on the level.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::consts::TILE_COUNT;

/// Four-connected movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// All directions in a fixed order (shuffle before use where randomness matters)
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit step on the grid (y grows downward)
    pub fn delta(self) -> IVec2 {
        match self {
            Direction::Up => IVec2::new(0, -1),
            Direction::Down => IVec2::new(0, 1),
            Direction::Left => IVec2::new(-1, 0),
            Direction::Right => IVec2::new(1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// True when the cell lies on the board
#[inline]
pub fn in_bounds(cell: IVec2) -> bool {
    (0..TILE_COUNT).contains(&cell.x) && (0..TILE_COUNT).contains(&cell.y)
}

/// Wrap a cell that stepped off one edge back in from the opposite edge
#[inline]
pub fn wrap(cell: IVec2) -> IVec2 {
    IVec2::new(cell.x.rem_euclid(TILE_COUNT), cell.y.rem_euclid(TILE_COUNT))
}

/// Manhattan distance between two cells
#[inline]
pub fn manhattan(a: IVec2, b: IVec2) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

/// Every cell of the board in column-major order
pub fn all_cells() -> impl Iterator<Item = IVec2> {
    (0..TILE_COUNT).flat_map(|x| (0..TILE_COUNT).map(move |y| IVec2::new(x, y)))
}
