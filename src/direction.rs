//! Compass directions and grid coordinate arithmetic.
//!
//! Coordinates are signed so that a step off the edge of the grid is still
//! representable; callers decide whether to discard it or react to it.

use serde::{Deserialize, Serialize};

/// A (row, col) position. Rows grow downward, columns grow to the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub row: i64,
    pub col: i64,
}

impl Coord {
    pub const fn new(row: i64, col: i64) -> Self {
        Self { row, col }
    }

    pub fn in_bounds(self, grid_size: usize) -> bool {
        let size = grid_size as i64;
        (0..size).contains(&self.row) && (0..size).contains(&self.col)
    }
}

impl From<(usize, usize)> for Coord {
    fn from((row, col): (usize, usize)) -> Self {
        Self::new(row as i64, col as i64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Right,
    Left,
    UpRight,
    UpLeft,
    DownRight,
    DownLeft,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::Up,
        Direction::Down,
        Direction::Right,
        Direction::Left,
        Direction::UpRight,
        Direction::UpLeft,
        Direction::DownRight,
        Direction::DownLeft,
    ];

    /// Moves `from` one cell in this direction. Diagonals are the composition
    /// of their vertical and horizontal components.
    pub fn step(self, from: Coord) -> Coord {
        match self {
            Direction::Up => Coord::new(from.row - 1, from.col),
            Direction::Down => Coord::new(from.row + 1, from.col),
            Direction::Right => Coord::new(from.row, from.col + 1),
            Direction::Left => Coord::new(from.row, from.col - 1),
            Direction::UpRight => Direction::Right.step(Direction::Up.step(from)),
            Direction::UpLeft => Direction::Left.step(Direction::Up.step(from)),
            Direction::DownRight => Direction::Right.step(Direction::Down.step(from)),
            Direction::DownLeft => Direction::Left.step(Direction::Down.step(from)),
        }
    }

    /// Applies `step` `hops` times.
    pub fn step_n(self, from: Coord, hops: u32) -> Coord {
        (0..hops).fold(from, |coord, _| self.step(coord))
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Right => Direction::Left,
            Direction::Left => Direction::Right,
            Direction::UpRight => Direction::DownLeft,
            Direction::UpLeft => Direction::DownRight,
            Direction::DownRight => Direction::UpLeft,
            Direction::DownLeft => Direction::UpRight,
        }
    }

    fn points_up(self) -> bool {
        matches!(self, Direction::Up | Direction::UpLeft | Direction::UpRight)
    }

    fn points_down(self) -> bool {
        matches!(
            self,
            Direction::Down | Direction::DownLeft | Direction::DownRight
        )
    }

    fn points_left(self) -> bool {
        matches!(self, Direction::Left | Direction::UpLeft | Direction::DownLeft)
    }

    fn points_right(self) -> bool {
        matches!(
            self,
            Direction::Right | Direction::UpRight | Direction::DownRight
        )
    }
}

/// Directions that stay inside a `grid_size` x `grid_size` grid when taken
/// from `coord`, in `Direction::ALL` order.
pub fn legal_directions(coord: Coord, grid_size: usize) -> Vec<Direction> {
    let last = grid_size as i64 - 1;
    Direction::ALL
        .into_iter()
        .filter(|direction| !(coord.row == 0 && direction.points_up()))
        .filter(|direction| !(coord.col == 0 && direction.points_left()))
        .filter(|direction| !(coord.row == last && direction.points_down()))
        .filter(|direction| !(coord.col == last && direction.points_right()))
        .collect()
}
