use thiserror::Error;

use crate::cell::Cell;
use crate::direction::Coord;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("grid must contain at least one cell")]
    Empty,
    #[error("row {row} has {len} cells, expected {expected} for a square grid")]
    NotSquare {
        row: usize,
        len: usize,
        expected: usize,
    },
}

/// Square, row-major matrix of cells.
#[derive(Debug, Default, PartialEq)]
pub struct Grid {
    size: usize,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Result<Self, GridError> {
        let size = rows.len();
        if size == 0 {
            return Err(GridError::Empty);
        }
        if let Some((row, cells)) = rows.iter().enumerate().find(|(_, r)| r.len() != size) {
            return Err(GridError::NotSquare {
                row,
                len: cells.len(),
                expected: size,
            });
        }
        Ok(Self {
            size,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, coord: Coord) -> bool {
        coord.in_bounds(self.size)
    }

    pub fn get(&self, coord: Coord) -> Option<&Cell> {
        self.index_of(coord).map(|index| &self.cells[index])
    }

    pub fn get_mut(&mut self, coord: Coord) -> Option<&mut Cell> {
        let index = self.index_of(coord)?;
        Some(&mut self.cells[index])
    }

    pub fn coord_of(&self, index: usize) -> Coord {
        Coord::from((index / self.size, index % self.size))
    }

    /// Cells in row-major order with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, &Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(index, cell)| (self.coord_of(index), cell))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Coord, &mut Cell)> + '_ {
        let size = self.size;
        self.cells
            .iter_mut()
            .enumerate()
            .map(move |(index, cell)| (Coord::from((index / size, index % size)), cell))
    }

    fn index_of(&self, coord: Coord) -> Option<usize> {
        self.contains(coord)
            .then(|| coord.row as usize * self.size + coord.col as usize)
    }
}
