//! Read-only view of the grid handed to renderers and the CLI.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cell::{Cell, CellKind};
use crate::direction::Direction;
use crate::grid::Grid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindSnapshot {
    pub direction: Direction,
    pub speed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellSnapshot {
    pub row: usize,
    pub col: usize,
    pub kind: CellKind,
    pub temperature: f64,
    pub air_pollution: f64,
    pub wind: Option<WindSnapshot>,
    pub precipitation: Option<u8>,
}

impl CellSnapshot {
    fn capture(row: usize, col: usize, cell: &Cell) -> Self {
        Self {
            row,
            col,
            kind: cell.kind(),
            temperature: cell.temperature(),
            air_pollution: cell.air_pollution(),
            wind: cell.wind().map(|wind| WindSnapshot {
                direction: wind.direction(),
                speed: wind.speed(),
            }),
            precipitation: cell.cloud().map(|cloud| cloud.precipitation()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub generation: u64,
    pub size: usize,
    pub cells: Vec<CellSnapshot>,
}

/// Aggregate figures over one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Census {
    pub kinds: BTreeMap<String, usize>,
    pub winds: usize,
    pub clouds: usize,
    pub mean_temperature: f64,
    pub mean_air_pollution: f64,
}

impl GridSnapshot {
    pub fn capture(generation: u64, grid: &Grid) -> Self {
        let cells = grid
            .iter()
            .map(|(coord, cell)| {
                CellSnapshot::capture(coord.row as usize, coord.col as usize, cell)
            })
            .collect();
        Self {
            generation,
            size: grid.size(),
            cells,
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&CellSnapshot> {
        if row >= self.size || col >= self.size {
            return None;
        }
        self.cells.get(row * self.size + col)
    }

    pub fn count(&self, kind: CellKind) -> usize {
        self.cells.iter().filter(|cell| cell.kind == kind).count()
    }

    pub fn census(&self) -> Census {
        let mut kinds = BTreeMap::new();
        for kind in CellKind::ALL {
            kinds.insert(kind_label(kind).to_string(), self.count(kind));
        }
        let total = self.cells.len().max(1) as f64;
        Census {
            kinds,
            winds: self.cells.iter().filter(|c| c.wind.is_some()).count(),
            clouds: self
                .cells
                .iter()
                .filter(|c| c.precipitation.is_some())
                .count(),
            mean_temperature: self.cells.iter().map(|c| c.temperature).sum::<f64>() / total,
            mean_air_pollution: self.cells.iter().map(|c| c.air_pollution).sum::<f64>() / total,
        }
    }
}

fn kind_label(kind: CellKind) -> &'static str {
    match kind {
        CellKind::Earth => "earth",
        CellKind::Sea => "sea",
        CellKind::City => "city",
        CellKind::Iceberg => "iceberg",
        CellKind::Forest => "forest",
    }
}
