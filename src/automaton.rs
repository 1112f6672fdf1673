//! Generation loop.
//!
//! A step runs in two passes over the grid. The first lets every cell update
//! itself in row-major order and collects the change-sets it reports. The
//! second applies those change-sets, in the same order, to the grid that
//! already holds the locally updated cells, so diffusion from a neighbor lands
//! on top of that neighbor's own update. Winds leaving their cell are held in
//! transit until every change-set has been applied and are then settled so no
//! two winds ever share a cell.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use crate::cell::{Cell, ChangeSet, EnvironmentEffect, Field, NeighborEffect};
use crate::direction::{legal_directions, Coord};
use crate::environment::{Cloud, Wind, WindAdvance};
use crate::grid::{Grid, GridError};
use crate::snapshot::GridSnapshot;

/// Counters describing what happened during one generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    pub generation: u64,
    pub transitions: usize,
    pub winds_moved: usize,
    pub winds_reversed: usize,
    pub winds_blocked: usize,
}

pub struct Automaton {
    grid: Grid,
    generation: u64,
}

struct WindTransit {
    origin: Coord,
    destination: Coord,
    wind: Wind,
    cloud: Option<Cloud>,
}

impl Automaton {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            generation: 0,
        }
    }

    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Result<Self, GridError> {
        Grid::from_rows(rows).map(Self::new)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot::capture(self.generation, &self.grid)
    }

    pub fn run(&mut self, generations: u64) -> Vec<GenerationSummary> {
        (0..generations).map(|_| self.step()).collect()
    }

    pub fn step(&mut self) -> GenerationSummary {
        let mut next = std::mem::take(&mut self.grid);
        let mut summary = GenerationSummary {
            generation: self.generation + 1,
            ..GenerationSummary::default()
        };

        let changes: Vec<(Coord, ChangeSet)> = next
            .iter_mut()
            .filter_map(|(coord, cell)| {
                let change = cell.advance();
                (!change.is_empty()).then_some((coord, change))
            })
            .collect();

        let mut in_transit = Vec::new();
        for (origin, change) in changes {
            if let Some(effect) = change.environment {
                if let Some(transit) = release_wind(&mut next, origin, effect, &mut summary) {
                    in_transit.push(transit);
                }
            }
            if let Some(kind) = change.cell_change {
                if let Some(cell) = next.get_mut(origin) {
                    trace!(
                        row = origin.row,
                        col = origin.col,
                        from = ?cell.kind(),
                        to = ?kind,
                        "cell.transition"
                    );
                    cell.change_kind(kind);
                    summary.transitions += 1;
                }
            }
            if let Some(effect) = change.neighbors {
                apply_to_neighbors(&mut next, origin, &effect);
            }
        }
        settle_winds(&mut next, in_transit, &mut summary);

        self.grid = next;
        self.generation += 1;
        debug!(
            generation = summary.generation,
            transitions = summary.transitions,
            winds_moved = summary.winds_moved,
            winds_reversed = summary.winds_reversed,
            winds_blocked = summary.winds_blocked,
            "generation.completed"
        );
        summary
    }
}

/// Detaches a moving wind (and its cloud) from `origin`, works out where it
/// is heading and deposits the pollution it carries along its chain.
fn release_wind(
    grid: &mut Grid,
    origin: Coord,
    effect: EnvironmentEffect,
    summary: &mut GenerationSummary,
) -> Option<WindTransit> {
    let WindAdvance::Relocate { direction, chain } = effect.advance else {
        return None;
    };
    let size = grid.size();
    let cell = grid.get_mut(origin)?;
    let mut wind = cell.take_wind()?;
    let cloud = if effect.carries_cloud {
        cell.take_cloud()
    } else {
        None
    };

    let mut destination = direction.step(origin);
    if !grid.contains(destination) {
        wind.reverse();
        summary.winds_reversed += 1;
        destination = wind.direction().step(origin);
        if !grid.contains(destination) {
            match legal_directions(origin, size).first() {
                Some(&legal) => {
                    wind.redirect(legal);
                    destination = legal.step(origin);
                }
                None => destination = origin,
            }
        }
    }

    for coord in chain.coords(origin) {
        if let Some(target) = grid.get_mut(coord) {
            target.adjust(Field::AirPollution, effect.air_pollution_passed);
        }
    }

    Some(WindTransit {
        origin,
        destination,
        wind,
        cloud,
    })
}

fn apply_to_neighbors(grid: &mut Grid, origin: Coord, effect: &NeighborEffect) {
    for direction in &effect.directions {
        if let Some(neighbor) = grid.get_mut(direction.step(origin)) {
            neighbor.adjust(effect.field, effect.delta);
        }
    }
}

/// Places every wind in transit. A wind whose destination already holds a
/// wind that is staying put, or that an earlier wind (in row-major order) has
/// claimed, stays at its origin instead. Blocking can cascade, so claims are
/// recomputed until nothing changes.
fn settle_winds(grid: &mut Grid, in_transit: Vec<WindTransit>, summary: &mut GenerationSummary) {
    let mut moving = vec![true; in_transit.len()];
    loop {
        let blocked_origins: HashSet<Coord> = in_transit
            .iter()
            .zip(&moving)
            .filter(|&(_, &moves)| !moves)
            .map(|(transit, _)| transit.origin)
            .collect();
        let mut claims: HashMap<Coord, usize> = HashMap::new();
        let mut changed = false;

        for (index, transit) in in_transit.iter().enumerate() {
            if !moving[index] {
                continue;
            }
            let occupied = grid.get(transit.destination).map_or(true, |cell| {
                cell.wind().is_some() || (transit.cloud.is_some() && cell.cloud().is_some())
            }) || blocked_origins.contains(&transit.destination);
            if occupied || claims.contains_key(&transit.destination) {
                moving[index] = false;
                changed = true;
            } else {
                claims.insert(transit.destination, index);
            }
        }

        if !changed {
            break;
        }
    }

    for (transit, moves) in in_transit.into_iter().zip(moving) {
        let target = if moves {
            summary.winds_moved += 1;
            transit.destination
        } else {
            summary.winds_blocked += 1;
            transit.origin
        };
        if let Some(cell) = grid.get_mut(target) {
            cell.attach_wind(transit.wind);
            if let Some(cloud) = transit.cloud {
                cell.attach_cloud(cloud);
            }
        }
    }
}
