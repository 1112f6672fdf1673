//! Cell state machine.
//!
//! Every cell runs the same base update (rain, wind hand-off, pollution
//! driven heating/cooling) and then the rule of its own kind. Rules that
//! reach beyond the cell are not applied here: they are returned as a
//! [`ChangeSet`] for the automaton to reconcile against the whole grid.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::direction::Direction;
use crate::environment::{Cloud, Wind, WindAdvance};

pub const MIN_TEMPERATURE: f64 = -50.0;
pub const MAX_TEMPERATURE: f64 = 150.0;
pub const MIN_AIR_POLLUTION: f64 = 0.0;
pub const MAX_AIR_POLLUTION: f64 = 1.0;

const RAIN_COOLING: f64 = 1.5;
const RAIN_POLLUTION_WASHOUT: f64 = 0.25;
const WIND_POLLUTION_SHARE: f64 = 0.35;
const CLEAN_AIR_BOUND: f64 = 0.25;
const CLEAN_AIR_COOLING: f64 = 0.05;
const DIRTY_AIR_BOUND: f64 = 0.60;
const DIRTY_AIR_HEATING: f64 = 0.35;

const EARTH_TO_FOREST_MAX_POLLUTION: f64 = 0.05;
const SEA_TO_EARTH_TEMPERATURE: f64 = 100.0;
const SEA_TO_ICEBERG_TEMPERATURE: f64 = -1.0;
const CITY_TO_EARTH_TEMPERATURE: f64 = 95.0;
const CITY_POLLUTION_OUTPUT: f64 = 0.08;
const CITY_NEIGHBOR_POLLUTION: f64 = 0.02;
const ICEBERG_TO_SEA_TEMPERATURE: f64 = 0.0;
const ICEBERG_NEIGHBOR_COOLING: f64 = -0.025;
const FOREST_TO_EARTH_TEMPERATURE: f64 = 60.0;
const FOREST_TO_EARTH_POLLUTION: f64 = 0.8;
const FOREST_NEIGHBOR_CLEANING: f64 = -0.03;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CellError {
    #[error("unrecognized cell type tag {0}")]
    UnknownKind(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Earth,
    Sea,
    City,
    Iceberg,
    Forest,
}

impl CellKind {
    pub const ALL: [CellKind; 5] = [
        CellKind::Earth,
        CellKind::Sea,
        CellKind::City,
        CellKind::Iceberg,
        CellKind::Forest,
    ];

    pub fn from_tag(tag: i64) -> Result<Self, CellError> {
        match tag {
            0 => Ok(CellKind::Earth),
            1 => Ok(CellKind::Sea),
            2 => Ok(CellKind::City),
            3 => Ok(CellKind::Iceberg),
            4 => Ok(CellKind::Forest),
            other => Err(CellError::UnknownKind(other)),
        }
    }

    pub fn tag(self) -> i64 {
        match self {
            CellKind::Earth => 0,
            CellKind::Sea => 1,
            CellKind::City => 2,
            CellKind::Iceberg => 3,
            CellKind::Forest => 4,
        }
    }

    /// Range a fresh cell's temperature is drawn from when none is given.
    pub fn default_temperature_range(self) -> (i32, i32) {
        match self {
            CellKind::Earth => (20, 28),
            CellKind::Sea => (16, 24),
            CellKind::City => (20, 28),
            CellKind::Iceberg => (-24, -10),
            CellKind::Forest => (18, 26),
        }
    }
}

impl TryFrom<i64> for CellKind {
    type Error = CellError;

    fn try_from(tag: i64) -> Result<Self, Self::Error> {
        CellKind::from_tag(tag)
    }
}

/// Cell attribute a neighbor effect adds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Temperature,
    AirPollution,
}

/// Wind hand-off recorded by a cell that owns a wind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentEffect {
    pub advance: WindAdvance,
    /// The cell also held a cloud, which travels with the wind.
    pub carries_cloud: bool,
    pub air_pollution_passed: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NeighborEffect {
    pub field: Field,
    pub delta: f64,
    pub directions: Vec<Direction>,
}

impl NeighborEffect {
    fn all_around(field: Field, delta: f64) -> Self {
        Self {
            field,
            delta,
            directions: Direction::ALL.to_vec(),
        }
    }
}

/// Effects of one cell update that reach beyond the cell itself.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChangeSet {
    pub environment: Option<EnvironmentEffect>,
    pub cell_change: Option<CellKind>,
    pub neighbors: Option<NeighborEffect>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.environment.is_none() && self.cell_change.is_none() && self.neighbors.is_none()
    }
}

/// Loader-side description of a cell before it is materialised.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellDescriptor {
    pub tag: i64,
    pub temperature: Option<f64>,
    pub air_pollution: Option<f64>,
}

impl CellDescriptor {
    pub fn new(tag: i64) -> Self {
        Self {
            tag,
            temperature: None,
            air_pollution: None,
        }
    }

    /// Fails fast on an unknown tag. A missing temperature is drawn from the
    /// kind's default range; missing pollution is zero.
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Cell, CellError> {
        let kind = CellKind::from_tag(self.tag)?;
        let temperature = match self.temperature {
            Some(value) => value,
            None => {
                let (low, high) = kind.default_temperature_range();
                f64::from(rng.gen_range(low..=high))
            }
        };
        Ok(Cell::new(kind, temperature, self.air_pollution.unwrap_or(0.0)))
    }
}

/// Snapshot of the values a kind rule reads, taken before the base update.
#[derive(Debug, Clone, Copy)]
struct Reading {
    temperature: f64,
    air_pollution: f64,
    raining: bool,
}

#[derive(Debug, PartialEq)]
pub struct Cell {
    kind: CellKind,
    temperature: f64,
    air_pollution: f64,
    wind: Option<Wind>,
    cloud: Option<Cloud>,
}

impl Cell {
    pub fn new(kind: CellKind, temperature: f64, air_pollution: f64) -> Self {
        Self {
            kind,
            temperature: clamp_temperature(temperature),
            air_pollution: clamp_air_pollution(air_pollution),
            wind: None,
            cloud: None,
        }
    }

    pub fn with_wind(mut self, wind: Wind) -> Self {
        self.wind = Some(wind);
        self
    }

    pub fn with_cloud(mut self, cloud: Cloud) -> Self {
        self.cloud = Some(cloud);
        self
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn air_pollution(&self) -> f64 {
        self.air_pollution
    }

    pub fn wind(&self) -> Option<&Wind> {
        self.wind.as_ref()
    }

    pub fn cloud(&self) -> Option<&Cloud> {
        self.cloud.as_ref()
    }

    pub fn take_wind(&mut self) -> Option<Wind> {
        self.wind.take()
    }

    pub fn take_cloud(&mut self) -> Option<Cloud> {
        self.cloud.take()
    }

    /// Hands back whatever wind was displaced.
    pub fn attach_wind(&mut self, wind: Wind) -> Option<Wind> {
        self.wind.replace(wind)
    }

    pub fn attach_cloud(&mut self, cloud: Cloud) -> Option<Cloud> {
        self.cloud.replace(cloud)
    }

    pub fn set_temperature(&mut self, value: f64) {
        self.temperature = clamp_temperature(value);
    }

    pub fn set_air_pollution(&mut self, value: f64) {
        self.air_pollution = clamp_air_pollution(value);
    }

    pub fn adjust(&mut self, field: Field, delta: f64) {
        match field {
            Field::Temperature => self.set_temperature(self.temperature + delta),
            Field::AirPollution => self.set_air_pollution(self.air_pollution + delta),
        }
    }

    /// Replaces this cell with a new one of `kind`, carrying over its
    /// temperature, pollution, wind and cloud.
    pub fn change_kind(&mut self, kind: CellKind) {
        let mut next = Cell::new(kind, self.temperature, self.air_pollution);
        next.wind = self.wind.take();
        next.cloud = self.cloud.take();
        *self = next;
    }

    /// Runs one generation of local updates and reports the cross-cell ones.
    pub fn advance(&mut self) -> ChangeSet {
        let reading = Reading {
            temperature: self.temperature,
            air_pollution: self.air_pollution,
            raining: self.cloud.as_ref().is_some_and(Cloud::should_rain),
        };
        let mut changes = self.advance_base();
        self.advance_kind(reading, &mut changes);
        changes
    }

    fn advance_base(&mut self) -> ChangeSet {
        let mut changes = ChangeSet::default();

        if let Some(cloud) = self.cloud.as_mut() {
            if cloud.should_rain() {
                self.temperature = clamp_temperature(self.temperature - RAIN_COOLING);
                self.air_pollution = clamp_air_pollution(
                    self.air_pollution - self.air_pollution * RAIN_POLLUTION_WASHOUT,
                );
            }
            cloud.advance();
        }

        if let Some(wind) = self.wind.as_ref() {
            changes.environment = Some(EnvironmentEffect {
                advance: wind.advance(),
                carries_cloud: self.cloud.is_some(),
                air_pollution_passed: self.air_pollution * WIND_POLLUTION_SHARE,
            });
        }

        if self.air_pollution <= CLEAN_AIR_BOUND {
            self.adjust(Field::Temperature, -CLEAN_AIR_COOLING);
        }
        if self.air_pollution >= DIRTY_AIR_BOUND {
            self.adjust(Field::Temperature, DIRTY_AIR_HEATING);
        }

        changes
    }

    fn advance_kind(&mut self, reading: Reading, changes: &mut ChangeSet) {
        match self.kind {
            CellKind::Earth => {
                if reading.raining && reading.air_pollution <= EARTH_TO_FOREST_MAX_POLLUTION {
                    changes.cell_change = Some(CellKind::Forest);
                }
            }
            CellKind::Sea => {
                if reading.temperature >= SEA_TO_EARTH_TEMPERATURE {
                    changes.cell_change = Some(CellKind::Earth);
                } else if reading.temperature <= SEA_TO_ICEBERG_TEMPERATURE {
                    changes.cell_change = Some(CellKind::Iceberg);
                }
            }
            CellKind::City => {
                self.adjust(Field::AirPollution, CITY_POLLUTION_OUTPUT);
                changes.neighbors = Some(NeighborEffect::all_around(
                    Field::AirPollution,
                    CITY_NEIGHBOR_POLLUTION,
                ));
                if reading.temperature >= CITY_TO_EARTH_TEMPERATURE {
                    changes.cell_change = Some(CellKind::Earth);
                }
            }
            CellKind::Iceberg => {
                changes.neighbors = Some(NeighborEffect::all_around(
                    Field::Temperature,
                    ICEBERG_NEIGHBOR_COOLING,
                ));
                if reading.temperature >= ICEBERG_TO_SEA_TEMPERATURE {
                    changes.cell_change = Some(CellKind::Sea);
                }
            }
            CellKind::Forest => {
                changes.neighbors = Some(NeighborEffect::all_around(
                    Field::AirPollution,
                    FOREST_NEIGHBOR_CLEANING,
                ));
                if reading.temperature >= FOREST_TO_EARTH_TEMPERATURE
                    || reading.air_pollution >= FOREST_TO_EARTH_POLLUTION
                {
                    changes.cell_change = Some(CellKind::Earth);
                }
            }
        }
    }
}

fn clamp_temperature(value: f64) -> f64 {
    value.clamp(MIN_TEMPERATURE, MAX_TEMPERATURE)
}

fn clamp_air_pollution(value: f64) -> f64 {
    value.clamp(MIN_AIR_POLLUTION, MAX_AIR_POLLUTION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::SpeedRange;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_unknown_tag_fails() {
        assert_eq!(CellKind::from_tag(7), Err(CellError::UnknownKind(7)));
        assert_eq!(CellKind::try_from(-1), Err(CellError::UnknownKind(-1)));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(CellDescriptor::new(5).build(&mut rng).is_err());
    }

    #[test]
    fn test_tags_round_trip() {
        for kind in CellKind::ALL {
            assert_eq!(CellKind::from_tag(kind.tag()), Ok(kind));
        }
    }

    #[test]
    fn test_construction_clamps() {
        let cell = Cell::new(CellKind::Earth, 400.0, -3.0);
        assert_eq!(cell.temperature(), MAX_TEMPERATURE);
        assert_eq!(cell.air_pollution(), MIN_AIR_POLLUTION);
    }

    #[test]
    fn test_descriptor_defaults() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..50 {
            let cell = CellDescriptor::new(3).build(&mut rng).unwrap();
            assert_eq!(cell.kind(), CellKind::Iceberg);
            assert!((-24.0..=-10.0).contains(&cell.temperature()));
            assert_eq!(cell.air_pollution(), 0.0);
        }

        let explicit = CellDescriptor {
            tag: 1,
            temperature: Some(0.0),
            air_pollution: Some(0.4),
        };
        let cell = explicit.build(&mut rng).unwrap();
        assert_eq!(cell.temperature(), 0.0);
        assert!(approx(cell.air_pollution(), 0.4));
    }

    #[test]
    fn test_clean_air_cools_without_transition() {
        let mut cell = Cell::new(CellKind::Sea, 99.0, 0.0);
        let changes = cell.advance();
        assert!(approx(cell.temperature(), 98.95));
        assert!(changes.is_empty());
    }

    #[test]
    fn test_dirty_air_heats() {
        let mut cell = Cell::new(CellKind::Earth, 20.0, 0.7);
        cell.advance();
        assert!(approx(cell.temperature(), 20.35));
    }

    #[test]
    fn test_mid_pollution_leaves_temperature() {
        let mut cell = Cell::new(CellKind::Earth, 20.0, 0.4);
        cell.advance();
        assert!(approx(cell.temperature(), 20.0));
    }

    #[test]
    fn test_rain_cools_and_washes_out_pollution() {
        let mut cell = Cell::new(CellKind::Earth, 20.0, 0.4).with_cloud(Cloud::new(100));
        cell.advance();
        // 0.4 * 0.75 = 0.3, which is neither clean nor dirty
        assert!(approx(cell.temperature(), 18.5));
        assert!(approx(cell.air_pollution(), 0.3));
        assert_eq!(cell.cloud().map(Cloud::precipitation), Some(0));
    }

    #[test]
    fn test_cloud_advances_without_rain() {
        let mut cell = Cell::new(CellKind::Earth, 20.0, 0.4).with_cloud(Cloud::new(30));
        cell.advance();
        assert_eq!(cell.cloud().map(Cloud::precipitation), Some(40));
    }

    #[test]
    fn test_wind_reports_environment_effect() {
        let mut cell = Cell::new(CellKind::Earth, 20.0, 0.4)
            .with_wind(Wind::new(Direction::Right, 10))
            .with_cloud(Cloud::new(0));
        let changes = cell.advance();
        let effect = changes.environment.expect("wind produces an effect");
        assert!(effect.carries_cloud);
        assert!(approx(effect.air_pollution_passed, 0.14));
        assert!(matches!(effect.advance, WindAdvance::Relocate { .. }));
        assert!(cell.wind().is_some(), "the automaton detaches the wind");
    }

    #[test]
    fn test_earth_becomes_forest_in_clean_rain() {
        let mut cell = Cell::new(CellKind::Earth, 20.0, 0.05).with_cloud(Cloud::new(100));
        assert_eq!(cell.advance().cell_change, Some(CellKind::Forest));

        let mut dirty = Cell::new(CellKind::Earth, 20.0, 0.06).with_cloud(Cloud::new(100));
        assert_eq!(dirty.advance().cell_change, None);

        let mut dry = Cell::new(CellKind::Earth, 20.0, 0.0).with_cloud(Cloud::new(90));
        assert_eq!(dry.advance().cell_change, None);
    }

    #[test]
    fn test_sea_transitions() {
        let mut hot = Cell::new(CellKind::Sea, 100.0, 0.0);
        assert_eq!(hot.advance().cell_change, Some(CellKind::Earth));

        let mut cold = Cell::new(CellKind::Sea, -1.0, 0.0);
        assert_eq!(cold.advance().cell_change, Some(CellKind::Iceberg));

        let mut mild = Cell::new(CellKind::Sea, 10.0, 0.0);
        assert_eq!(mild.advance().cell_change, None);
    }

    #[test]
    fn test_city_pollutes_itself_and_neighbors() {
        let mut cell = Cell::new(CellKind::City, 25.0, 0.3);
        let changes = cell.advance();
        assert!(approx(cell.air_pollution(), 0.38));
        let neighbors = changes.neighbors.expect("city affects neighbors");
        assert_eq!(neighbors.field, Field::AirPollution);
        assert!(approx(neighbors.delta, 0.02));
        assert_eq!(neighbors.directions.len(), 8);
        assert_eq!(changes.cell_change, None);
    }

    #[test]
    fn test_city_becomes_earth_at_threshold() {
        let mut cell = Cell::new(CellKind::City, 95.0, 0.0);
        assert_eq!(cell.advance().cell_change, Some(CellKind::Earth));
    }

    #[test]
    fn test_iceberg_cools_neighbors_and_melts() {
        let mut frozen = Cell::new(CellKind::Iceberg, -12.0, 0.0);
        let changes = frozen.advance();
        let neighbors = changes.neighbors.unwrap();
        assert_eq!(neighbors.field, Field::Temperature);
        assert!(approx(neighbors.delta, -0.025));
        assert_eq!(changes.cell_change, None);

        let mut melting = Cell::new(CellKind::Iceberg, 0.0, 0.0);
        assert_eq!(melting.advance().cell_change, Some(CellKind::Sea));
    }

    #[test]
    fn test_forest_transitions() {
        let mut healthy = Cell::new(CellKind::Forest, 22.0, 0.1);
        let changes = healthy.advance();
        assert_eq!(changes.cell_change, None);
        assert!(approx(changes.neighbors.unwrap().delta, -0.03));

        let mut scorched = Cell::new(CellKind::Forest, 60.0, 0.1);
        assert_eq!(scorched.advance().cell_change, Some(CellKind::Earth));

        let mut smothered = Cell::new(CellKind::Forest, 22.0, 0.8);
        assert_eq!(smothered.advance().cell_change, Some(CellKind::Earth));
    }

    #[test]
    fn test_change_kind_carries_state() {
        let mut cell = Cell::new(CellKind::City, 95.0, 0.42)
            .with_wind(Wind::new(Direction::Up, 6))
            .with_cloud(Cloud::new(20));
        cell.change_kind(CellKind::Earth);
        assert_eq!(cell.kind(), CellKind::Earth);
        assert_eq!(cell.temperature(), 95.0);
        assert_eq!(cell.air_pollution(), 0.42);
        assert_eq!(cell.wind(), Some(&Wind::new(Direction::Up, 6)));
        assert_eq!(cell.cloud().map(Cloud::precipitation), Some(20));
    }

    #[test]
    fn test_untouched_cell_keeps_values() {
        let cell = Cell::new(CellKind::Forest, 23.5, 0.12);
        assert_eq!(cell.kind(), CellKind::Forest);
        assert_eq!(cell.temperature(), 23.5);
        assert_eq!(cell.air_pollution(), 0.12);
    }

    #[test]
    fn test_updates_stay_clamped() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        for _ in 0..500 {
            let kind = CellKind::ALL[rng.gen_range(0..CellKind::ALL.len())];
            let mut cell = Cell::new(
                kind,
                rng.gen_range(-60.0..160.0),
                rng.gen_range(-0.5..1.5),
            );
            if rng.gen_bool(0.5) {
                cell = cell.with_cloud(Cloud::generate(&mut rng));
            }
            if rng.gen_bool(0.5) {
                cell = cell.with_wind(Wind::generate(&mut rng, SpeedRange::new(0, 20), &[]));
            }
            for _ in 0..30 {
                let changes = cell.advance();
                if let Some(neighbors) = changes.neighbors {
                    cell.adjust(neighbors.field, neighbors.delta * 40.0);
                }
                assert!((MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&cell.temperature()));
                assert!((MIN_AIR_POLLUTION..=MAX_AIR_POLLUTION).contains(&cell.air_pollution()));
            }
        }
    }
}
