use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::{
    automaton::Automaton,
    cell::CellDescriptor,
    direction::legal_directions,
    environment::{Cloud, Wind},
    grid::Grid,
    rng::{RngManager, CLOUD_STREAM, DISTRIBUTION_STREAM, TEMPERATURE_STREAM, WIND_STREAM},
    seeding::EnvironmentDistribution,
    world_file::{read_world_file, WorldFileError},
};

fn default_generations() -> u64 {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default)]
    pub generations: Option<u64>,
    pub world_file: PathBuf,
    #[serde(default)]
    pub environment: EnvironmentDistribution,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Scenario {
    pub fn generations(&self, override_generations: Option<u64>) -> u64 {
        override_generations
            .or(self.generations)
            .unwrap_or_else(default_generations)
    }

    /// Materialises the descriptors and attaches a wind and a cloud to every
    /// coordinate the environment distribution picks.
    pub fn build_automaton(
        &self,
        descriptors: &[Vec<CellDescriptor>],
    ) -> Result<Automaton, WorldFileError> {
        let mut rng = RngManager::new(self.seed);

        let mut rows = Vec::with_capacity(descriptors.len());
        for row in descriptors {
            let mut cells = Vec::with_capacity(row.len());
            for descriptor in row {
                cells.push(descriptor.build(&mut rng.stream(TEMPERATURE_STREAM))?);
            }
            rows.push(cells);
        }
        let mut grid = Grid::from_rows(rows)?;

        let size = grid.size();
        let seeds = self
            .environment
            .sample(&mut rng.stream(DISTRIBUTION_STREAM), size);
        for seed in &seeds {
            let directions = legal_directions(seed.coord, size);
            let wind = Wind::generate(&mut rng.stream(WIND_STREAM), seed.speed_range, &directions);
            let cloud = Cloud::generate(&mut rng.stream(CLOUD_STREAM));
            if let Some(cell) = grid.get_mut(seed.coord) {
                cell.attach_wind(wind);
                cell.attach_cloud(cloud);
            }
        }

        info!(
            scenario = %self.name,
            size,
            weather_cells = seeds.len(),
            "scenario.built"
        );
        Ok(Automaton::new(grid))
    }
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(scenario)
    }

    /// Reads the scenario's world file, resolved against the loader's base
    /// directory, and builds the automaton from it.
    pub fn build_automaton(&self, scenario: &Scenario) -> Result<Automaton> {
        let path = self.base_dir.join(&scenario.world_file);
        let descriptors = read_world_file(&path)
            .with_context(|| format!("Failed to read world file {}", path.display()))?;
        let automaton = scenario
            .build_automaton(&descriptors)
            .with_context(|| format!("Invalid world in {}", path.display()))?;
        Ok(automaton)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellKind;

    fn scenario(yaml: &str) -> Scenario {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_defaults_fill_optional_sections() {
        let scenario = scenario("name: bare\nseed: 3\nworld_file: worlds/bare.csv\n");
        assert_eq!(scenario.generations(None), 100);
        assert_eq!(scenario.generations(Some(5)), 5);
        assert_eq!(scenario.logging.level, "info");
        assert_eq!(scenario.environment, EnvironmentDistribution::default());
    }

    #[test]
    fn test_build_attaches_weather_deterministically() {
        let scenario = scenario(
            "name: full\nseed: 12\nworld_file: w.csv\nenvironment:\n  coverage_min_percent: 100\n  coverage_max_percent: 100\n",
        );
        let descriptors = vec![vec![CellDescriptor::new(1); 4]; 4];
        let a = scenario.build_automaton(&descriptors).unwrap();
        let b = scenario.build_automaton(&descriptors).unwrap();

        assert_eq!(a.snapshot(), b.snapshot());
        for (coord, cell) in a.grid().iter() {
            assert_eq!(cell.kind(), CellKind::Sea);
            assert!((16.0..=24.0).contains(&cell.temperature()));
            let wind = cell.wind().expect("full coverage seeds every cell");
            assert!(wind.direction().step(coord).in_bounds(4));
            assert!(cell.cloud().is_some());
        }
    }

    #[test]
    fn test_build_rejects_unknown_tag() {
        let scenario = scenario("name: bad\nseed: 1\nworld_file: w.csv\n");
        let descriptors = vec![vec![CellDescriptor::new(1), CellDescriptor::new(8)]; 2];
        let err = scenario.build_automaton(&descriptors).err().unwrap();
        assert!(matches!(err, WorldFileError::Cell(_)));
    }

    #[test]
    fn test_build_rejects_ragged_grid() {
        let scenario = scenario("name: ragged\nseed: 1\nworld_file: w.csv\n");
        let descriptors = vec![vec![CellDescriptor::new(0); 3], vec![CellDescriptor::new(0); 2]];
        let err = scenario.build_automaton(&descriptors).err().unwrap();
        assert!(matches!(err, WorldFileError::Grid(_)));
    }
}
