//! Environment distribution: which cells start with a wind and a cloud, and
//! how fast each of those winds may blow.

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

use crate::direction::Coord;
use crate::environment::SpeedRange;

fn default_coverage_min() -> u32 {
    10
}

fn default_coverage_max() -> u32 {
    15
}

fn default_speed_tiers() -> Vec<SpeedTier> {
    vec![
        SpeedTier::new(25, 0, 0),
        SpeedTier::new(60, 5, 10),
        SpeedTier::new(10, 10, 15),
        SpeedTier::new(5, 16, 20),
    ]
}

/// Share (in percent) of the seeded cells whose wind speed is drawn from
/// `min_speed..=max_speed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedTier {
    pub share_percent: u32,
    pub min_speed: u32,
    pub max_speed: u32,
}

impl SpeedTier {
    pub fn new(share_percent: u32, min_speed: u32, max_speed: u32) -> Self {
        Self {
            share_percent,
            min_speed,
            max_speed,
        }
    }

    pub fn range(&self) -> SpeedRange {
        SpeedRange::new(self.min_speed, self.max_speed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentDistribution {
    #[serde(default = "default_coverage_min")]
    pub coverage_min_percent: u32,
    #[serde(default = "default_coverage_max")]
    pub coverage_max_percent: u32,
    #[serde(default = "default_speed_tiers")]
    pub wind_speed_tiers: Vec<SpeedTier>,
}

impl Default for EnvironmentDistribution {
    fn default() -> Self {
        Self {
            coverage_min_percent: default_coverage_min(),
            coverage_max_percent: default_coverage_max(),
            wind_speed_tiers: default_speed_tiers(),
        }
    }
}

/// A coordinate chosen to start with weather, and the speed range its wind
/// is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentSeed {
    pub coord: Coord,
    pub speed_range: SpeedRange,
}

impl EnvironmentDistribution {
    /// Picks the seeded coordinates for a `grid_size` square grid, in
    /// row-major order.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, grid_size: usize) -> Vec<EnvironmentSeed> {
        let low = self.coverage_min_percent.min(self.coverage_max_percent).min(100);
        let high = self.coverage_max_percent.max(low).min(100);
        let coverage = rng.gen_range(low..=high);
        let area = grid_size * grid_size;
        let count = (coverage as usize * area) / 100;

        let mut remaining: Vec<Coord> = (0..grid_size)
            .flat_map(|row| (0..grid_size).map(move |col| Coord::from((row, col))))
            .collect();
        remaining.shuffle(rng);
        remaining.truncate(count);

        let fallback = self
            .wind_speed_tiers
            .first()
            .map(SpeedTier::range)
            .unwrap_or_else(|| SpeedRange::fixed(0));
        let mut seeds = Vec::with_capacity(count);
        for tier in &self.wind_speed_tiers {
            let take = (tier.share_percent as usize * count / 100).min(remaining.len());
            seeds.extend(remaining.drain(..take).map(|coord| EnvironmentSeed {
                coord,
                speed_range: tier.range(),
            }));
        }
        seeds.extend(remaining.into_iter().map(|coord| EnvironmentSeed {
            coord,
            speed_range: fallback,
        }));

        seeds.sort_by_key(|seed| seed.coord);
        seeds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    #[test]
    fn test_coverage_stays_within_bounds() {
        let distribution = EnvironmentDistribution::default();
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        for _ in 0..20 {
            let seeds = distribution.sample(&mut rng, 30);
            // 10% and 15% of 900 cells
            assert!((90..=135).contains(&seeds.len()), "{} seeds", seeds.len());
            let unique: HashSet<_> = seeds.iter().map(|s| s.coord).collect();
            assert_eq!(unique.len(), seeds.len());
            assert!(seeds.iter().all(|s| s.coord.in_bounds(30)));
        }
    }

    #[test]
    fn test_tiers_split_seeds() {
        let distribution = EnvironmentDistribution {
            coverage_min_percent: 10,
            coverage_max_percent: 10,
            wind_speed_tiers: default_speed_tiers(),
        };
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let seeds = distribution.sample(&mut rng, 20);
        assert_eq!(seeds.len(), 40);

        let in_tier = |min, max| {
            seeds
                .iter()
                .filter(|s| s.speed_range == SpeedRange::new(min, max))
                .count()
        };
        assert_eq!(in_tier(0, 0), 10);
        assert_eq!(in_tier(5, 10), 24);
        assert_eq!(in_tier(10, 15), 4);
        assert_eq!(in_tier(16, 20), 2);
    }

    #[test]
    fn test_leftovers_use_first_tier() {
        let distribution = EnvironmentDistribution {
            coverage_min_percent: 100,
            coverage_max_percent: 100,
            wind_speed_tiers: vec![SpeedTier::new(50, 1, 2), SpeedTier::new(10, 7, 9)],
        };
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let seeds = distribution.sample(&mut rng, 3);
        assert_eq!(seeds.len(), 9);
        let first_tier = seeds
            .iter()
            .filter(|s| s.speed_range == SpeedRange::new(1, 2))
            .count();
        // 4 from the tier itself plus the 5 the second tier left over
        assert_eq!(first_tier, 9);
    }

    #[test]
    fn test_same_seed_same_sample() {
        let distribution = EnvironmentDistribution::default();
        let a = distribution.sample(&mut ChaCha8Rng::seed_from_u64(99), 12);
        let b = distribution.sample(&mut ChaCha8Rng::seed_from_u64(99), 12);
        assert_eq!(a, b);
    }
}
