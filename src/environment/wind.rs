use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

use crate::direction::{Coord, Direction};

/// Every this many speed units a wind carries pollution one cell further.
pub const AFFECT_SPEED_FACTOR: u32 = 5;

/// Inclusive bounds for drawing a wind speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedRange {
    pub min: u32,
    pub max: u32,
}

impl SpeedRange {
    pub fn new(min: u32, max: u32) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn fixed(speed: u32) -> Self {
        Self::new(speed, speed)
    }
}

/// The cells, ahead of a wind, that receive the pollution it carries.
/// Hop `k` lies `k` steps away in `direction`, for `k` in `1..=len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AffectedChain {
    pub direction: Direction,
    pub len: u32,
}

impl AffectedChain {
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn coords(&self, origin: Coord) -> impl Iterator<Item = Coord> + '_ {
        (1..=self.len).map(move |hops| self.direction.step_n(origin, hops))
    }
}

/// What a wind wants to do this generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindAdvance {
    Calm,
    Relocate {
        direction: Direction,
        chain: AffectedChain,
    },
}

#[derive(Debug, PartialEq, Eq)]
pub struct Wind {
    direction: Direction,
    speed: u32,
    speed_range: SpeedRange,
}

impl Wind {
    pub fn new(direction: Direction, speed: u32) -> Self {
        Self {
            direction,
            speed,
            speed_range: SpeedRange::fixed(speed),
        }
    }

    /// Draws speed from `speed_range` and direction from `candidates`.
    /// An empty candidate list falls back to every direction.
    pub fn generate<R: Rng + ?Sized>(
        rng: &mut R,
        speed_range: SpeedRange,
        candidates: &[Direction],
    ) -> Self {
        let direction = Self::generate_direction(rng, candidates);
        let speed = Self::generate_speed(rng, speed_range);
        Self {
            direction,
            speed,
            speed_range,
        }
    }

    pub fn generate_speed<R: Rng + ?Sized>(rng: &mut R, range: SpeedRange) -> u32 {
        rng.gen_range(range.min..=range.max)
    }

    pub fn generate_direction<R: Rng + ?Sized>(rng: &mut R, candidates: &[Direction]) -> Direction {
        let pool = if candidates.is_empty() {
            &Direction::ALL[..]
        } else {
            candidates
        };
        pool.choose(rng).copied().unwrap_or(Direction::Up)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn speed_range(&self) -> SpeedRange {
        self.speed_range
    }

    pub fn affected_chain(&self) -> AffectedChain {
        AffectedChain {
            direction: self.direction,
            len: self.speed / AFFECT_SPEED_FACTOR,
        }
    }

    pub fn advance(&self) -> WindAdvance {
        if self.speed == 0 {
            return WindAdvance::Calm;
        }
        WindAdvance::Relocate {
            direction: self.direction,
            chain: self.affected_chain(),
        }
    }

    pub fn reverse(&mut self) {
        self.direction = self.direction.opposite();
    }

    /// Points the wind somewhere new without touching its speed.
    pub fn redirect(&mut self, direction: Direction) {
        self.direction = direction;
    }
}
