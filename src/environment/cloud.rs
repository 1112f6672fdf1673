use rand::Rng;

pub const MAX_PRECIPITATION: u8 = 100;
pub const PRECIPITATION_STEP: u8 = 10;

/// A cloud gathers precipitation every generation and rains once it is full.
#[derive(Debug, PartialEq, Eq)]
pub struct Cloud {
    precipitation: u8,
}

impl Cloud {
    pub fn new(precipitation: u8) -> Self {
        Self {
            precipitation: precipitation.min(MAX_PRECIPITATION),
        }
    }

    /// Draws a starting precipitation uniformly from `0..=100`.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(rng.gen_range(0..=MAX_PRECIPITATION))
    }

    pub fn precipitation(&self) -> u8 {
        self.precipitation
    }

    pub fn should_rain(&self) -> bool {
        self.precipitation == MAX_PRECIPITATION
    }

    /// A full cloud empties; otherwise it grows by one step, topping out at
    /// the maximum so that every cycle passes through a raining generation.
    pub fn advance(&mut self) {
        if self.precipitation >= MAX_PRECIPITATION {
            self.precipitation = 0;
        } else {
            self.precipitation = self
                .precipitation
                .saturating_add(PRECIPITATION_STEP)
                .min(MAX_PRECIPITATION);
        }
    }
}
