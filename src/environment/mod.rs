//! Transient weather carried by cells: clouds and the winds that push them.

mod cloud;
mod wind;

pub use cloud::{Cloud, MAX_PRECIPITATION, PRECIPITATION_STEP};
pub use wind::{AffectedChain, SpeedRange, Wind, WindAdvance, AFFECT_SPEED_FACTOR};
