pub mod automaton;
pub mod cell;
pub mod direction;
pub mod environment;
pub mod grid;
pub mod rng;
pub mod scenario;
pub mod seeding;
pub mod snapshot;
pub mod world_file;

pub use automaton::{Automaton, GenerationSummary};
pub use cell::{Cell, CellDescriptor, CellError, CellKind};
pub use grid::{Grid, GridError};
pub use scenario::{Scenario, ScenarioLoader};
pub use snapshot::GridSnapshot;
