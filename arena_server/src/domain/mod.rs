// Domain layer: the simulation engine, its state model and the rules it runs.

pub mod engine;
pub mod errors;
pub mod events;
pub mod geometry;
pub mod ports;
pub mod rng;
pub mod state;
pub mod systems;
pub mod tuning;
pub mod upgrades;

pub use engine::{AdminCommand, Engine, EngineConfig, TickOutcome};
pub use errors::{CommandError, StoreError};
pub use events::EngineEvent;
pub use state::{GameState, GameStatus, PlayerId, PlayerInput};
