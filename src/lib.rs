pub mod config;
pub mod engine;
pub mod hex;
pub mod rng;
pub mod scenario;
pub mod systems;
pub mod world;

pub use config::{ConfigError, WorldArgs};
pub use engine::{GenerationProgress, Generator, GeneratorBuilder, StepOutcome};
pub use hex::{CubeCoord, HexDirection, OffsetCoord};
pub use scenario::{Scenario, ScenarioLoader};
pub use world::{TerrainType, Tile, WorldMapData, WorldSummary};
