pub mod components;
pub mod engine;
pub mod geometry;
pub mod render;
pub mod rng;
pub mod rules;
pub mod scenario;
pub mod signal;
pub mod sink;
pub mod summary;
pub mod world;

pub use engine::{Engine, EngineBuilder, EngineSettings, RunSummary, TickSummary};
pub use scenario::{Scenario, ScenarioLoader};
pub use signal::StopSignal;
pub use world::World;
