pub mod metrics;
pub mod runner;
pub mod synthetic;

pub use metrics::PathMetrics;
pub use runner::{RunResult, SimulationRunner};
pub use synthetic::{generate_path, SequenceSource, SyntheticPathGenerator, UniformSource};
