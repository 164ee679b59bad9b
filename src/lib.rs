// Core modules
pub mod advisor;
pub mod backtest;
pub mod error;
pub mod models;
pub mod monitor;
pub mod settings;
pub mod telemetry;

// Re-export commonly used types
pub use error::{Error, ServiceError};
pub use models::*;
pub use settings::Settings;

// Error handling
pub type Result<T> = std::result::Result<T, Error>;
