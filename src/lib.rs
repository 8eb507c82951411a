// Library interface for APT batch decoding

pub mod batch;
pub mod config;
pub mod error;
pub mod flags;
pub mod invoker;
pub mod job;
pub mod metrics;
pub mod satellite;
pub mod utils;

// Scripted invoker and capture directories for tests and benches
pub mod test_fixtures;

// Re-export commonly used types
pub use batch::{BatchOrchestrator, BatchReport, JobOutcome};
pub use config::{AppConfig, ExitStatusPolicy};
pub use error::{AptError, BatchError, ConfigError, InvokeError, Result};
pub use flags::DecodeOptions;
pub use invoker::{DecodeInvoker, DecodeResult, ProcessInvoker};
pub use satellite::Satellite;
