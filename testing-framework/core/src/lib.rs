pub mod admin;
pub mod context;
pub mod tracker;

pub use context::{ChaincodeTracker, RunContext};
pub use fabric_testing_config::timeouts::adjust_timeout;

/// Error type returned by remote admin operations.
pub type DynError = Box<dyn std::error::Error + Send + Sync + 'static>;
