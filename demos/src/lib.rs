pub mod defaults;
pub mod runner;

pub use runner::{features_dir, run, simulated_context};
