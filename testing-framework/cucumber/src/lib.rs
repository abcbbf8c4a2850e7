mod steps;
pub mod world;

pub use world::{ConnectedClients, FabricWorld, StepError, StepResult};
