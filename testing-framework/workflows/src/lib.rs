pub mod args;
pub mod chaincode;
pub mod channels;
pub mod session;

use std::time::Duration;

use fabric_testing_config::ConfigError;
use fabric_testing_core::{
    DynError,
    tracker::{TrackerError, key::KeyError},
};
use thiserror::Error;

pub use args::{parse_args, parse_upgrade};
pub use chaincode::{DEFAULT_CHAINCODE_VERSION, DeploymentReport, InstantiatePlan};
pub use session::AdminSession;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error(transparent)]
    Tracker(#[from] TrackerError),
    #[error("{action} failed: {source}")]
    Remote {
        action: String,
        #[source]
        source: DynError,
    },
    #[error("{action} timed out after {timeout:?}")]
    Timeout { action: String, timeout: Duration },
    #[error("need {needed} connected organization clients, have {connected}")]
    MissingClients { needed: usize, connected: usize },
    #[error("{message}")]
    InvalidArgument { message: String },
}
