pub mod fixtures;
pub mod policy;
pub mod profile;
pub mod timeouts;
pub mod tls;

use std::{io, path::PathBuf};

pub use fixtures::FixturePaths;
pub use policy::{EndorsementPolicy, PolicyBook};
pub use profile::ConnectionProfile;
use thiserror::Error;
pub use timeouts::StepTimeout;
pub use tls::TlsMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}", path = path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}", path = path.display())]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to parse {path}: {source}", path = path.display())]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("unsupported tls type '{value}' (expected \"tls\" or \"non-tls\")")]
    InvalidTlsMode { value: String },
    #[error("channel '{name}' is not defined in the connection profile")]
    UnknownChannel { name: String },
    #[error("organization '{name}' is not defined in the connection profile")]
    UnknownOrganization { name: String },
    #[error("unknown endorsement policy '{name}'")]
    UnknownPolicy { name: String },
    #[error("connection profile defines no {section}")]
    EmptyProfile { section: &'static str },
}
