use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("unsupported chaincode type '{value}' (expected golang, node, java or car)")]
    UnsupportedKind { value: String },
}

/// Partition of the tracker state. Installs are tracked per organization and
/// instantiations per channel; the two never share entries.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum OperationScope {
    Organization(String),
    Channel(String),
}

impl OperationScope {
    pub fn organization(name: &str) -> Result<Self, KeyError> {
        Ok(Self::Organization(non_empty("organization", name)?))
    }

    pub fn channel(name: &str) -> Result<Self, KeyError> {
        Ok(Self::Channel(non_empty("channel", name)?))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Organization(name) | Self::Channel(name) => name,
        }
    }
}

impl fmt::Display for OperationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Organization(name) => write!(f, "org:{name}"),
            Self::Channel(name) => write!(f, "channel:{name}"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ChaincodeKind {
    Golang,
    Node,
    Java,
    Car,
}

impl ChaincodeKind {
    pub fn parse(value: &str) -> Result<Self, KeyError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "golang" => Ok(Self::Golang),
            "node" => Ok(Self::Node),
            "java" => Ok(Self::Java),
            "car" => Ok(Self::Car),
            other => Err(KeyError::UnsupportedKind {
                value: other.to_owned(),
            }),
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Golang => "golang",
            Self::Node => "node",
            Self::Java => "java",
            Self::Car => "car",
        }
    }
}

impl fmt::Display for ChaincodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identity of a chaincode lifecycle operation: the same name, version and
/// type always denote the same install or instantiation.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ChaincodeKey {
    name: String,
    version: String,
    kind: ChaincodeKind,
}

impl ChaincodeKey {
    pub fn new(name: &str, version: &str, kind: ChaincodeKind) -> Result<Self, KeyError> {
        Ok(Self {
            name: non_empty("chaincode name", name)?,
            version: non_empty("chaincode version", version)?,
            kind,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub const fn kind(&self) -> ChaincodeKind {
        self.kind
    }
}

impl fmt::Display for ChaincodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-v{}-{}", self.name, self.version, self.kind)
    }
}

fn non_empty(field: &'static str, value: &str) -> Result<String, KeyError> {
    let value = value.trim();
    if value.is_empty() {
        Err(KeyError::Empty { field })
    } else {
        Ok(value.to_owned())
    }
}
