pub mod simulated;

use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use fabric_testing_config::{ConnectionProfile, EndorsementPolicy, TlsMode};

use crate::{
    DynError,
    tracker::key::{ChaincodeKey, ChaincodeKind, KeyError},
};

/// Network a step talks to: the resolved connection profile and whether the
/// admin client should use TLS.
#[derive(Clone, Debug)]
pub struct NetworkTarget {
    pub profile: Arc<ConnectionProfile>,
    pub tls: TlsMode,
}

impl NetworkTarget {
    #[must_use]
    pub fn new(profile: ConnectionProfile, tls: TlsMode) -> Self {
        Self {
            profile: Arc::new(profile),
            tls,
        }
    }
}

/// Chaincode package as named in the steps. The key's name selects the
/// source, `id` is what the chaincode is registered as on the peers.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChaincodeSpec {
    key: ChaincodeKey,
    id: String,
}

impl ChaincodeSpec {
    pub fn new(name: &str, id: &str, kind: ChaincodeKind, version: &str) -> Result<Self, KeyError> {
        let key = ChaincodeKey::new(name, version, kind)?;
        let id = id.trim();
        if id.is_empty() {
            return Err(KeyError::Empty {
                field: "chaincode id",
            });
        }

        Ok(Self {
            key,
            id: id.to_owned(),
        })
    }

    /// Tracking key; the registered id does not take part.
    #[must_use]
    pub const fn key(&self) -> &ChaincodeKey {
        &self.key
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.key.name()
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn version(&self) -> &str {
        self.key.version()
    }

    #[must_use]
    pub const fn kind(&self) -> ChaincodeKind {
        self.key.kind()
    }
}

#[derive(Clone, Debug)]
pub struct InstallRequest {
    pub target: NetworkTarget,
    pub org: String,
    pub channel: String,
    pub chaincode: ChaincodeSpec,
}

#[derive(Clone, Debug)]
pub struct InstantiateRequest {
    pub target: NetworkTarget,
    pub org: String,
    pub channel: String,
    pub chaincode: ChaincodeSpec,
    pub args: Vec<String>,
    pub upgrade: bool,
    pub policy: EndorsementPolicy,
}

/// Administrative operations exposed by a network client. Every call is a
/// remote round trip; implementations are expected to reject repeats
/// gracefully rather than corrupt state.
#[async_trait]
pub trait NetworkAdmin: Send + Sync {
    async fn create_channel(
        &self,
        target: &NetworkTarget,
        channel: &str,
        config_root: &Path,
    ) -> Result<(), DynError>;

    async fn update_channel(
        &self,
        target: &NetworkTarget,
        channel: &str,
        config_tx: &Path,
    ) -> Result<(), DynError>;

    async fn join_channel(
        &self,
        target: &NetworkTarget,
        channel: &str,
        org: &str,
    ) -> Result<(), DynError>;

    /// Channels the network's peers have already joined.
    async fn existing_channels(&self, target: &NetworkTarget) -> Result<Vec<String>, DynError>;

    async fn connect_organization(&self, target: &NetworkTarget, org: &str)
    -> Result<(), DynError>;

    async fn install_chaincode(&self, request: &InstallRequest) -> Result<(), DynError>;

    async fn instantiate_chaincode(&self, request: &InstantiateRequest) -> Result<(), DynError>;
}
