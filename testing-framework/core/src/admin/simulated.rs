use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info};

use super::{InstallRequest, InstantiateRequest, NetworkAdmin, NetworkTarget};
use crate::DynError;

/// Remote call kinds counted by [`SimulatedNetwork`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AdminCall {
    CreateChannel,
    UpdateChannel,
    JoinChannel,
    ExistingChannels,
    ConnectOrganization,
    InstallChaincode,
    InstantiateChaincode,
}

impl AdminCall {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CreateChannel => "create_channel",
            Self::UpdateChannel => "update_channel",
            Self::JoinChannel => "join_channel",
            Self::ExistingChannels => "existing_channels",
            Self::ConnectOrganization => "connect_organization",
            Self::InstallChaincode => "install_chaincode",
            Self::InstantiateChaincode => "instantiate_chaincode",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimulatedNetworkError {
    #[error("injected failure for {call}", call = call.label())]
    Injected { call: AdminCall },
    #[error("client tls mode does not match profile endpoints (tls requested: {requested})")]
    TlsMismatch { requested: bool },
    #[error("organization '{org}' is not part of the connection profile")]
    UnknownOrganization { org: String },
    #[error("channel '{channel}' already exists")]
    ChannelExists { channel: String },
    #[error("channel '{channel}' does not exist")]
    UnknownChannel { channel: String },
    #[error("organization '{org}' already joined channel '{channel}'")]
    AlreadyJoined { org: String, channel: String },
    #[error("organization '{org}' has not joined channel '{channel}'")]
    NotJoined { org: String, channel: String },
    #[error("chaincode {id}:{version} is already installed on '{org}'")]
    AlreadyInstalled {
        org: String,
        id: String,
        version: String,
    },
    #[error("chaincode {id}:{version} is not installed on '{org}'")]
    NotInstalled {
        org: String,
        id: String,
        version: String,
    },
    #[error("chaincode '{id}' is already instantiated on channel '{channel}'")]
    AlreadyInstantiated { id: String, channel: String },
    #[error("chaincode '{id}' is not instantiated on channel '{channel}', cannot upgrade")]
    NotInstantiated { id: String, channel: String },
}

#[derive(Debug, Default)]
struct SimulatedState {
    calls: HashMap<AdminCall, usize>,
    failures: HashMap<AdminCall, usize>,
    channels: BTreeMap<String, ChannelState>,
    connected: BTreeSet<String>,
    installed: BTreeMap<String, BTreeSet<(String, String)>>,
}

#[derive(Debug, Default)]
struct ChannelState {
    members: BTreeSet<String>,
    updates: Vec<PathBuf>,
    instantiated: BTreeMap<String, String>,
}

/// In-memory network that applies the admin bookkeeping a real network would:
/// duplicates are rejected, joins need an existing channel, instantiation
/// needs an install on the instantiating organization.
#[derive(Debug, Default)]
pub struct SimulatedNetwork {
    latency: Duration,
    state: Mutex<SimulatedState>,
}

impl SimulatedNetwork {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay applied before every call takes effect.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Makes the next `times` calls of `call` fail without side effects.
    pub fn fail_next(&self, call: AdminCall, times: usize) {
        *self.lock().failures.entry(call).or_default() += times;
    }

    /// Pre-populates a channel joined by `orgs`, as if a previous run created it.
    pub fn seed_channel(&self, channel: &str, orgs: &[&str]) {
        let mut state = self.lock();
        let entry = state.channels.entry(channel.to_owned()).or_default();
        entry
            .members
            .extend(orgs.iter().map(|org| (*org).to_owned()));
    }

    #[must_use]
    pub fn calls(&self, call: AdminCall) -> usize {
        self.lock().calls.get(&call).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn channels(&self) -> Vec<String> {
        self.lock().channels.keys().cloned().collect()
    }

    #[must_use]
    pub fn members(&self, channel: &str) -> Vec<String> {
        self.lock()
            .channels
            .get(channel)
            .map(|state| state.members.iter().cloned().collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn channel_updates(&self, channel: &str) -> Vec<PathBuf> {
        self.lock()
            .channels
            .get(channel)
            .map(|state| state.updates.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_connected(&self, org: &str) -> bool {
        self.lock().connected.contains(org)
    }

    #[must_use]
    pub fn is_installed(&self, org: &str, id: &str, version: &str) -> bool {
        self.lock()
            .installed
            .get(org)
            .is_some_and(|set| set.contains(&(id.to_owned(), version.to_owned())))
    }

    /// Version of `id` currently running on `channel`.
    #[must_use]
    pub fn instantiated_version(&self, channel: &str, id: &str) -> Option<String> {
        self.lock()
            .channels
            .get(channel)
            .and_then(|state| state.instantiated.get(id).cloned())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimulatedState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Counts the call, waits out the latency and consumes an injected
    /// failure if one is armed.
    async fn begin(
        &self,
        call: AdminCall,
        target: &NetworkTarget,
    ) -> Result<(), SimulatedNetworkError> {
        *self.lock().calls.entry(call).or_default() += 1;

        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }

        {
            let mut state = self.lock();
            if let Some(remaining) = state.failures.get_mut(&call) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(SimulatedNetworkError::Injected { call });
                }
            }
        }

        let profile = &target.profile;
        let has_endpoints = !profile.orderers.is_empty() || !profile.peers.is_empty();
        if has_endpoints && profile.uses_tls() != target.tls.enabled() {
            return Err(SimulatedNetworkError::TlsMismatch {
                requested: target.tls.enabled(),
            });
        }

        Ok(())
    }
}

fn known_org(target: &NetworkTarget, org: &str) -> Result<(), SimulatedNetworkError> {
    if target.profile.organizations.contains_key(org) {
        Ok(())
    } else {
        Err(SimulatedNetworkError::UnknownOrganization {
            org: org.to_owned(),
        })
    }
}

fn require_member(
    state: &SimulatedState,
    channel: &str,
    org: &str,
) -> Result<(), SimulatedNetworkError> {
    let channel_state =
        state
            .channels
            .get(channel)
            .ok_or_else(|| SimulatedNetworkError::UnknownChannel {
                channel: channel.to_owned(),
            })?;

    if channel_state.members.contains(org) {
        Ok(())
    } else {
        Err(SimulatedNetworkError::NotJoined {
            org: org.to_owned(),
            channel: channel.to_owned(),
        })
    }
}

#[async_trait]
impl NetworkAdmin for SimulatedNetwork {
    async fn create_channel(
        &self,
        target: &NetworkTarget,
        channel: &str,
        config_root: &Path,
    ) -> Result<(), DynError> {
        self.begin(AdminCall::CreateChannel, target).await?;

        let mut state = self.lock();
        if state.channels.contains_key(channel) {
            return Err(SimulatedNetworkError::ChannelExists {
                channel: channel.to_owned(),
            }
            .into());
        }

        state
            .channels
            .insert(channel.to_owned(), ChannelState::default());
        info!(channel, config_root = %config_root.display(), "simulated channel created");
        Ok(())
    }

    async fn update_channel(
        &self,
        target: &NetworkTarget,
        channel: &str,
        config_tx: &Path,
    ) -> Result<(), DynError> {
        self.begin(AdminCall::UpdateChannel, target).await?;

        let mut state = self.lock();
        let channel_state =
            state
                .channels
                .get_mut(channel)
                .ok_or_else(|| SimulatedNetworkError::UnknownChannel {
                    channel: channel.to_owned(),
                })?;

        channel_state.updates.push(config_tx.to_path_buf());
        info!(channel, config_tx = %config_tx.display(), "simulated channel updated");
        Ok(())
    }

    async fn join_channel(
        &self,
        target: &NetworkTarget,
        channel: &str,
        org: &str,
    ) -> Result<(), DynError> {
        self.begin(AdminCall::JoinChannel, target).await?;
        known_org(target, org)?;

        let mut state = self.lock();
        let channel_state =
            state
                .channels
                .get_mut(channel)
                .ok_or_else(|| SimulatedNetworkError::UnknownChannel {
                    channel: channel.to_owned(),
                })?;

        if !channel_state.members.insert(org.to_owned()) {
            return Err(SimulatedNetworkError::AlreadyJoined {
                org: org.to_owned(),
                channel: channel.to_owned(),
            }
            .into());
        }

        info!(channel, org, "simulated org joined channel");
        Ok(())
    }

    async fn existing_channels(&self, target: &NetworkTarget) -> Result<Vec<String>, DynError> {
        self.begin(AdminCall::ExistingChannels, target).await?;

        let state = self.lock();
        Ok(state
            .channels
            .iter()
            .filter(|(_, channel)| !channel.members.is_empty())
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn connect_organization(
        &self,
        target: &NetworkTarget,
        org: &str,
    ) -> Result<(), DynError> {
        self.begin(AdminCall::ConnectOrganization, target).await?;
        known_org(target, org)?;

        self.lock().connected.insert(org.to_owned());
        debug!(org, "simulated client connected");
        Ok(())
    }

    async fn install_chaincode(&self, request: &InstallRequest) -> Result<(), DynError> {
        self.begin(AdminCall::InstallChaincode, &request.target)
            .await?;
        known_org(&request.target, &request.org)?;

        let chaincode = &request.chaincode;
        let mut state = self.lock();
        let installed = state.installed.entry(request.org.clone()).or_default();
        if !installed.insert((chaincode.id().to_owned(), chaincode.version().to_owned())) {
            return Err(SimulatedNetworkError::AlreadyInstalled {
                org: request.org.clone(),
                id: chaincode.id().to_owned(),
                version: chaincode.version().to_owned(),
            }
            .into());
        }

        info!(
            org = %request.org,
            id = chaincode.id(),
            version = chaincode.version(),
            kind = %chaincode.kind(),
            "simulated chaincode installed"
        );
        Ok(())
    }

    async fn instantiate_chaincode(&self, request: &InstantiateRequest) -> Result<(), DynError> {
        self.begin(AdminCall::InstantiateChaincode, &request.target)
            .await?;
        known_org(&request.target, &request.org)?;

        let chaincode = &request.chaincode;
        let id = chaincode.id().to_owned();
        let version = chaincode.version().to_owned();

        let mut state = self.lock();
        require_member(&state, &request.channel, &request.org)?;

        let installed = state
            .installed
            .get(&request.org)
            .is_some_and(|set| set.contains(&(id.clone(), version.clone())));
        if !installed {
            return Err(SimulatedNetworkError::NotInstalled {
                org: request.org.clone(),
                id,
                version,
            }
            .into());
        }

        let channel = request.channel.clone();
        let running = state
            .channels
            .get_mut(&channel)
            .ok_or_else(|| SimulatedNetworkError::UnknownChannel {
                channel: channel.clone(),
            })?;

        match (request.upgrade, running.instantiated.contains_key(&id)) {
            (false, true) => {
                return Err(SimulatedNetworkError::AlreadyInstantiated { id, channel }.into());
            }
            (true, false) => {
                return Err(SimulatedNetworkError::NotInstantiated { id, channel }.into());
            }
            _ => {}
        }

        info!(
            channel = %channel,
            id = %id,
            version = %version,
            upgrade = request.upgrade,
            args = ?request.args,
            "simulated chaincode instantiated"
        );
        running.instantiated.insert(id, version);
        Ok(())
    }
}
