use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::Path,
};

use serde::Deserialize;
use tracing::debug;

use crate::ConfigError;

/// Common connection profile describing the network a scenario targets.
///
/// Only the sections the admin steps consult are modelled; any other keys in
/// the profile (client, certificate authorities, ...) are ignored.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ConnectionProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub channels: BTreeMap<String, ChannelConfig>,
    #[serde(default)]
    pub organizations: BTreeMap<String, OrganizationConfig>,
    #[serde(default)]
    pub orderers: BTreeMap<String, EndpointConfig>,
    #[serde(default)]
    pub peers: BTreeMap<String, EndpointConfig>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChannelConfig {
    #[serde(default)]
    pub orderers: Vec<String>,
    #[serde(default)]
    pub peers: BTreeMap<String, ChannelPeerRoles>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelPeerRoles {
    #[serde(default)]
    pub endorsing_peer: Option<bool>,
    #[serde(default)]
    pub chaincode_query: Option<bool>,
    #[serde(default)]
    pub ledger_query: Option<bool>,
    #[serde(default)]
    pub event_source: Option<bool>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationConfig {
    #[serde(default)]
    pub mspid: String,
    #[serde(default)]
    pub peers: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointConfig {
    pub url: String,
    #[serde(default, rename = "tlsCACerts")]
    pub tls_ca_certs: Option<TlsCertsConfig>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TlsCertsConfig {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub pem: Option<String>,
}

impl ConnectionProfile {
    /// Loads a profile, picking the YAML parser for `.yaml`/`.yml` files and
    /// JSON for everything else.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        let profile: Self = if is_yaml {
            serde_yaml::from_str(&content).map_err(|source| ConfigError::ParseYaml {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            serde_json::from_str(&content).map_err(|source| ConfigError::ParseJson {
                path: path.to_path_buf(),
                source,
            })?
        };

        debug!(
            path = %path.display(),
            channels = profile.channels.len(),
            organizations = profile.organizations.len(),
            "loaded connection profile"
        );

        Ok(profile)
    }

    #[must_use]
    pub fn channel_names(&self) -> Vec<String> {
        self.channels.keys().cloned().collect()
    }

    pub fn channel(&self, name: &str) -> Result<&ChannelConfig, ConfigError> {
        self.channels
            .get(name)
            .ok_or_else(|| ConfigError::UnknownChannel {
                name: name.to_owned(),
            })
    }

    #[must_use]
    pub fn organization_names(&self) -> Vec<String> {
        self.organizations.keys().cloned().collect()
    }

    pub fn organization(&self, name: &str) -> Result<&OrganizationConfig, ConfigError> {
        self.organizations
            .get(name)
            .ok_or_else(|| ConfigError::UnknownOrganization {
                name: name.to_owned(),
            })
    }

    /// Organizations owning at least one of the channel's peers.
    pub fn organizations_for_channel(&self, channel: &str) -> Result<Vec<String>, ConfigError> {
        let channel_peers = self
            .channel(channel)?
            .peers
            .keys()
            .map(String::as_str)
            .collect::<BTreeSet<_>>();

        Ok(self
            .organizations
            .iter()
            .filter(|(_, org)| {
                org.peers
                    .iter()
                    .any(|peer| channel_peers.contains(peer.as_str()))
            })
            .map(|(name, _)| name.clone())
            .collect())
    }

    pub fn first_organization(&self) -> Result<&str, ConfigError> {
        self.organizations
            .keys()
            .next()
            .map(String::as_str)
            .ok_or(ConfigError::EmptyProfile {
                section: "organizations",
            })
    }

    pub fn first_channel(&self) -> Result<&str, ConfigError> {
        self.channels
            .keys()
            .next()
            .map(String::as_str)
            .ok_or(ConfigError::EmptyProfile {
                section: "channels",
            })
    }

    /// True when every configured endpoint uses `grpcs://`.
    #[must_use]
    pub fn uses_tls(&self) -> bool {
        let mut endpoints = self.orderers.values().chain(self.peers.values()).peekable();
        endpoints.peek().is_some() && endpoints.all(|endpoint| endpoint.url.starts_with("grpcs://"))
    }
}
