use std::path::{Path, PathBuf};

use fabric_testing_env as tf_env;

use crate::TlsMode;

const CONFIG_DIR: &str = "config";
const CRYPTO_DIR: &str = "crypto-material";
const PROFILES_DIR: &str = "profiles";

/// On-disk layout of the fixtures consumed by the admin steps.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FixturePaths {
    root: PathBuf,
}

impl FixturePaths {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `FABRIC_TEST_FIXTURES_DIR`, or the fixtures bundled with the demo crate.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(tf_env::fabric_fixtures_dir().unwrap_or_else(bundled_fixtures_dir))
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn connection_profile(&self, tls: TlsMode) -> PathBuf {
        let file = match tls {
            TlsMode::Tls => "ccp-tls.json",
            TlsMode::NonTls => "ccp.json",
        };
        self.root.join(CONFIG_DIR).join(file)
    }

    #[must_use]
    pub fn policies(&self) -> PathBuf {
        self.root.join(CONFIG_DIR).join("policies.json")
    }

    #[must_use]
    pub fn crypto_root(&self) -> PathBuf {
        self.root.join(CRYPTO_DIR)
    }

    #[must_use]
    pub fn channel_config_root(&self) -> PathBuf {
        self.crypto_root().join("channel-config")
    }

    #[must_use]
    pub fn channel_tx(&self, file_name: &str) -> PathBuf {
        self.channel_config_root().join(file_name)
    }

    /// Channel transactions for version-two capability channels.
    #[must_use]
    pub fn v2_channel_config_root(&self) -> PathBuf {
        self.crypto_root().join("config-v2")
    }

    #[must_use]
    pub fn network_profile(&self) -> PathBuf {
        self.root.join(PROFILES_DIR).join("network-ad.yaml")
    }
}

impl Default for FixturePaths {
    fn default() -> Self {
        Self::from_env()
    }
}

fn bundled_fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/fixtures")
}
