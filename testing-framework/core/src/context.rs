use std::{fmt, sync::Arc};

use fabric_testing_config::{ConfigError, ConnectionProfile, FixturePaths, PolicyBook, TlsMode};

use crate::{
    admin::{NetworkAdmin, NetworkTarget},
    tracker::{
        OperationTracker, TrackerConfig,
        key::{ChaincodeKey, OperationScope},
    },
};

/// Tracker used for chaincode installs (per organization) and
/// instantiations (per channel).
pub type ChaincodeTracker = OperationTracker<OperationScope, ChaincodeKey>;

/// State that lives for a whole test run and is shared by every scenario:
/// the admin client, the fixtures and the chaincode tracker.
#[derive(Clone)]
pub struct RunContext {
    admin: Arc<dyn NetworkAdmin>,
    tracker: Arc<ChaincodeTracker>,
    fixtures: FixturePaths,
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("fixtures", &self.fixtures)
            .field("tracker", &self.tracker.config())
            .finish_non_exhaustive()
    }
}

impl RunContext {
    #[must_use]
    pub fn new(admin: Arc<dyn NetworkAdmin>, fixtures: FixturePaths) -> Self {
        Self::with_tracker_config(admin, fixtures, TrackerConfig::from_env())
    }

    #[must_use]
    pub fn with_tracker_config(
        admin: Arc<dyn NetworkAdmin>,
        fixtures: FixturePaths,
        config: TrackerConfig,
    ) -> Self {
        Self {
            admin,
            tracker: Arc::new(ChaincodeTracker::new(config)),
            fixtures,
        }
    }

    #[must_use]
    pub fn admin(&self) -> &dyn NetworkAdmin {
        self.admin.as_ref()
    }

    #[must_use]
    pub fn tracker(&self) -> &ChaincodeTracker {
        &self.tracker
    }

    #[must_use]
    pub const fn fixtures(&self) -> &FixturePaths {
        &self.fixtures
    }

    /// Loads the connection profile matching `tls` from the fixtures.
    pub fn target(&self, tls: TlsMode) -> Result<NetworkTarget, ConfigError> {
        let profile = ConnectionProfile::load(&self.fixtures.connection_profile(tls))?;
        Ok(NetworkTarget::new(profile, tls))
    }

    pub fn policies(&self) -> Result<PolicyBook, ConfigError> {
        PolicyBook::load(&self.fixtures.policies())
    }
}
