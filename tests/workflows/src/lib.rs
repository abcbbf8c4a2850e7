//! Fixtures and helpers shared by the workflow integration tests.

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Result;
use fabric_testing_config::{ConnectionProfile, FixturePaths, TlsMode};
use fabric_testing_core::{
    RunContext,
    admin::{ChaincodeSpec, NetworkTarget, simulated::SimulatedNetwork},
    tracker::{TrackerConfig, key::ChaincodeKind},
};
use fabric_testing_workflows::AdminSession;

pub const CALL_TIMEOUT: Duration = Duration::from_secs(5);
pub const CHANNEL: &str = "mychannel";

pub fn bundled_fixtures() -> FixturePaths {
    FixturePaths::new(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos/fixtures"))
}

pub fn context(network: &Arc<SimulatedNetwork>, fixtures: FixturePaths) -> RunContext {
    RunContext::with_tracker_config(network.clone(), fixtures, TrackerConfig::default())
}

/// Session on the bundled TLS connection profile.
pub fn tls_session(network: &Arc<SimulatedNetwork>) -> Result<AdminSession> {
    session_with(network, bundled_fixtures(), TlsMode::Tls)
}

pub fn session_with(
    network: &Arc<SimulatedNetwork>,
    fixtures: FixturePaths,
    tls: TlsMode,
) -> Result<AdminSession> {
    let ctx = context(network, fixtures);
    let target = ctx.target(tls)?;
    Ok(AdminSession::new(ctx, target, CALL_TIMEOUT))
}

/// Session on the multi-organization network profile.
pub fn network_profile_session(ctx: RunContext) -> Result<AdminSession> {
    let profile = ConnectionProfile::load(&ctx.fixtures().network_profile())?;
    let target = NetworkTarget::new(profile, TlsMode::Tls);
    Ok(AdminSession::new(ctx, target, CALL_TIMEOUT))
}

pub fn marbles(version: &str) -> ChaincodeSpec {
    ChaincodeSpec::new("marbles", "marbles", ChaincodeKind::Golang, version)
        .expect("valid chaincode spec")
}

pub fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_owned()).collect()
}
