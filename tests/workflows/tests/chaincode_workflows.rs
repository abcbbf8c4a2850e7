use std::{fs, sync::Arc, time::Duration};

use anyhow::Result;
use fabric_testing_config::{ConfigError, FixturePaths, TlsMode};
use fabric_testing_core::{
    admin::{
        ChaincodeSpec,
        simulated::{AdminCall, SimulatedNetwork},
    },
    tracker::{
        Outcome, TrackerError,
        key::{ChaincodeKind, OperationScope},
    },
};
use fabric_testing_workflows::{AdminSession, InstantiatePlan, WorkflowError};
use serde_json::json;
use tests_workflows::{CHANNEL, args, bundled_fixtures, marbles, session_with, tls_session};

async fn joined_session(network: &Arc<SimulatedNetwork>) -> Result<AdminSession> {
    let session = tls_session(network)?;
    session.create_and_join_all_channels().await?;
    Ok(session)
}

#[tokio::test]
async fn install_runs_once_per_org() -> Result<()> {
    let network = Arc::new(SimulatedNetwork::new());
    let session = joined_session(&network).await?;
    let chaincode = marbles("1.0.0");

    let first = session.install_for_org("Org1", CHANNEL, &chaincode).await?;
    let again = session.install_for_org("Org1", CHANNEL, &chaincode).await?;
    let other_org = session.install_for_org("Org2", CHANNEL, &chaincode).await?;

    assert_eq!(first, Outcome::Executed);
    assert_eq!(again, Outcome::Skipped);
    assert_eq!(other_org, Outcome::Executed);
    assert_eq!(network.calls(AdminCall::InstallChaincode), 2);
    Ok(())
}

#[tokio::test]
async fn new_version_is_a_new_install() -> Result<()> {
    let network = Arc::new(SimulatedNetwork::new());
    let session = joined_session(&network).await?;

    session.install_for_org("Org1", CHANNEL, &marbles("1.0.0")).await?;
    let outcome = session.install_for_org("Org1", CHANNEL, &marbles("2.0.0")).await?;

    assert_eq!(outcome, Outcome::Executed);
    assert!(network.is_installed("Org1", "marbles", "2.0.0"));
    Ok(())
}

#[tokio::test]
async fn chaincode_id_is_not_part_of_the_tracking_key() -> Result<()> {
    let network = Arc::new(SimulatedNetwork::new());
    let session = joined_session(&network).await?;
    let aliased = ChaincodeSpec::new("marbles", "marbles-alias", ChaincodeKind::Golang, "1.0.0")?;

    session.install_default(&marbles("1.0.0")).await?;
    let outcome = session.install_default(&aliased).await?;

    assert_eq!(outcome, Outcome::Skipped);
    assert!(!network.is_installed("Org1", "marbles-alias", "1.0.0"));
    Ok(())
}

#[tokio::test]
async fn deploy_to_all_orgs_is_tracked_across_calls() -> Result<()> {
    let network = Arc::new(SimulatedNetwork::new());
    let session = joined_session(&network).await?;
    let chaincode = marbles("1.0.0");
    let init = args(&["init", "a", "100", "b", "200"]);

    let first = session
        .install_and_instantiate_all(CHANNEL, &chaincode, "1of", &init)
        .await?;
    let second = session
        .install_and_instantiate_all(CHANNEL, &chaincode, "1of", &init)
        .await?;

    assert_eq!(
        first.installs,
        vec![
            ("Org1".to_owned(), Outcome::Executed),
            ("Org2".to_owned(), Outcome::Executed)
        ]
    );
    assert_eq!(first.instantiate, Outcome::Executed);
    assert!(second.installs.iter().all(|(_, outcome)| outcome.is_skipped()));
    assert_eq!(second.instantiate, Outcome::Skipped);

    assert_eq!(network.calls(AdminCall::InstallChaincode), 2);
    assert_eq!(network.calls(AdminCall::InstantiateChaincode), 1);
    assert_eq!(
        network.instantiated_version(CHANNEL, "marbles").as_deref(),
        Some("1.0.0")
    );
    Ok(())
}

#[tokio::test]
async fn upgrade_replaces_running_version() -> Result<()> {
    let network = Arc::new(SimulatedNetwork::new());
    let session = joined_session(&network).await?;

    session
        .install_and_instantiate_all(CHANNEL, &marbles("1.0.0"), "1of", &[])
        .await?;
    session.install_for_org("Org1", CHANNEL, &marbles("2.0.0")).await?;

    let outcome = session
        .instantiate_on_channel(&InstantiatePlan {
            chaincode: marbles("2.0.0"),
            org: "Org1".to_owned(),
            channel: CHANNEL.to_owned(),
            policy: "2of".to_owned(),
            args: Vec::new(),
            upgrade: true,
        })
        .await?;

    assert_eq!(outcome, Outcome::Executed);
    assert_eq!(
        network.instantiated_version(CHANNEL, "marbles").as_deref(),
        Some("2.0.0")
    );
    Ok(())
}

#[tokio::test]
async fn failed_install_is_retried_by_next_call() -> Result<()> {
    let network = Arc::new(SimulatedNetwork::new());
    let session = joined_session(&network).await?;
    let chaincode = marbles("1.0.0");
    network.fail_next(AdminCall::InstallChaincode, 1);

    let err = session
        .install_for_org("Org1", CHANNEL, &chaincode)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Tracker(TrackerError::Failed { .. })
    ));
    assert!(!session.ctx().tracker().has_completed(
        &OperationScope::organization("Org1")?,
        chaincode.key()
    ));

    let retry = session.install_for_org("Org1", CHANNEL, &chaincode).await?;
    assert_eq!(retry, Outcome::Executed);
    assert!(network.is_installed("Org1", "marbles", "1.0.0"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn slow_install_times_out_and_stays_retryable() -> Result<()> {
    let network = Arc::new(SimulatedNetwork::new().with_latency(Duration::from_secs(30)));
    let ctx = tests_workflows::context(&network, bundled_fixtures());
    let target = ctx.target(TlsMode::Tls)?;
    let session = AdminSession::new(ctx, target, Duration::from_secs(1));
    let chaincode = marbles("1.0.0");

    let err = session
        .install_for_org("Org1", CHANNEL, &chaincode)
        .await
        .unwrap_err();

    let tracker_err = match err {
        WorkflowError::Tracker(tracker_err) => tracker_err,
        other => panic!("expected tracker error, got {other}"),
    };
    assert!(tracker_err.failure().is_some_and(|failure| failure.is_timeout()));
    assert!(!session.ctx().tracker().is_in_flight(
        &OperationScope::organization("Org1")?,
        chaincode.key()
    ));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn concurrent_deployments_share_one_install_per_org() -> Result<()> {
    let network = Arc::new(SimulatedNetwork::new().with_latency(Duration::from_millis(50)));
    let session = tls_session(&network)?;
    session.create_and_join_all_channels().await?;
    let chaincode = marbles("1.0.0");

    let (a, b) = futures::join!(
        session.install_and_instantiate_all(CHANNEL, &chaincode, "1of", &[]),
        session.install_and_instantiate_all(CHANNEL, &chaincode, "1of", &[]),
    );
    let (a, b) = (a?, b?);

    assert_eq!(network.calls(AdminCall::InstallChaincode), 2);
    assert_eq!(network.calls(AdminCall::InstantiateChaincode), 1);
    let invoked = [a.instantiate, b.instantiate]
        .into_iter()
        .filter(|outcome| outcome.invoked())
        .count();
    assert_eq!(invoked, 1);
    Ok(())
}

#[tokio::test]
async fn unknown_policy_fails_before_any_remote_call() -> Result<()> {
    let network = Arc::new(SimulatedNetwork::new());
    let session = joined_session(&network).await?;
    let chaincode = marbles("1.0.0");
    session.install_for_org("Org1", CHANNEL, &chaincode).await?;

    let err = session
        .instantiate_on_channel(&InstantiatePlan {
            chaincode,
            org: "Org1".to_owned(),
            channel: CHANNEL.to_owned(),
            policy: "3of".to_owned(),
            args: Vec::new(),
            upgrade: false,
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::Config(ConfigError::UnknownPolicy { .. })
    ));
    assert_eq!(network.calls(AdminCall::InstantiateChaincode), 0);
    Ok(())
}

#[tokio::test]
async fn forced_deploy_bypasses_tracker() -> Result<()> {
    let network = Arc::new(SimulatedNetwork::new());
    let session = joined_session(&network).await?;
    let chaincode = ChaincodeSpec::new("sacc", "sacc", ChaincodeKind::Java, "1.0.0")?;

    session
        .force_install_and_instantiate_all(CHANNEL, &chaincode, "1of", &args(&["a", "10"]))
        .await?;

    assert!(network.is_installed("Org1", "sacc", "1.0.0"));
    assert!(network.is_installed("Org2", "sacc", "1.0.0"));
    assert!(!session.ctx().tracker().has_completed(
        &OperationScope::channel(CHANNEL)?,
        chaincode.key()
    ));

    // Forcing again reaches the network, which rejects the duplicate install.
    let err = session
        .force_install_and_instantiate_all(CHANNEL, &chaincode, "1of", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Remote { .. }));
    assert_eq!(network.calls(AdminCall::InstallChaincode), 3);
    Ok(())
}

#[tokio::test]
async fn channel_without_org_peers_is_rejected() -> Result<()> {
    let dir = tempfile::tempdir()?;
    fs::create_dir_all(dir.path().join("config"))?;
    fs::write(
        dir.path().join("config/ccp-tls.json"),
        json!({
            "channels": { "orphan": { "peers": {} } },
            "organizations": { "Org1": { "mspid": "Org1MSP", "peers": ["peer0.org1.example.com"] } },
            "peers": { "peer0.org1.example.com": { "url": "grpcs://localhost:7051" } }
        })
        .to_string(),
    )?;
    fs::write(dir.path().join("config/policies.json"), "{}")?;

    let network = Arc::new(SimulatedNetwork::new());
    let session = session_with(&network, FixturePaths::new(dir.path()), TlsMode::Tls)?;

    let err = session
        .install_and_instantiate_all("orphan", &marbles("1.0.0"), "1of", &[])
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::InvalidArgument { .. }));
    assert_eq!(network.calls(AdminCall::InstallChaincode), 0);
    Ok(())
}
