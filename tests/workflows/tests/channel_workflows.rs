use std::sync::Arc;

use anyhow::Result;
use fabric_testing_config::TlsMode;
use fabric_testing_core::admin::simulated::{AdminCall, SimulatedNetwork};
use fabric_testing_workflows::{AdminSession, WorkflowError};
use tests_workflows::{CALL_TIMEOUT, CHANNEL, bundled_fixtures, context, network_profile_session, tls_session};

#[tokio::test]
async fn create_and_join_all_joins_every_owning_org() -> Result<()> {
    let network = Arc::new(SimulatedNetwork::new());
    let session = tls_session(&network)?;

    let channels = session.create_and_join_all_channels().await?;

    assert_eq!(channels, vec![CHANNEL.to_owned()]);
    assert_eq!(network.members(CHANNEL), vec!["Org1", "Org2"]);
    assert_eq!(network.calls(AdminCall::CreateChannel), 1);
    assert_eq!(network.calls(AdminCall::JoinChannel), 2);
    Ok(())
}

#[tokio::test]
async fn missing_channel_setup_skips_joined_channels() -> Result<()> {
    let network = Arc::new(SimulatedNetwork::new());
    network.seed_channel(CHANNEL, &["Org1", "Org2"]);
    let session = tls_session(&network)?;

    let created = session.create_and_join_missing_channels().await?;

    assert!(created.is_empty());
    assert_eq!(network.calls(AdminCall::ExistingChannels), 1);
    assert_eq!(network.calls(AdminCall::CreateChannel), 0);
    assert_eq!(network.calls(AdminCall::JoinChannel), 0);
    Ok(())
}

#[tokio::test]
async fn missing_channel_setup_creates_absent_channels() -> Result<()> {
    let network = Arc::new(SimulatedNetwork::new());
    let session = tls_session(&network)?;

    let created = session.create_and_join_missing_channels().await?;
    assert_eq!(created, vec![CHANNEL.to_owned()]);
    assert_eq!(network.members(CHANNEL), vec!["Org1", "Org2"]);

    // Second pass finds everything joined.
    assert!(session.create_and_join_missing_channels().await?.is_empty());
    assert_eq!(network.calls(AdminCall::CreateChannel), 1);
    Ok(())
}

#[tokio::test]
async fn repeated_channel_creation_surfaces_remote_error() -> Result<()> {
    let network = Arc::new(SimulatedNetwork::new());
    let session = tls_session(&network)?;

    session.create_all_channels().await?;
    let err = session.create_channel(CHANNEL).await.unwrap_err();

    assert!(matches!(err, WorkflowError::Remote { .. }), "{err}");
    Ok(())
}

#[tokio::test]
async fn update_uses_channel_config_fixture() -> Result<()> {
    let network = Arc::new(SimulatedNetwork::new());
    let session = tls_session(&network)?;

    session.create_channel(CHANNEL).await?;
    session.update_channel(CHANNEL, "mychannel-anchors.tx").await?;

    let updates = network.channel_updates(CHANNEL);
    assert_eq!(updates.len(), 1);
    assert!(updates[0].ends_with("crypto-material/channel-config/mychannel-anchors.tx"));
    Ok(())
}

#[tokio::test]
async fn non_tls_session_against_tls_network_fails() -> Result<()> {
    let network = Arc::new(SimulatedNetwork::new());
    let ctx = context(&network, bundled_fixtures());
    let mut target = ctx.target(TlsMode::Tls)?;
    target.tls = TlsMode::NonTls;
    let session = AdminSession::new(ctx, target, CALL_TIMEOUT);

    let err = session.create_all_channels().await.unwrap_err();

    assert!(matches!(err, WorkflowError::Remote { .. }));
    assert!(network.channels().is_empty());
    Ok(())
}

#[tokio::test]
async fn v2_channel_is_joined_by_two_connected_orgs() -> Result<()> {
    let network = Arc::new(SimulatedNetwork::new());
    let session = network_profile_session(context(&network, bundled_fixtures()))?;

    let orgs = session.connect_organizations().await?;
    assert_eq!(orgs, vec!["Org1", "Org2"]);
    assert!(network.is_connected("Org1") && network.is_connected("Org2"));

    session.create_and_join_v2_channel("v2channel", &orgs).await?;
    assert_eq!(network.members("v2channel"), vec!["Org1", "Org2"]);
    Ok(())
}

#[tokio::test]
async fn v2_channel_needs_two_clients() -> Result<()> {
    let network = Arc::new(SimulatedNetwork::new());
    let session = network_profile_session(context(&network, bundled_fixtures()))?;

    let err = session
        .create_and_join_v2_channel("v2channel", &["Org1".to_owned()])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::MissingClients {
            needed: 2,
            connected: 1
        }
    ));
    assert_eq!(network.calls(AdminCall::CreateChannel), 0);
    Ok(())
}
