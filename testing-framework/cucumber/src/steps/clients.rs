use cucumber::{given, then};
use fabric_testing_config::StepTimeout;
use fabric_testing_workflows::{AdminSession, WorkflowError};
use tracing::info;

use crate::world::{ConnectedClients, FabricWorld, StepResult, within};

#[given(regex = r"^I have created fabric-client network instances$")]
async fn create_network_instances(world: &mut FabricWorld) -> StepResult {
    let session = world.network_session(StepTimeout::Long)?;
    let orgs = within(StepTimeout::Long, session.connect_organizations()).await?;

    info!(orgs = ?orgs, "organization clients connected");
    world.clients = Some(ConnectedClients {
        target: session.target().clone(),
        orgs,
    });
    Ok(())
}

#[then(
    regex = r"^I can create and join a version_two capabilities channel named (\S+) to two organizations$"
)]
async fn create_v2_channel(world: &mut FabricWorld, channel: String) -> StepResult {
    let ctx = world.context()?.clone();
    let clients = world.clients.clone().ok_or(WorkflowError::MissingClients {
        needed: 2,
        connected: 0,
    })?;

    let session = AdminSession::new(ctx, clients.target, StepTimeout::Long.duration());
    within(
        StepTimeout::Long,
        session.create_and_join_v2_channel(&channel, &clients.orgs),
    )
    .await
}
