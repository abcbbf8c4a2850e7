use cucumber::{given, then};
use fabric_testing_config::StepTimeout;

use crate::world::{FabricWorld, StepResult, within};

#[given(regex = r"^I create all channels from the (\S+) common connection profile$")]
async fn create_all_channels(world: &mut FabricWorld, tls: String) -> StepResult {
    let session = world.session(&tls, StepTimeout::Short)?;
    within(StepTimeout::Short, session.create_all_channels()).await?;
    Ok(())
}

#[given(
    regex = r"^I update channel with name (\S+) with config file (\S+) from the (\S+) common connection profile$"
)]
async fn update_channel(
    world: &mut FabricWorld,
    channel: String,
    tx_file: String,
    tls: String,
) -> StepResult {
    let session = world.session(&tls, StepTimeout::Short)?;
    within(StepTimeout::Short, session.update_channel(&channel, &tx_file)).await
}

#[then(regex = r"^I can join organization (\S+) to the (\S+) enabled channel named (\S+)$")]
async fn join_channel(
    world: &mut FabricWorld,
    org: String,
    tls: String,
    channel: String,
) -> StepResult {
    let session = world.session(&tls, StepTimeout::Short)?;
    within(StepTimeout::Short, session.join_channel(&channel, &org)).await
}

#[given(regex = r"^I create and join all channels from the (\S+) common connection profile$")]
async fn create_and_join_all(world: &mut FabricWorld, tls: String) -> StepResult {
    let session = world.session(&tls, StepTimeout::Medium)?;
    within(StepTimeout::Medium, session.create_and_join_all_channels()).await?;
    Ok(())
}

#[given(
    regex = r"^I have created and joined all channels from the (\S+) common connection profile$"
)]
async fn create_and_join_missing(world: &mut FabricWorld, tls: String) -> StepResult {
    let session = world.session(&tls, StepTimeout::Medium)?;
    within(StepTimeout::Medium, session.create_and_join_missing_channels()).await?;
    Ok(())
}
