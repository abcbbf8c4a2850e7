use cucumber::{given, then};
use fabric_testing_config::StepTimeout;
use fabric_testing_workflows::{
    DEFAULT_CHAINCODE_VERSION, InstantiatePlan, parse_args, parse_upgrade,
};

use crate::world::{FabricWorld, StepResult, chaincode, within};

#[given(
    regex = r"^I install (\S+) chaincode at version (\S+) named (\S+) to the (\S+) Fabric network as organization (\S+) on channel (\S+)$"
)]
async fn install_for_org(
    world: &mut FabricWorld,
    kind: String,
    version: String,
    name: String,
    tls: String,
    org: String,
    channel: String,
) -> StepResult {
    let spec = chaincode(&kind, &name, &name, &version)?;
    let session = world.session(&tls, StepTimeout::Short)?;
    let outcome = within(
        StepTimeout::Short,
        session.install_for_org(&org, &channel, &spec),
    )
    .await?;
    world.record([outcome]);
    Ok(())
}

#[given(regex = r"^I install (\S+) chaincode named (\S+) to the (\S+) Fabric network$")]
async fn install_default(
    world: &mut FabricWorld,
    kind: String,
    name: String,
    tls: String,
) -> StepResult {
    install_first_org(world, &kind, &name, &name, &tls).await
}

#[given(regex = r"^I install (\S+) chaincode named (\S+) as (\S+) to the (\S+) Fabric network$")]
async fn install_default_with_id(
    world: &mut FabricWorld,
    kind: String,
    name: String,
    id: String,
    tls: String,
) -> StepResult {
    install_first_org(world, &kind, &name, &id, &tls).await
}

#[then(
    regex = r"^I can instantiate the (\S+) installed (\S+) chaincode at version (\S+) named (\S+) on the (\S+) Fabric network as organization (\S+) on channel (\S+) with endorsement policy (\S+) and args (.+)$"
)]
async fn instantiate(
    world: &mut FabricWorld,
    existing: String,
    kind: String,
    version: String,
    name: String,
    tls: String,
    org: String,
    channel: String,
    policy: String,
    args: String,
) -> StepResult {
    let plan = InstantiatePlan {
        chaincode: chaincode(&kind, &name, &name, &version)?,
        org,
        channel,
        policy,
        args: parse_args(&args)?,
        upgrade: parse_upgrade(&existing),
    };
    instantiate_plan(world, &tls, &plan).await
}

#[then(
    regex = r"^I can instantiate the (\S+) installed (\S+) chaincode at version (\S+) named (\S+) with identifier (\S+) on the (\S+) Fabric network as organization (\S+) on channel (\S+) with endorsement policy (\S+) and args (.+)$"
)]
async fn instantiate_with_id(
    world: &mut FabricWorld,
    existing: String,
    kind: String,
    version: String,
    name: String,
    id: String,
    tls: String,
    org: String,
    channel: String,
    policy: String,
    args: String,
) -> StepResult {
    let plan = InstantiatePlan {
        chaincode: chaincode(&kind, &name, &id, &version)?,
        org,
        channel,
        policy,
        args: parse_args(&args)?,
        upgrade: parse_upgrade(&existing),
    };
    instantiate_plan(world, &tls, &plan).await
}

#[given(
    regex = r"^I install/instantiate (\S+) chaincode named (\S+) at version (\S+) as (\S+) to the (\S+) Fabric network for all organizations on channel (\S+) with endorsement policy (\S+) and args (.+)$"
)]
async fn install_and_instantiate_all(
    world: &mut FabricWorld,
    kind: String,
    name: String,
    version: String,
    id: String,
    tls: String,
    channel: String,
    policy: String,
    args: String,
) -> StepResult {
    let spec = chaincode(&kind, &name, &id, &version)?;
    let args = parse_args(&args)?;
    let session = world.session(&tls, StepTimeout::Long)?;

    let report = within(
        StepTimeout::Long,
        session.install_and_instantiate_all(&channel, &spec, &policy, &args),
    )
    .await?;

    world.record(
        report
            .installs
            .iter()
            .map(|(_, outcome)| *outcome)
            .chain([report.instantiate]),
    );
    Ok(())
}

#[given(
    regex = r"^I force install/instantiate (\S+) chaincode named (\S+) at version (\S+) as (\S+) to the (\S+) Fabric network for all organizations on channel (\S+) with endorsement policy (\S+) and args (.+)$"
)]
async fn force_install_and_instantiate_all(
    world: &mut FabricWorld,
    kind: String,
    name: String,
    version: String,
    id: String,
    tls: String,
    channel: String,
    policy: String,
    args: String,
) -> StepResult {
    let spec = chaincode(&kind, &name, &id, &version)?;
    let args = parse_args(&args)?;
    let session = world.session(&tls, StepTimeout::Long)?;

    within(
        StepTimeout::Long,
        session.force_install_and_instantiate_all(&channel, &spec, &policy, &args),
    )
    .await?;
    world.last_outcomes.clear();
    Ok(())
}

#[then(regex = r"^the last chaincode operation was (\S+)$")]
async fn last_operation_was(world: &mut FabricWorld, expected: String) -> StepResult {
    world.expect_last_outcome(&expected)
}

async fn install_first_org(
    world: &mut FabricWorld,
    kind: &str,
    name: &str,
    id: &str,
    tls: &str,
) -> StepResult {
    let spec = chaincode(kind, name, id, DEFAULT_CHAINCODE_VERSION)?;
    let session = world.session(tls, StepTimeout::Short)?;
    let outcome = within(StepTimeout::Short, session.install_default(&spec)).await?;
    world.record([outcome]);
    Ok(())
}

async fn instantiate_plan(world: &mut FabricWorld, tls: &str, plan: &InstantiatePlan) -> StepResult {
    let session = world.session(tls, StepTimeout::Long)?;
    let outcome = within(StepTimeout::Long, session.instantiate_on_channel(plan)).await?;
    world.record([outcome]);
    Ok(())
}
