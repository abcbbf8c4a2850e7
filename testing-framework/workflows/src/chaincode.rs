use fabric_testing_core::{
    admin::{ChaincodeSpec, InstallRequest, InstantiateRequest},
    tracker::{Outcome, key::OperationScope},
};
use tracing::{error, info};

use crate::{AdminSession, WorkflowError};

/// Version used by the install steps that do not name one.
pub const DEFAULT_CHAINCODE_VERSION: &str = "1.0.0";

/// Result of installing on every organization of a channel and
/// instantiating once.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeploymentReport {
    pub installs: Vec<(String, Outcome)>,
    pub instantiate: Outcome,
}

/// Parameters of an instantiation; `policy` names an entry of the policy book.
#[derive(Clone, Debug)]
pub struct InstantiatePlan {
    pub chaincode: ChaincodeSpec,
    pub org: String,
    pub channel: String,
    pub policy: String,
    pub args: Vec<String>,
    pub upgrade: bool,
}

impl AdminSession {
    /// Installs on `org` unless this run already installed the same
    /// chaincode there.
    pub async fn install_for_org(
        &self,
        org: &str,
        channel: &str,
        chaincode: &ChaincodeSpec,
    ) -> Result<Outcome, WorkflowError> {
        let scope = OperationScope::organization(org)?;
        let request = InstallRequest {
            target: self.target().clone(),
            org: org.to_owned(),
            channel: channel.to_owned(),
            chaincode: chaincode.clone(),
        };

        let admin = self.ctx().admin();
        let outcome = self
            .ctx()
            .tracker()
            .execute(scope, chaincode.key().clone(), self.call_timeout(), || {
                admin.install_chaincode(&request)
            })
            .await?;

        info!(org, key = %chaincode.key(), ?outcome, "install step finished");
        Ok(outcome)
    }

    /// Installs on the profile's first organization, for its first channel,
    /// at [`DEFAULT_CHAINCODE_VERSION`].
    pub async fn install_default(&self, chaincode: &ChaincodeSpec) -> Result<Outcome, WorkflowError> {
        let profile = &self.target().profile;
        let org = profile.first_organization()?;
        let channel = profile.first_channel()?;
        self.install_for_org(org, channel, chaincode).await
    }

    /// Instantiates (or upgrades) on the plan's channel unless this run
    /// already did so for the same chaincode.
    pub async fn instantiate_on_channel(
        &self,
        plan: &InstantiatePlan,
    ) -> Result<Outcome, WorkflowError> {
        let scope = OperationScope::channel(&plan.channel)?;
        let policy = self.ctx().policies()?.policy(&plan.policy)?.clone();
        let request = InstantiateRequest {
            target: self.target().clone(),
            org: plan.org.clone(),
            channel: plan.channel.clone(),
            chaincode: plan.chaincode.clone(),
            args: plan.args.clone(),
            upgrade: plan.upgrade,
            policy,
        };

        let admin = self.ctx().admin();
        let outcome = self
            .ctx()
            .tracker()
            .execute(
                scope,
                plan.chaincode.key().clone(),
                self.call_timeout(),
                || admin.instantiate_chaincode(&request),
            )
            .await?;

        info!(
            channel = %plan.channel,
            key = %plan.chaincode.key(),
            ?outcome,
            "instantiate step finished"
        );
        Ok(outcome)
    }

    /// Installs on every organization of `channel`, then instantiates once
    /// as the first of them. Both halves are tracked.
    pub async fn install_and_instantiate_all(
        &self,
        channel: &str,
        chaincode: &ChaincodeSpec,
        policy: &str,
        args: &[String],
    ) -> Result<DeploymentReport, WorkflowError> {
        let result = async {
            let orgs = self.channel_organizations(channel)?;

            let mut installs = Vec::with_capacity(orgs.len());
            for org in &orgs {
                let outcome = self.install_for_org(org, channel, chaincode).await?;
                installs.push((org.clone(), outcome));
            }

            let instantiate = self
                .instantiate_on_channel(&InstantiatePlan {
                    chaincode: chaincode.clone(),
                    org: orgs[0].clone(),
                    channel: channel.to_owned(),
                    policy: policy.to_owned(),
                    args: args.to_vec(),
                    upgrade: false,
                })
                .await?;

            Ok::<_, WorkflowError>(DeploymentReport {
                installs,
                instantiate,
            })
        }
        .await;

        result.inspect_err(|err| error!(error = %err, "install/instantiate failed"))
    }

    /// Same as [`Self::install_and_instantiate_all`] but bypasses the
    /// tracker: every organization is installed and the chaincode is
    /// instantiated again, whatever this run did before.
    pub async fn force_install_and_instantiate_all(
        &self,
        channel: &str,
        chaincode: &ChaincodeSpec,
        policy: &str,
        args: &[String],
    ) -> Result<(), WorkflowError> {
        let result = async {
            let orgs = self.channel_organizations(channel)?;
            let admin = self.ctx().admin();

            for org in &orgs {
                let request = InstallRequest {
                    target: self.target().clone(),
                    org: org.clone(),
                    channel: channel.to_owned(),
                    chaincode: chaincode.clone(),
                };
                self.bounded(
                    format!("install {} on '{org}'", chaincode.key()),
                    admin.install_chaincode(&request),
                )
                .await?;
            }

            let request = InstantiateRequest {
                target: self.target().clone(),
                org: orgs[0].clone(),
                channel: channel.to_owned(),
                chaincode: chaincode.clone(),
                args: args.to_vec(),
                upgrade: false,
                policy: self.ctx().policies()?.policy(policy)?.clone(),
            };
            self.bounded(
                format!("instantiate {} on '{channel}'", chaincode.key()),
                admin.instantiate_chaincode(&request),
            )
            .await?;

            Ok::<(), WorkflowError>(())
        }
        .await;

        result.inspect_err(|err| error!(error = %err, "force install/instantiate failed"))
    }

    fn channel_organizations(&self, channel: &str) -> Result<Vec<String>, WorkflowError> {
        let orgs = self.target().profile.organizations_for_channel(channel)?;
        if orgs.is_empty() {
            return Err(WorkflowError::InvalidArgument {
                message: format!("no organization owns a peer of channel '{channel}'"),
            });
        }
        Ok(orgs)
    }
}
