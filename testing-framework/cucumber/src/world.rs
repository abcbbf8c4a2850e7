use std::{future::Future, time::Duration};

use cucumber::World;
use fabric_testing_config::{ConfigError, ConnectionProfile, StepTimeout, TlsMode};
use fabric_testing_core::{
    RunContext,
    admin::{ChaincodeSpec, NetworkTarget},
    tracker::{Outcome, key::{ChaincodeKind, KeyError}},
};
use fabric_testing_workflows::{AdminSession, WorkflowError};
use thiserror::Error;
use tokio::time::timeout;

#[derive(Debug, Error)]
pub enum StepError {
    #[error("run context is not attached; the runner must inject one before each scenario")]
    MissingContext,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
    #[error("step exceeded its {budget:?} budget of {after:?}")]
    Timeout { budget: StepTimeout, after: Duration },
    #[error("expected last chaincode operation to be {expected}, got {actual}")]
    OutcomeMismatch { expected: String, actual: String },
}

pub type StepResult = Result<(), StepError>;

/// Organization clients opened by the network-instances step.
#[derive(Clone, Debug)]
pub struct ConnectedClients {
    pub target: NetworkTarget,
    pub orgs: Vec<String>,
}

#[derive(World, Debug, Default)]
pub struct FabricWorld {
    pub ctx: Option<RunContext>,
    pub clients: Option<ConnectedClients>,
    pub last_outcomes: Vec<Outcome>,
}

impl FabricWorld {
    /// Attaches the run-wide context. The tracker inside it is shared by
    /// every scenario of the run.
    pub fn attach(&mut self, ctx: RunContext) {
        self.ctx = Some(ctx);
    }

    pub fn context(&self) -> Result<&RunContext, StepError> {
        self.ctx.as_ref().ok_or(StepError::MissingContext)
    }

    /// Opens an admin session on the connection profile selected by
    /// `tls_label` (`tls` or `non-tls`).
    pub fn session(&self, tls_label: &str, budget: StepTimeout) -> Result<AdminSession, StepError> {
        let ctx = self.context()?;
        let tls = TlsMode::parse(tls_label)?;
        let target = ctx.target(tls)?;
        Ok(AdminSession::new(ctx.clone(), target, budget.duration()))
    }

    /// Session on the multi-organization network profile, always over TLS.
    pub fn network_session(&self, budget: StepTimeout) -> Result<AdminSession, StepError> {
        let ctx = self.context()?;
        let profile = ConnectionProfile::load(&ctx.fixtures().network_profile())?;
        let target = NetworkTarget::new(profile, TlsMode::Tls);
        Ok(AdminSession::new(ctx.clone(), target, budget.duration()))
    }

    pub fn record(&mut self, outcomes: impl IntoIterator<Item = Outcome>) {
        self.last_outcomes = outcomes.into_iter().collect();
    }

    pub fn expect_last_outcome(&self, expected: &str) -> StepResult {
        let expected = parse_outcome(expected)?;
        match self.last_outcomes.as_slice() {
            [] => Err(StepError::OutcomeMismatch {
                expected: format!("{expected:?}"),
                actual: "no chaincode operation".to_owned(),
            }),
            outcomes if outcomes.iter().all(|outcome| *outcome == expected) => Ok(()),
            outcomes => Err(StepError::OutcomeMismatch {
                expected: format!("{expected:?}"),
                actual: format!("{outcomes:?}"),
            }),
        }
    }
}

/// Bounds a whole step by its budget, on top of the per-call timeouts
/// applied by the session.
pub async fn within<T, E, Fut>(budget: StepTimeout, step: Fut) -> Result<T, StepError>
where
    Fut: Future<Output = Result<T, E>>,
    StepError: From<E>,
{
    let after = budget.duration();
    match timeout(after, step).await {
        Ok(result) => result.map_err(StepError::from),
        Err(_) => Err(StepError::Timeout { budget, after }),
    }
}

pub fn chaincode(kind: &str, name: &str, id: &str, version: &str) -> Result<ChaincodeSpec, StepError> {
    let kind = ChaincodeKind::parse(kind)?;
    Ok(ChaincodeSpec::new(name, id, kind, version)?)
}

fn parse_outcome(value: &str) -> Result<Outcome, StepError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "executed" => Ok(Outcome::Executed),
        "skipped" => Ok(Outcome::Skipped),
        "joined" => Ok(Outcome::Joined),
        other => Err(StepError::InvalidArgument {
            message: format!("unknown outcome '{other}', expected executed, skipped or joined"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_fail_without_context() {
        let world = FabricWorld::default();
        let err = world.session("tls", StepTimeout::Short).unwrap_err();
        assert!(matches!(err, StepError::MissingContext));
    }

    #[test]
    fn last_outcome_must_match_every_operation() {
        let mut world = FabricWorld::default();
        assert!(world.expect_last_outcome("skipped").is_err());

        world.record([Outcome::Skipped, Outcome::Skipped]);
        world.expect_last_outcome("skipped").unwrap();

        world.record([Outcome::Skipped, Outcome::Executed]);
        let err = world.expect_last_outcome("skipped").unwrap_err();
        assert!(matches!(err, StepError::OutcomeMismatch { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn within_reports_budget_on_timeout() {
        let err = within(StepTimeout::Short, async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok::<(), StepError>(())
        })
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            StepError::Timeout {
                budget: StepTimeout::Short,
                ..
            }
        ));
    }
}
