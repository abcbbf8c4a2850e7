use std::{future::Future, time::Duration};

use fabric_testing_core::{DynError, RunContext, admin::NetworkTarget};
use tokio::time::timeout;

use crate::WorkflowError;

/// One admin interaction with a network: the run context, the resolved
/// target and the budget applied to each remote call.
#[derive(Clone, Debug)]
pub struct AdminSession {
    ctx: RunContext,
    target: NetworkTarget,
    call_timeout: Duration,
}

impl AdminSession {
    #[must_use]
    pub const fn new(ctx: RunContext, target: NetworkTarget, call_timeout: Duration) -> Self {
        Self {
            ctx,
            target,
            call_timeout,
        }
    }

    #[must_use]
    pub const fn ctx(&self) -> &RunContext {
        &self.ctx
    }

    #[must_use]
    pub const fn target(&self) -> &NetworkTarget {
        &self.target
    }

    #[must_use]
    pub const fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Runs an untracked remote call under the session timeout.
    pub(crate) async fn bounded<T, Fut>(
        &self,
        action: impl Into<String>,
        call: Fut,
    ) -> Result<T, WorkflowError>
    where
        Fut: Future<Output = Result<T, DynError>>,
    {
        let action = action.into();
        match timeout(self.call_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => Err(WorkflowError::Remote { action, source }),
            Err(_) => Err(WorkflowError::Timeout {
                action,
                timeout: self.call_timeout,
            }),
        }
    }
}
