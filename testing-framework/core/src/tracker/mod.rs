//! Run-scoped bookkeeping that keeps expensive remote operations from being
//! repeated.
//!
//! A key moves from absent to completed exactly once per run and is never
//! reverted. While an operation is running its key is held as *pending*:
//! further callers for the same (scope, key) wait for that execution instead
//! of issuing their own. A failed or timed-out execution leaves the key absent
//! so a later call can retry.
//!
//! The remote side is assumed to tolerate repeats: an operation that succeeds
//! remotely but reports an error locally is not recorded and will be issued
//! again by the next caller.

pub mod key;

use std::{
    collections::HashMap,
    fmt,
    future::Future,
    hash::Hash,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use fabric_testing_env as tf_env;
use thiserror::Error;
use tokio::{sync::watch, time::timeout};
use tracing::{debug, info, warn};

use crate::DynError;

type LeaderResult = Result<(), OperationFailure>;

/// How a call to [`OperationTracker::execute`] was satisfied.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// The operation ran for this call and succeeded.
    Executed,
    /// The key was already completed; the operation was not invoked.
    Skipped,
    /// Another caller was running the same key; its success was reused.
    Joined,
}

impl Outcome {
    /// Whether this call invoked the operation itself.
    #[must_use]
    pub const fn invoked(self) -> bool {
        matches!(self, Self::Executed)
    }

    #[must_use]
    pub const fn is_skipped(self) -> bool {
        matches!(self, Self::Skipped)
    }
}

/// Failure of a tracked execution, shared with every caller that waited on it.
#[derive(Clone, Debug, Error)]
pub enum OperationFailure {
    #[error("{error}")]
    Remote { error: Arc<DynError> },
    #[error("timed out after {timeout:?}")]
    Timeout { timeout: Duration },
}

impl OperationFailure {
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[derive(Clone, Debug, Error)]
pub enum TrackerError {
    #[error("operation {key} in {scope} failed: {failure}")]
    Failed {
        scope: String,
        key: String,
        #[source]
        failure: OperationFailure,
    },
    #[error("{scope} is not tracked in this run")]
    UnknownScope { scope: String },
}

impl TrackerError {
    #[must_use]
    pub const fn failure(&self) -> Option<&OperationFailure> {
        match self {
            Self::Failed { failure, .. } => Some(failure),
            Self::UnknownScope { .. } => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TrackerConfig {
    /// When disabled, concurrent callers for the same key may each invoke the
    /// operation before either records completion.
    pub in_flight_dedup: bool,
}

impl TrackerConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            in_flight_dedup: tf_env::fabric_tracker_in_flight_dedup().unwrap_or(true),
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            in_flight_dedup: true,
        }
    }
}

enum Slot {
    Completed,
    Pending(watch::Receiver<Option<LeaderResult>>),
}

enum Claim {
    Completed,
    Wait(watch::Receiver<Option<LeaderResult>>),
    Lead(Option<watch::Sender<Option<LeaderResult>>>),
}

/// Tracks which (scope, key) operations already ran during a test run.
pub struct OperationTracker<S, K> {
    config: TrackerConfig,
    state: Mutex<HashMap<S, HashMap<K, Slot>>>,
}

impl<S, K> Default for OperationTracker<S, K>
where
    S: Clone + Eq + Hash + fmt::Display,
    K: Clone + Eq + Hash + fmt::Display,
{
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl<S, K> OperationTracker<S, K>
where
    S: Clone + Eq + Hash + fmt::Display,
    K: Clone + Eq + Hash + fmt::Display,
{
    #[must_use]
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            state: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub const fn config(&self) -> TrackerConfig {
        self.config
    }

    pub fn ensure_scope(&self, scope: &S) {
        let mut state = self.lock();
        if !state.contains_key(scope) {
            debug!(%scope, "tracking new scope");
            state.insert(scope.clone(), HashMap::new());
        }
    }

    /// Unknown scopes read as empty.
    #[must_use]
    pub fn has_completed(&self, scope: &S, key: &K) -> bool {
        matches!(
            self.lock().get(scope).and_then(|keys| keys.get(key)),
            Some(Slot::Completed)
        )
    }

    #[must_use]
    pub fn is_in_flight(&self, scope: &S, key: &K) -> bool {
        matches!(
            self.lock().get(scope).and_then(|keys| keys.get(key)),
            Some(Slot::Pending(_))
        )
    }

    /// Completed keys of a scope, in no particular order. The scope must have
    /// been seen by [`Self::ensure_scope`] or [`Self::execute`].
    pub fn completed_keys(&self, scope: &S) -> Result<Vec<K>, TrackerError> {
        let state = self.lock();
        let keys = state.get(scope).ok_or_else(|| TrackerError::UnknownScope {
            scope: scope.to_string(),
        })?;

        Ok(keys
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Completed))
            .map(|(key, _)| key.clone())
            .collect())
    }

    /// Runs `operation` unless `key` already completed in `scope`, bounding
    /// it by `timeout_duration`.
    ///
    /// A second caller arriving while the first is still running waits for it
    /// and receives the same result ([`Outcome::Joined`] or the same
    /// failure). If the running caller is dropped before finishing, one of the
    /// waiters takes over. A waiter gives up after its own `timeout_duration`
    /// and leaves the running operation untouched.
    pub async fn execute<F, Fut>(
        &self,
        scope: S,
        key: K,
        timeout_duration: Duration,
        operation: F,
    ) -> Result<Outcome, TrackerError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), DynError>>,
    {
        self.ensure_scope(&scope);

        let sender = loop {
            match self.claim(&scope, &key) {
                Claim::Completed => {
                    debug!(%scope, %key, "operation already completed, skipping");
                    return Ok(Outcome::Skipped);
                }
                Claim::Wait(receiver) => {
                    debug!(%scope, %key, "operation in flight, waiting for it");
                    let Ok(joined) = timeout(timeout_duration, wait_for_leader(receiver)).await
                    else {
                        warn!(%scope, %key, "gave up waiting for in-flight operation");
                        return Err(failed(
                            &scope,
                            &key,
                            OperationFailure::Timeout {
                                timeout: timeout_duration,
                            },
                        ));
                    };
                    match joined {
                        Some(Ok(())) => return Ok(Outcome::Joined),
                        Some(Err(failure)) => return Err(failed(&scope, &key, failure)),
                        None => {
                            debug!(%scope, %key, "in-flight operation abandoned, retrying");
                        }
                    }
                }
                Claim::Lead(sender) => break sender,
            }
        };

        let mut pending = PendingGuard {
            tracker: self,
            scope: &scope,
            key: &key,
            sender,
            resolved: false,
        };

        info!(
            %scope,
            %key,
            timeout_secs = timeout_duration.as_secs_f32(),
            "executing tracked operation"
        );

        let result = match timeout(timeout_duration, operation()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(error)) => Err(OperationFailure::Remote {
                error: Arc::new(error),
            }),
            Err(_) => Err(OperationFailure::Timeout {
                timeout: timeout_duration,
            }),
        };

        pending.resolve(&result);

        match result {
            Ok(()) => {
                debug!(%scope, %key, "tracked operation completed");
                Ok(Outcome::Executed)
            }
            Err(failure) => {
                warn!(%scope, %key, error = %failure, "tracked operation failed");
                Err(failed(&scope, &key, failure))
            }
        }
    }

    fn claim(&self, scope: &S, key: &K) -> Claim {
        let mut state = self.lock();
        let keys = state.entry(scope.clone()).or_default();

        match keys.get(key) {
            Some(Slot::Completed) => Claim::Completed,
            Some(Slot::Pending(receiver)) => Claim::Wait(receiver.clone()),
            None if self.config.in_flight_dedup => {
                let (sender, receiver) = watch::channel(None);
                keys.insert(key.clone(), Slot::Pending(receiver));
                Claim::Lead(Some(sender))
            }
            None => Claim::Lead(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<S, HashMap<K, Slot>>> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Owns the pending slot of the caller running an operation. Dropping it
/// unresolved (cancellation) clears the slot so waiters can retry.
struct PendingGuard<'a, S, K>
where
    S: Clone + Eq + Hash + fmt::Display,
    K: Clone + Eq + Hash + fmt::Display,
{
    tracker: &'a OperationTracker<S, K>,
    scope: &'a S,
    key: &'a K,
    sender: Option<watch::Sender<Option<LeaderResult>>>,
    resolved: bool,
}

impl<S, K> PendingGuard<'_, S, K>
where
    S: Clone + Eq + Hash + fmt::Display,
    K: Clone + Eq + Hash + fmt::Display,
{
    fn resolve(&mut self, result: &LeaderResult) {
        let mut state = self.tracker.lock();
        let keys = state.entry(self.scope.clone()).or_default();

        if result.is_ok() {
            keys.insert(self.key.clone(), Slot::Completed);
        } else if matches!(keys.get(self.key), Some(Slot::Pending(_))) {
            keys.remove(self.key);
        }

        // Published under the lock so a woken waiter never observes the old slot.
        if let Some(sender) = self.sender.take() {
            sender.send_replace(Some(result.clone()));
        }
        self.resolved = true;
    }
}

impl<S, K> Drop for PendingGuard<'_, S, K>
where
    S: Clone + Eq + Hash + fmt::Display,
    K: Clone + Eq + Hash + fmt::Display,
{
    fn drop(&mut self) {
        if self.resolved || self.sender.is_none() {
            return;
        }

        let mut state = self.tracker.lock();
        if let Some(keys) = state.get_mut(self.scope) {
            if matches!(keys.get(self.key), Some(Slot::Pending(_))) {
                keys.remove(self.key);
            }
        }
        warn!(scope = %self.scope, key = %self.key, "tracked operation cancelled before completion");
    }
}

async fn wait_for_leader(
    mut receiver: watch::Receiver<Option<LeaderResult>>,
) -> Option<LeaderResult> {
    match receiver.wait_for(Option::is_some).await {
        Ok(result) => Option::clone(&result),
        Err(_) => None,
    }
}

fn failed(
    scope: &impl fmt::Display,
    key: &impl fmt::Display,
    failure: OperationFailure,
) -> TrackerError {
    TrackerError::Failed {
        scope: scope.to_string(),
        key: key.to_string(),
        failure,
    }
}
