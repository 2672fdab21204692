//! Eventual-Consistency Waiter
//!
//! Polls a status-bearing remote object until it reaches a target state,
//! a failure state, or the deadline passes.

use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::aws::RemoteError;
use crate::error::{Error, Result};

/// Poll intervals below this are raised to it
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// States to wait on and how long to wait
#[derive(Debug, Clone)]
pub struct WaitSpec {
    pub pending: BTreeSet<String>,
    pub target: BTreeSet<String>,
    pub failure: BTreeSet<String>,
    pub timeout: Duration,
    pub poll_interval: Duration,
    /// Treat a not-found poll result as reaching the target (deletion waits)
    pub not_found_is_target: bool,
}

impl WaitSpec {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            pending: BTreeSet::new(),
            target: BTreeSet::new(),
            failure: BTreeSet::new(),
            timeout,
            poll_interval,
            not_found_is_target: false,
        }
    }

    pub fn pending<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pending.extend(states.into_iter().map(Into::into));
        self
    }

    pub fn target<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target.extend(states.into_iter().map(Into::into));
        self
    }

    pub fn failure<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failure.extend(states.into_iter().map(Into::into));
        self
    }

    pub fn until_not_found(mut self) -> Self {
        self.not_found_is_target = true;
        self
    }

    /// Check the state sets are pairwise disjoint and something can end the wait
    pub fn validate(&self) -> Result<()> {
        let sets = [
            ("pending", &self.pending),
            ("target", &self.target),
            ("failure", &self.failure),
        ];
        for (i, (a_name, a)) in sets.iter().enumerate() {
            for (b_name, b) in &sets[i + 1..] {
                if let Some(state) = a.intersection(b).next() {
                    return Err(Error::InvalidWaitSpec(format!(
                        "state {:?} is both {} and {}",
                        state, a_name, b_name
                    )));
                }
            }
        }
        if self.target.is_empty() && !self.not_found_is_target {
            return Err(Error::InvalidWaitSpec("no target state".to_string()));
        }
        Ok(())
    }

    fn interval(&self) -> Duration {
        self.poll_interval.max(MIN_POLL_INTERVAL)
    }

    fn known_states(&self) -> Vec<String> {
        self.pending
            .iter()
            .chain(&self.target)
            .chain(&self.failure)
            .cloned()
            .collect()
    }
}

/// How a successful wait ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The object reported one of the target states
    Reached(String),
    /// The object no longer exists
    Gone,
}

/// Poll until `spec` is satisfied.
///
/// `poll` is invoked immediately and then once per interval. The deadline is
/// fixed when the wait starts. Cancellation is observed between polls only.
pub async fn wait_for<F, Fut>(
    spec: &WaitSpec,
    cancel: &CancellationToken,
    mut poll: F,
) -> Result<WaitOutcome>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<String, RemoteError>>,
{
    spec.validate()?;

    let deadline = Instant::now() + spec.timeout;
    let interval = spec.interval();
    let mut last_status: Option<String> = None;
    let mut polls: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            tracing::debug!("wait cancelled after {} polls", polls);
            return Err(Error::Cancelled);
        }

        polls += 1;
        let status = match poll().await {
            Ok(status) => status,
            Err(RemoteError::NotFound(what)) if spec.not_found_is_target => {
                tracing::debug!("{} not found after {} polls, treating as gone", what, polls);
                return Ok(WaitOutcome::Gone);
            }
            Err(e) => return Err(e.into()),
        };

        tracing::trace!("poll {} returned state {:?}", polls, status);

        if spec.target.contains(&status) {
            tracing::debug!("reached state {:?} after {} polls", status, polls);
            return Ok(WaitOutcome::Reached(status));
        }
        if spec.failure.contains(&status) {
            return Err(Error::TerminalFailure { status });
        }
        if !spec.pending.contains(&status) {
            return Err(Error::UnexpectedState {
                status,
                expected: spec.known_states(),
            });
        }
        last_status = Some(status);

        let now = Instant::now();
        if now >= deadline {
            return Err(Error::Timeout {
                last_status,
                timeout: spec.timeout,
            });
        }

        let sleep = interval.min(deadline - now);
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("wait cancelled after {} polls", polls);
                return Err(Error::Cancelled);
            }
            _ = tokio::time::sleep(sleep) => {}
        }
    }
}
