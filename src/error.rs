//! Error kinds surfaced by the reconciliation core

use std::time::Duration;

use crate::aws::RemoteError;

/// Result alias for the reconciliation core
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the ID codec and the waiter.
///
/// None of these are retried internally; retry policy belongs to the adapter
/// that called into the core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A composite ID did not split into the expected number of parts
    #[error("malformed ID {id:?}: expected {expected} parts separated by {delimiter:?}")]
    MalformedId {
        id: String,
        expected: usize,
        delimiter: char,
    },

    /// A part handed to the encoder contains the delimiter
    #[error("ID part {part:?} must not contain {delimiter:?}")]
    InvalidPart { part: String, delimiter: char },

    #[error("invalid wait spec: {0}")]
    InvalidWaitSpec(String),

    /// The deadline passed before a target state was observed
    #[error("timeout after {timeout:?} waiting for state (last state: {})", .last_status.as_deref().unwrap_or("none"))]
    Timeout {
        last_status: Option<String>,
        timeout: Duration,
    },

    /// The remote object reached a known-bad terminal state
    #[error("resource reached terminal failure state {status:?}")]
    TerminalFailure { status: String },

    /// The remote object reported a state outside the known universe
    #[error("unexpected state {status:?}, wanted one of {expected:?}")]
    UnexpectedState {
        status: String,
        expected: Vec<String>,
    },

    #[error("wait cancelled")]
    Cancelled,

    #[error(transparent)]
    Remote(#[from] RemoteError),
}
