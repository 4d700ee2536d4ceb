//! Error Types
//!
//! Library-level error enums. The binary and the API server wrap these in
//! `anyhow` at their boundaries.

use thiserror::Error;

/// Invalid tuning parameters, detected once at startup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error(
        "credential parallelism is negative: max_conn_per_host ({max_conn_per_host}) < max_pending ({max_pending})"
    )]
    NegativeCredentialParallelism {
        max_conn_per_host: usize,
        max_pending: usize,
    },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} ({value}) exceeds the maximum of {max}")]
    TooLarge {
        field: &'static str,
        value: usize,
        max: usize,
    },
}

/// Errors surfaced to callers of the dispatcher handle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("dispatcher is shutting down")]
    ShuttingDown,

    #[error("transaction result was lost before delivery")]
    ResultLost,

    #[error(transparent)]
    Gate(#[from] GateError),
}

/// Failure of a whole batch submission at the transport level
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport failure: {0}")]
pub struct TransportError(pub String);

/// Outcome of a single transaction that did not succeed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    #[error("version conflict on {index}/{id}")]
    Conflict { index: String, id: String },

    #[error("document {index}/{id} not found")]
    NotFound { index: String, id: String },

    #[error("rejected with status {status}: {reason}")]
    Rejected { status: u16, reason: String },

    #[error("batch transport failed: {0}")]
    Transport(String),
}

/// Slot pool failures: closed, zero capacity, or a deadline that passed first
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("{0} is closed")]
    Closed(&'static str),

    #[error("{0} has zero capacity")]
    Disabled(&'static str),

    #[error("timed out waiting for {0}")]
    TimedOut(&'static str),
}

/// Everything a caller waiting on a single transaction can get back
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Item(#[from] ItemError),
}
