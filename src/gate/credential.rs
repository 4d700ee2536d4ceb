use crate::error::GateError;
use crate::gate::{Slot, SlotPool};
use std::future::Future;
use tracing::debug;

/// Bounds concurrent credential (API key) operations
///
/// Sized from the per-host connection budget left after bulk submission.
/// Shares nothing with the pending gate.
#[derive(Clone)]
pub struct CredentialThrottle {
    /// One slot per credential operation in progress
    slots: SlotPool,
}

impl CredentialThrottle {
    pub fn new(max_parallel: usize) -> Self {
        Self {
            slots: SlotPool::new("credential throttle", max_parallel),
        }
    }

    pub async fn acquire(&self) -> Result<Slot, GateError> {
        self.slots.acquire().await
    }

    /// Run `op` while holding a credential slot
    ///
    /// The slot is released when `op` completes, fails, or is cancelled.
    pub async fn run<F>(&self, op: F) -> Result<F::Output, GateError>
    where
        F: Future,
    {
        let _slot = self.acquire().await?;
        debug!(in_use = self.slots.in_use(), "Credential slot acquired");
        Ok(op.await)
    }

    pub fn in_flight(&self) -> usize {
        self.slots.in_use()
    }
}
