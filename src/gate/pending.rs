use crate::error::GateError;
use crate::gate::{Slot, SlotPool};
use tokio::time::{Duration, Instant};

/// Bounds the number of batches in flight to the backend
///
/// The dispatcher loop acquires a slot before handing a batch off. While
/// the gate is saturated the loop stops draining the intake queue, which
/// pushes backpressure out to every caller of `enqueue`.
#[derive(Clone)]
pub struct PendingGate {
    /// One slot per batch submission in flight
    slots: SlotPool,
}

impl PendingGate {
    pub fn new(max_pending: usize) -> Self {
        Self {
            slots: SlotPool::new("pending gate", max_pending),
        }
    }

    pub async fn acquire(&self) -> Result<Slot, GateError> {
        self.slots.acquire().await
    }

    /// Like `acquire`, but gives up with `GateError::TimedOut` at `deadline`
    pub async fn acquire_until(&self, deadline: Instant) -> Result<Slot, GateError> {
        self.slots.acquire_until(deadline).await
    }

    /// Wait for all in-flight batches to complete, up to `grace`
    pub async fn drain(&self, grace: Duration) -> bool {
        self.slots.drain(grace).await
    }

    pub fn in_flight(&self) -> usize {
        self.slots.in_use()
    }
}
