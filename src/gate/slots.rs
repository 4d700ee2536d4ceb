use crate::error::GateError;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::{Duration, Instant, timeout, timeout_at};

/// Largest pool a `SlotPool` can be built with
///
/// Bounded by the semaphore's own limit and by `acquire_many`, which takes
/// a `u32` when draining.
pub const MAX_SLOTS: usize = if Semaphore::MAX_PERMITS < u32::MAX as usize {
    Semaphore::MAX_PERMITS
} else {
    u32::MAX as usize
};

/// Fixed-size pool of leases backed by a semaphore
#[derive(Clone)]
pub struct SlotPool {
    /// Human-readable pool name, carried in errors and logs
    name: &'static str,
    /// Total number of slots; never changes after construction
    capacity: usize,
    /// Permits currently free (shared by every clone of the pool)
    semaphore: Arc<Semaphore>,
}

/// A held lease; dropping it returns the slot to its pool
#[derive(Debug)]
pub struct Slot {
    _permit: OwnedSemaphorePermit,
}

impl SlotPool {
    /// Creates a pool with `capacity` slots
    ///
    /// `capacity` must not exceed [`MAX_SLOTS`]; tuning validation
    /// guarantees it for every pool the dispatcher builds.
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            capacity,
            semaphore: Arc::new(Semaphore::new(capacity)),
        }
    }

    /// Wait for a free slot
    ///
    /// Waiters are served in FIFO order. A zero-capacity pool fails
    /// immediately instead of waiting forever.
    pub async fn acquire(&self) -> Result<Slot, GateError> {
        if self.capacity == 0 {
            return Err(GateError::Disabled(self.name));
        }

        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| GateError::Closed(self.name))?;
        Ok(Slot { _permit: permit })
    }

    /// Wait for a free slot, giving up at `deadline`
    ///
    /// A slot that is already free is taken even if `deadline` has passed.
    pub async fn acquire_until(&self, deadline: Instant) -> Result<Slot, GateError> {
        match timeout_at(deadline, self.acquire()).await {
            Ok(slot) => slot,
            Err(_) => Err(GateError::TimedOut(self.name)),
        }
    }

    /// Take a slot only if one is free right now
    pub fn try_acquire(&self) -> Option<Slot> {
        self.semaphore
            .clone()
            .try_acquire_owned()
            .ok()
            .map(|permit| Slot { _permit: permit })
    }

    /// Wait until every slot is back, up to `grace`
    ///
    /// # Returns
    /// `true` if the pool drained in time.
    pub async fn drain(&self, grace: Duration) -> bool {
        if self.capacity == 0 {
            return true;
        }

        let all = u32::try_from(self.capacity).unwrap_or(u32::MAX);
        matches!(
            timeout(grace, self.semaphore.acquire_many(all)).await,
            Ok(Ok(_))
        )
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn in_use(&self) -> usize {
        self.capacity.saturating_sub(self.available())
    }
}
