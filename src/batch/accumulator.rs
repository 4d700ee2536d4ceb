//! Batch Accumulator Module
//!
//! Collects dequeued transactions into the working batch and reports when a
//! count or size threshold is crossed. Owned by the single dispatcher loop,
//! so the working batch needs no locking.

use crate::{Batch, Transaction, batch::FlushTrigger};
use std::mem;

/// Working-batch builder
///
/// Maintains a sequential batch ID counter. Batches start from ID 1.
pub struct BatchAccumulator {
    /// Flush once the batch holds this many transactions
    threshold_count: usize,
    /// Flush once the batch payload reaches this many bytes
    threshold_size: usize,
    /// The working batch (may be empty)
    current: Batch,
    /// ID the next working batch will get
    next_batch_id: u64,
}

impl BatchAccumulator {
    /// Creates a new accumulator
    ///
    /// # Arguments
    /// * `threshold_count` - Transaction count that forces a flush
    /// * `threshold_size` - Cumulative payload bytes that force a flush
    pub fn new(threshold_count: usize, threshold_size: usize) -> Self {
        Self {
            threshold_count,
            threshold_size,
            current: Batch::new(1),
            next_batch_id: 2,
        }
    }

    /// Append a transaction to the working batch
    ///
    /// # Returns
    /// The trigger that fired, if the batch must now be flushed. A single
    /// transaction larger than the size threshold fires on its own.
    pub fn push(&mut self, tx: Transaction) -> Option<FlushTrigger> {
        self.current.push(tx);

        if self.current.len() >= self.threshold_count {
            Some(FlushTrigger::Count)
        } else if self.current.size_bytes >= self.threshold_size {
            Some(FlushTrigger::Size)
        } else {
            None
        }
    }

    /// Close the working batch and start a fresh one
    ///
    /// # Returns
    /// `None` if nothing was accumulated. The batch ID is only consumed when
    /// a non-empty batch is handed out.
    pub fn take(&mut self) -> Option<Batch> {
        if self.current.is_empty() {
            return None;
        }

        let fresh = Batch::new(self.next_batch_id);
        self.next_batch_id += 1;
        Some(mem::replace(&mut self.current, fresh))
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    pub fn size_bytes(&self) -> usize {
        self.current.size_bytes
    }
}
