//! Bounded transaction intake.
//!
//! Queue overflow is backpressure, not an error: `enqueue` suspends the
//! caller until space frees up. The only rejection is after shutdown began.

use crate::{Transaction, error::DispatchError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::debug;

/// Producer side of the intake queue
///
/// Cheap to clone; every clone feeds the same single reader.
#[derive(Clone)]
pub struct TransactionQueue {
    /// Bounded channel into the dispatcher loop
    sender: mpsc::Sender<Transaction>,
    /// Cleared once shutdown begins; shared by every clone
    accepting: Arc<AtomicBool>,
    /// Channel capacity, used to derive the buffered count
    capacity: usize,
}

/// Consumer side of the intake queue, owned by the dispatcher loop
pub struct QueueReceiver {
    /// Single reader; closing it wakes blocked producers
    receiver: mpsc::Receiver<Transaction>,
}

/// Create a queue holding at most `capacity` transactions
///
/// `capacity` must be non-zero; tuning validation guarantees it.
pub fn bounded(capacity: usize) -> (TransactionQueue, QueueReceiver) {
    let (sender, receiver) = mpsc::channel(capacity);
    let queue = TransactionQueue {
        sender,
        accepting: Arc::new(AtomicBool::new(true)),
        capacity,
    };
    (queue, QueueReceiver { receiver })
}

impl TransactionQueue {
    /// Hand a transaction to the dispatcher
    ///
    /// Suspends while the queue is full. Waiting callers resume in arrival
    /// order. Fails only once the queue stopped accepting.
    pub async fn enqueue(&self, tx: Transaction) -> Result<(), DispatchError> {
        if !self.is_accepting() {
            return Err(DispatchError::ShuttingDown);
        }

        // A closed receiver hands the transaction back; dropping it drops the
        // result channel, but the caller already gets ShuttingDown here.
        self.sender
            .send(tx)
            .await
            .map_err(|_| DispatchError::ShuttingDown)
    }

    /// Stop admitting new transactions; already queued ones are still drained
    pub fn close(&self) {
        if self.accepting.swap(false, Ordering::SeqCst) {
            debug!("Transaction queue closed to new work");
        }
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }

    /// Transactions currently buffered
    pub fn len(&self) -> usize {
        self.capacity - self.sender.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl QueueReceiver {
    /// Next transaction, or `None` once closed and drained (or every producer is gone)
    pub async fn recv(&mut self) -> Option<Transaction> {
        self.receiver.recv().await
    }

    /// Refuse further sends, including callers currently blocked on a full queue
    pub fn close(&mut self) {
        self.receiver.close();
    }
}
