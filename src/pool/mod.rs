//! Transaction Queue Module
//!
//! Bounded intake between callers and the dispatcher loop:
//! - Many producers enqueue concurrently and block (FIFO) while the queue is full
//! - A single reader, the batch accumulator, drains it

mod queue;

pub use queue::{QueueReceiver, TransactionQueue, bounded};
