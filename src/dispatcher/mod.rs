//! Bulk Dispatcher Module
//!
//! Wires the pipeline together:
//! 1. Callers enqueue transactions through a `DispatcherHandle`
//! 2. A single loop drains the queue into the working batch
//! 3. Count, size, or interval triggers flush the batch
//! 4. Each flushed batch waits for a pending slot, then is submitted on its own task
//! 5. Per-item outcomes are fanned back out to each transaction's caller
//!
//! Credential operations bypass the batch pipeline and are bounded only by
//! the credential throttle.

mod dispatcher;
mod fanout;
mod handle;


pub use dispatcher::{Dispatcher, DrainReport};
pub use handle::{DispatcherHandle, PendingResult};
