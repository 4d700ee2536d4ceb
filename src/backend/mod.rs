//! Backend Module
//!
//! The remote indexing service, seen as a black box: it takes an ordered
//! batch and returns one outcome per transaction, in the same order, or a
//! transport failure for the whole batch.

mod memory;

pub use memory::MemoryBackend;

use crate::{Batch, ItemResult, error::TransportError};
use std::future::Future;

pub trait Backend: Send + Sync + 'static {
    /// Submit a batch in one round trip
    ///
    /// The returned outcomes are positional: entry `i` belongs to
    /// `batch.transactions[i]`.
    fn submit(
        &self,
        batch: &Batch,
    ) -> impl Future<Output = Result<Vec<ItemResult>, TransportError>> + Send;
}
