//! This crate batches many small, concurrently submitted indexing operations
//! into fewer, larger backend calls. It bounds the number of batches in
//! flight, applies queue backpressure to callers, and separately throttles
//! credential operations.

pub mod types; // Transactions, batches, per-item responses.
pub mod error; // Library error enums.
pub mod config; // Configuration tree loaded from TOML.
pub mod tuning; // Validated tuning parameters derived from the configuration.
pub mod pool; // Bounded transaction intake queue.
pub mod batch; // Batch accumulation and flush triggers.
pub mod gate; // Pending gate and credential throttle.
pub mod backend; // Backend contract and the in-memory store.
pub mod dispatcher; // The accumulation/flush loop and caller handle.
pub mod api; // JSON-RPC front door.

// Re-export commonly used types and configurations for easier access.
pub use types::*;
pub use config::Config;
pub use tuning::TuningParams;
pub use dispatcher::{Dispatcher, DispatcherHandle};
