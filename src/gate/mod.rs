//! Bounded Parallelism Module
//!
//! Counting-semaphore slot pools that bound concurrent work:
//! - PendingGate: batches in flight to the backend (`max_pending`)
//! - CredentialThrottle: credential operations (`apikey_max_parallel`)
//!
//! The two pools are independent; saturating one never blocks the other.
//! Slots are leases released on drop, so every exit path gives them back.

mod credential;
mod pending;
mod slots;


pub use credential::CredentialThrottle;
pub use pending::PendingGate;
pub use slots::{MAX_SLOTS, Slot, SlotPool};
