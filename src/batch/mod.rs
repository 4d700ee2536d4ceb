//! Batch Creation Module
//!
//! This module handles batch accumulation and the flush decision:
//! - BatchAccumulator: Appends transactions, raises count/size triggers
//! - FlushScheduler: Raises the periodic interval trigger
//! - FlushTrigger: Why a batch was flushed

mod accumulator;
mod scheduler;
mod trigger;

#[cfg(test)]
mod tests;

pub use accumulator::BatchAccumulator;
pub use scheduler::FlushScheduler;
pub use trigger::FlushTrigger;
