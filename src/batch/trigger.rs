//! Batch Trigger Module
//!
//! The reasons a working batch gets flushed. Count and size triggers are
//! raised by the accumulator after each append; the interval trigger comes
//! from the flush scheduler; the shutdown trigger flushes whatever is left.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    /// Transaction count reached `flush_threshold_count`
    Count,
    /// Cumulative payload reached `flush_threshold_size`
    Size,
    /// `flush_interval` elapsed with a non-empty batch
    Interval,
    /// Dispatcher is shutting down; thresholds are ignored
    Shutdown,
}

impl FlushTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlushTrigger::Count => "count",
            FlushTrigger::Size => "size",
            FlushTrigger::Interval => "interval",
            FlushTrigger::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for FlushTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
