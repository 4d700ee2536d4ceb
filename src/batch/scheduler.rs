//! Flush Scheduler Module
//!
//! Periodic half of the flush decision. Ticks every `flush_interval`; the
//! dispatcher flushes on a tick only if the working batch is non-empty.
//! Any flush (threshold or tick) restarts the period.

use tokio::time::{self, Duration, Instant, Interval, MissedTickBehavior};

pub struct FlushScheduler {
    /// Max latency of a non-empty batch (`flush_interval`)
    period: Duration,
    /// Tick source; restarted on every flush
    interval: Interval,
    /// When the last flush happened, or when the scheduler was created
    last_flush: Instant,
}

impl FlushScheduler {
    pub fn new(period: Duration) -> Self {
        let now = Instant::now();
        // First tick one full period out, not immediately.
        let mut interval = time::interval_at(now + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self {
            period,
            interval,
            last_flush: now,
        }
    }

    /// Wait for the next period boundary
    ///
    /// Cancel-safe, so it can sit in a `select!` next to the queue.
    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }

    /// Restart the period after a batch was handed off
    pub fn reset(&mut self) {
        self.last_flush = Instant::now();
        self.interval.reset();
    }

    /// Time the working batch has been accumulating
    ///
    /// Lets the loop enforce the period between ticks when the queue keeps
    /// it too busy to poll the tick.
    pub fn since_last_flush(&self) -> Duration {
        self.last_flush.elapsed()
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}
