//! Dispatcher Loop
//!
//! The orchestration layer. A single task owns the intake queue and the
//! working batch, so batch mutation needs no locking. Flushed batches are
//! submitted concurrently, each on its own task, bounded by the pending gate.
//!
//! # Batch lifecycle
//! accumulating → flush-triggered → awaiting-slot → submitted → completed
//!
//! Completion (success or failure) is terminal; whole batches are never
//! retried here.
//!
//! # Shutdown
//! 1. Stop reading new work and wake callers blocked on a full queue
//! 2. Flush whatever is buffered, regardless of thresholds
//! 3. Wait for in-flight batches until the grace deadline
//!
//! The grace deadline bounds every wait from the moment shutdown is seen,
//! including a flush that was already waiting for a pending slot. Batches
//! that cannot get a slot in time fail every transaction they carry.

use crate::{
    Batch,
    backend::Backend,
    batch::{BatchAccumulator, FlushScheduler, FlushTrigger},
    dispatcher::{DispatcherHandle, fanout::fan_out},
    error::{ConfigError, GateError, ItemError},
    gate::{CredentialThrottle, PendingGate, Slot},
    pool::{self, QueueReceiver},
    tuning::TuningParams,
};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Summary returned when the dispatcher loop exits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainReport {
    /// Batches handed to the backend over the dispatcher's lifetime
    pub batches: u64,
    /// Transactions contained in those batches
    pub transactions: u64,
    /// Transactions failed because no pending slot freed up before the
    /// grace deadline
    pub abandoned: u64,
    /// False if the grace period ran out with work unfinished
    pub drained: bool,
}

/// Bulk dispatcher
///
/// Pulls transactions off the intake queue into the working batch and hands
/// each flushed batch to the backend under the pending gate.
pub struct Dispatcher<B: Backend> {
    /// Immutable tuning (thresholds, interval, grace)
    params: TuningParams,
    /// Destination for flushed batches, shared with every submit task
    backend: Arc<B>,
    /// Single reader of the intake queue
    receiver: QueueReceiver,
    /// Working batch and flush thresholds
    accumulator: BatchAccumulator,
    /// Bounds batch submissions in flight
    gate: PendingGate,
    /// Flips to `true` when shutdown is requested
    shutdown: watch::Receiver<bool>,
    /// Set once shutdown is seen; caps every remaining wait
    deadline: Option<Instant>,
    /// Running totals, returned when the loop exits
    report: DrainReport,
}

impl<B: Backend> Dispatcher<B> {
    /// Creates a dispatcher and the handle callers use to reach it
    ///
    /// # Arguments
    /// * `params` - Tuning parameters, validated here
    /// * `backend` - Destination for flushed batches
    ///
    /// # Returns
    /// The (not yet running) dispatcher and its handle, or a configuration
    /// error if `params` cannot be run with
    pub fn new(
        params: TuningParams,
        backend: Arc<B>,
    ) -> Result<(Self, DispatcherHandle), ConfigError> {
        params.validate()?;

        let (queue, receiver) = pool::bounded(params.block_queue_size);
        let gate = PendingGate::new(params.max_pending);
        let credentials = CredentialThrottle::new(params.apikey_max_parallel);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = DispatcherHandle::new(queue, shutdown_tx, gate.clone(), credentials);
        let dispatcher = Self {
            accumulator: BatchAccumulator::new(
                params.flush_threshold_count,
                params.flush_threshold_size,
            ),
            params,
            backend,
            receiver,
            gate,
            shutdown: shutdown_rx,
            deadline: None,
            report: DrainReport::default(),
        };

        Ok((dispatcher, handle))
    }

    /// Create a dispatcher and run it on a background task
    pub fn spawn(
        params: TuningParams,
        backend: Arc<B>,
    ) -> Result<(DispatcherHandle, JoinHandle<DrainReport>), ConfigError> {
        let (dispatcher, handle) = Self::new(params, backend)?;
        Ok((handle, tokio::spawn(dispatcher.run())))
    }

    /// Run the accumulation/flush loop until shutdown
    ///
    /// Exits when shutdown is requested or every handle is dropped, then
    /// drains: remaining queued transactions are flushed regardless of
    /// thresholds and in-flight batches get `shutdown_grace` to complete.
    pub async fn run(mut self) -> DrainReport {
        self.params.log_summary();
        info!("Bulk dispatcher started");

        let mut scheduler = FlushScheduler::new(self.params.flush_interval);

        // A flush may have seen the shutdown signal while waiting for a slot
        while self.deadline.is_none() {
            tokio::select! {
                biased;

                // An error means every handle is gone, same outcome
                _ = self.shutdown.changed() => break,

                // Ahead of the queue so a busy queue cannot starve it
                _ = scheduler.tick() => {
                    // Nothing accumulated this period: no round trip
                    if !self.accumulator.is_empty() {
                        self.flush(FlushTrigger::Interval, &mut scheduler).await;
                    }
                }

                next = self.receiver.recv() => match next {
                    Some(tx) => {
                        // 1. Thresholds first
                        if let Some(trigger) = self.accumulator.push(tx) {
                            self.flush(trigger, &mut scheduler).await;
                        // 2. Then the interval, in case the tick has not been polled
                        } else if scheduler.since_last_flush() >= scheduler.period() {
                            self.flush(FlushTrigger::Interval, &mut scheduler).await;
                        }
                    }
                    None => {
                        debug!("All dispatcher handles dropped");
                        break;
                    }
                },
            }
        }

        self.drain(&mut scheduler).await
    }

    /// Hand the working batch to the backend
    ///
    /// Blocks the loop while the pending gate is saturated, which stops the
    /// queue from draining and pushes backpressure out to callers.
    async fn flush(&mut self, trigger: FlushTrigger, scheduler: &mut FlushScheduler) {
        // 1. Take the working batch; a fresh one starts accumulating
        let Some(batch) = self.accumulator.take() else {
            return;
        };
        scheduler.reset();

        debug!(
            batch_id = batch.batch_id,
            trigger = %trigger,
            items = batch.len(),
            bytes = batch.size_bytes,
            refresh = batch.requires_refresh(),
            "Flushing batch"
        );

        // 2. Wait for a pending slot
        let slot = match self.acquire_slot().await {
            Ok(slot) => slot,
            Err(e) => {
                self.abandon(batch, e);
                return;
            }
        };

        self.report.batches += 1;
        self.report.transactions += batch.len() as u64;

        // 3. Submit off the loop
        let backend = self.backend.clone();
        tokio::spawn(async move {
            // Held until fan-out is done, on every path
            let _slot = slot;
            let response = backend.submit(&batch).await;
            fan_out(batch, response);
        });
    }

    /// Wait for a pending slot
    ///
    /// Unbounded while running. Once shutdown is seen, here or earlier, the
    /// wait ends at the grace deadline.
    async fn acquire_slot(&mut self) -> Result<Slot, GateError> {
        if self.deadline.is_none() {
            let acquired = tokio::select! {
                biased;
                slot = self.gate.acquire() => Some(slot),
                _ = self.shutdown.changed() => None,
            };
            match acquired {
                Some(slot) => return slot,
                None => self.begin_shutdown(),
            }
        }

        match self.deadline {
            Some(deadline) => self.gate.acquire_until(deadline).await,
            None => self.gate.acquire().await,
        }
    }

    /// Fail every transaction of a batch that never reached the backend
    fn abandon(&mut self, batch: Batch, error: GateError) {
        warn!(
            batch_id = batch.batch_id,
            items = batch.len(),
            error = %error,
            "No pending slot for batch"
        );

        self.report.abandoned += batch.len() as u64;
        let reason = error.to_string();
        for tx in batch.transactions {
            tx.respond(Err(ItemError::Transport(reason.clone())));
        }
    }

    /// Start the grace clock and stop intake; idempotent
    fn begin_shutdown(&mut self) {
        if self.deadline.is_some() {
            return;
        }

        info!(
            grace_ms = self.params.shutdown_grace.as_millis() as u64,
            "Bulk dispatcher draining"
        );
        self.deadline = Some(Instant::now() + self.params.shutdown_grace);

        // Reject new work, including callers blocked on a full queue
        self.receiver.close();
    }

    async fn drain(mut self, scheduler: &mut FlushScheduler) -> DrainReport {
        // 1. Stop intake and start the grace clock
        self.begin_shutdown();

        // 2. Flush everything already buffered
        while let Some(tx) = self.receiver.recv().await {
            if let Some(trigger) = self.accumulator.push(tx) {
                self.flush(trigger, scheduler).await;
            }
        }
        self.flush(FlushTrigger::Shutdown, scheduler).await;

        // 3. Wait for in-flight batches, whatever is left of the grace period
        let remaining = self
            .deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .unwrap_or(self.params.shutdown_grace);
        let settled = self.gate.drain(remaining).await;
        self.report.drained = settled && self.report.abandoned == 0;

        if !self.report.drained {
            warn!(
                in_flight = self.gate.in_flight(),
                abandoned = self.report.abandoned,
                grace_ms = self.params.shutdown_grace.as_millis() as u64,
                "Shutdown grace period elapsed with work unfinished"
            );
        }

        info!(
            batches = self.report.batches,
            transactions = self.report.transactions,
            drained = self.report.drained,
            "Bulk dispatcher stopped"
        );
        self.report
    }
}
