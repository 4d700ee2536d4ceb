use crate::{
    ActionKind, ItemResponse, ItemResult, Transaction, TransactionOptions,
    error::{DispatchError, SubmitError},
    gate::{CredentialThrottle, PendingGate},
    pool::TransactionQueue,
};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tracing::info;

/// Caller-facing side of a running dispatcher
///
/// Cheap to clone. The dispatcher loop ends once `shutdown` is called or
/// every handle has been dropped.
#[derive(Clone)]
pub struct DispatcherHandle {
    /// Producer side of the intake queue
    queue: TransactionQueue,
    /// Shutdown signal; dropping the last handle also ends the loop
    shutdown: Arc<watch::Sender<bool>>,
    /// Shared with the loop, for in-flight introspection
    gate: PendingGate,
    /// Bounds credential operations, independent of the batch pipeline
    credentials: CredentialThrottle,
}

/// Result of an accepted transaction, delivered once its batch completes
pub struct PendingResult {
    rx: oneshot::Receiver<ItemResult>,
}

impl PendingResult {
    pub async fn wait(self) -> Result<ItemResponse, SubmitError> {
        let outcome = self.rx.await.map_err(|_| DispatchError::ResultLost)?;
        Ok(outcome?)
    }
}

impl DispatcherHandle {
    pub(crate) fn new(
        queue: TransactionQueue,
        shutdown: watch::Sender<bool>,
        gate: PendingGate,
        credentials: CredentialThrottle,
    ) -> Self {
        Self {
            queue,
            shutdown: Arc::new(shutdown),
            gate,
            credentials,
        }
    }

    /// Queue a transaction for the next batch
    ///
    /// Suspends while the intake queue is full. Once this returns `Ok` the
    /// transaction is owned by the dispatcher and will get exactly one
    /// result; dropping the `PendingResult` only discards it.
    ///
    /// # Errors
    /// `DispatchError::ShuttingDown` if shutdown has begun.
    pub async fn enqueue(
        &self,
        kind: ActionKind,
        index: impl Into<String>,
        id: impl Into<String>,
        body: Vec<u8>,
        options: TransactionOptions,
    ) -> Result<PendingResult, DispatchError> {
        let (tx, rx) = Transaction::new(kind, index, id, body, options);
        self.queue.enqueue(tx).await?;
        Ok(PendingResult { rx })
    }

    /// Enqueue and wait for the outcome
    pub async fn submit(
        &self,
        kind: ActionKind,
        index: impl Into<String>,
        id: impl Into<String>,
        body: Vec<u8>,
        options: TransactionOptions,
    ) -> Result<ItemResponse, SubmitError> {
        self.enqueue(kind, index, id, body, options)
            .await?
            .wait()
            .await
    }

    pub async fn index(
        &self,
        index: &str,
        id: &str,
        body: Vec<u8>,
        options: TransactionOptions,
    ) -> Result<ItemResponse, SubmitError> {
        self.submit(ActionKind::Index, index, id, body, options).await
    }

    pub async fn create(
        &self,
        index: &str,
        id: &str,
        body: Vec<u8>,
        options: TransactionOptions,
    ) -> Result<ItemResponse, SubmitError> {
        self.submit(ActionKind::Create, index, id, body, options).await
    }

    pub async fn update(
        &self,
        index: &str,
        id: &str,
        body: Vec<u8>,
        options: TransactionOptions,
    ) -> Result<ItemResponse, SubmitError> {
        self.submit(ActionKind::Update, index, id, body, options).await
    }

    pub async fn delete(
        &self,
        index: &str,
        id: &str,
        options: TransactionOptions,
    ) -> Result<ItemResponse, SubmitError> {
        self.submit(ActionKind::Delete, index, id, Vec::new(), options).await
    }

    pub async fn read(&self, index: &str, id: &str) -> Result<ItemResponse, SubmitError> {
        self.submit(ActionKind::Read, index, id, Vec::new(), TransactionOptions::default())
            .await
    }

    /// Search `index`, or every index named in `options.indices`
    pub async fn search(
        &self,
        index: &str,
        query: Vec<u8>,
        options: TransactionOptions,
    ) -> Result<ItemResponse, SubmitError> {
        self.submit(ActionKind::Search, index, "", query, options).await
    }

    /// Run a credential operation under the credential throttle
    ///
    /// Independent of the batch pipeline: a saturated pending gate never
    /// delays it.
    pub async fn credential_op<F>(&self, op: F) -> Result<F::Output, DispatchError>
    where
        F: Future,
    {
        Ok(self.credentials.run(op).await?)
    }

    /// Begin shutdown
    ///
    /// New `enqueue` calls are rejected from here on. Already accepted
    /// transactions are still flushed; await the dispatcher's join handle
    /// for the drain report.
    pub fn shutdown(&self) {
        self.queue.close();
        if !self.shutdown.send_replace(true) {
            info!("Dispatcher shutdown requested");
        }
    }

    pub fn is_accepting(&self) -> bool {
        self.queue.is_accepting()
    }

    /// Transactions waiting in the intake queue
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Batches currently submitted to the backend
    pub fn batches_in_flight(&self) -> usize {
        self.gate.in_flight()
    }

    /// Credential operations currently running
    pub fn credentials_in_flight(&self) -> usize {
        self.credentials.in_flight()
    }
}
