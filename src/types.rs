use crate::error::ItemError;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio::time::Instant;

/// Operation requested by a single transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Index,
    Create,
    Update,
    Delete,
    Read,
    Search,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Index => "index",
            ActionKind::Create => "create",
            ActionKind::Update => "update",
            ActionKind::Delete => "delete",
            ActionKind::Read => "read",
            ActionKind::Search => "search",
        }
    }
}

/// Per-transaction submission options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOptions {
    /// Make the write visible to search once the batch completes
    #[serde(default)]
    pub refresh: bool,
    /// How many times the backend may retry an update on version conflict
    #[serde(default)]
    pub retry_on_conflict: Option<u32>,
    /// Indices to search; empty means the transaction's own index
    #[serde(default)]
    pub indices: Vec<String>,
}

impl TransactionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_refresh(mut self) -> Self {
        self.refresh = true;
        self
    }

    pub fn with_retry_on_conflict(mut self, n: u32) -> Self {
        self.retry_on_conflict = Some(n);
        self
    }

    /// Applicable to search
    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.indices.push(index.into());
        self
    }
}

/// Successful outcome of a single transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResponse {
    pub index: String,
    pub id: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    /// Document source for reads, hit list for searches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<serde_json::Value>,
}

pub type ItemResult = Result<ItemResponse, ItemError>;

/// A single requested operation, owned by the dispatcher until its result is delivered
#[derive(Debug)]
pub struct Transaction {
    pub kind: ActionKind,
    pub index: String,
    pub id: String,
    pub body: Vec<u8>,
    pub options: TransactionOptions,
    respond_to: oneshot::Sender<ItemResult>,
}

impl Transaction {
    /// Create a transaction and the receiver its result will arrive on
    pub fn new(
        kind: ActionKind,
        index: impl Into<String>,
        id: impl Into<String>,
        body: Vec<u8>,
        options: TransactionOptions,
    ) -> (Self, oneshot::Receiver<ItemResult>) {
        let (respond_to, rx) = oneshot::channel();
        let tx = Self {
            kind,
            index: index.into(),
            id: id.into(),
            body,
            options,
            respond_to,
        };
        (tx, rx)
    }

    /// Payload size counted against the flush size threshold
    pub fn size(&self) -> usize {
        self.body.len()
    }

    /// Deliver the result, consuming the transaction
    ///
    /// A caller that stopped waiting is not an error for the batch.
    pub fn respond(self, result: ItemResult) {
        let _ = self.respond_to.send(result);
    }
}

/// Ordered group of transactions submitted in one backend call
#[derive(Debug)]
pub struct Batch {
    pub batch_id: u64,
    pub transactions: Vec<Transaction>,
    pub size_bytes: usize,
    /// When the batch was opened; used for submission latency logging
    pub created_at: Instant,
}

impl Batch {
    pub fn new(batch_id: u64) -> Self {
        Self {
            batch_id,
            transactions: Vec::new(),
            size_bytes: 0,
            created_at: Instant::now(),
        }
    }

    /// Append-only; ownership of the transaction moves into the batch
    pub fn push(&mut self, tx: Transaction) {
        self.size_bytes += tx.size();
        self.transactions.push(tx);
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// True when any member asked for a refresh
    pub fn requires_refresh(&self) -> bool {
        self.transactions.iter().any(|tx| tx.options.refresh)
    }
}
