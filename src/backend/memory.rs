//! In-process document store.
//!
//! Implements the backend contract against an in-memory map of
//! index → id → document, with the usual indexing outcomes: creating an
//! existing id conflicts, touching a missing id is not found. Updates are
//! applied under the store lock, so `retry_on_conflict` never comes into
//! play here.

use crate::{
    ActionKind, Batch, ItemResponse, ItemResult, Transaction,
    backend::Backend,
    error::{ItemError, TransportError},
};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone)]
struct StoredDoc {
    source: Value,
    version: u64,
}

type Index = BTreeMap<String, StoredDoc>;

#[derive(Default)]
pub struct MemoryBackend {
    indices: RwLock<BTreeMap<String, Index>>,
    batches: AtomicU64,
    refreshes: AtomicU64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of batches submitted so far
    pub fn batch_count(&self) -> u64 {
        self.batches.load(Ordering::SeqCst)
    }

    /// Number of submitted batches that asked for a refresh
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::SeqCst)
    }

    /// Current source of a stored document
    pub async fn get(&self, index: &str, id: &str) -> Option<Value> {
        let indices = self.indices.read().await;
        indices
            .get(index)
            .and_then(|docs| docs.get(id))
            .map(|doc| doc.source.clone())
    }

    fn apply(indices: &mut BTreeMap<String, Index>, tx: &Transaction) -> ItemResult {
        match tx.kind {
            ActionKind::Index => {
                let source = parse_body(&tx.body)?;
                let docs = indices.entry(tx.index.clone()).or_default();
                let (version, status) = match docs.get(&tx.id) {
                    Some(existing) => (existing.version + 1, 200),
                    None => (1, 201),
                };
                docs.insert(tx.id.clone(), StoredDoc { source, version });
                Ok(response(tx, status, Some(version), None))
            }
            ActionKind::Create => {
                let source = parse_body(&tx.body)?;
                let docs = indices.entry(tx.index.clone()).or_default();
                if docs.contains_key(&tx.id) {
                    return Err(ItemError::Conflict {
                        index: tx.index.clone(),
                        id: tx.id.clone(),
                    });
                }
                docs.insert(tx.id.clone(), StoredDoc { source, version: 1 });
                Ok(response(tx, 201, Some(1), None))
            }
            ActionKind::Update => {
                let patch = parse_body(&tx.body)?;
                let doc = indices
                    .get_mut(&tx.index)
                    .and_then(|docs| docs.get_mut(&tx.id))
                    .ok_or_else(|| not_found(tx))?;

                // Accept both `{"doc": {...}}` and a bare partial document
                let patch = match patch {
                    Value::Object(mut obj) if obj.contains_key("doc") => {
                        obj.remove("doc").unwrap_or(Value::Null)
                    }
                    other => other,
                };
                merge(&mut doc.source, patch);
                doc.version += 1;
                Ok(response(tx, 200, Some(doc.version), None))
            }
            ActionKind::Delete => {
                let doc = indices
                    .get_mut(&tx.index)
                    .and_then(|docs| docs.remove(&tx.id))
                    .ok_or_else(|| not_found(tx))?;
                Ok(response(tx, 200, Some(doc.version + 1), None))
            }
            ActionKind::Read => {
                let doc = indices
                    .get(&tx.index)
                    .and_then(|docs| docs.get(&tx.id))
                    .ok_or_else(|| not_found(tx))?;
                Ok(response(tx, 200, Some(doc.version), Some(doc.source.clone())))
            }
            ActionKind::Search => {
                let query = if tx.body.is_empty() {
                    Map::new()
                } else {
                    match parse_body(&tx.body)? {
                        Value::Object(obj) => obj,
                        _ => {
                            return Err(ItemError::Rejected {
                                status: 400,
                                reason: "search query must be a JSON object".to_string(),
                            });
                        }
                    }
                };
                let targets = if tx.options.indices.is_empty() {
                    vec![tx.index.clone()]
                } else {
                    tx.options.indices.clone()
                };

                let mut hits = Vec::new();
                for name in &targets {
                    let Some(docs) = indices.get(name) else {
                        continue;
                    };
                    for (id, doc) in docs {
                        if matches_query(&doc.source, &query) {
                            hits.push(json!({
                                "_index": name,
                                "_id": id,
                                "_version": doc.version,
                                "_source": doc.source,
                            }));
                        }
                    }
                }

                let total = hits.len();
                Ok(response(
                    tx,
                    200,
                    None,
                    Some(json!({ "total": total, "hits": hits })),
                ))
            }
        }
    }
}

impl Backend for MemoryBackend {
    async fn submit(&self, batch: &Batch) -> Result<Vec<ItemResult>, TransportError> {
        self.batches.fetch_add(1, Ordering::SeqCst);

        let mut indices = self.indices.write().await;
        let results: Vec<ItemResult> = batch
            .transactions
            .iter()
            .map(|tx| Self::apply(&mut indices, tx))
            .collect();

        if batch.requires_refresh() {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
        }

        debug!(
            batch_id = batch.batch_id,
            items = results.len(),
            "Memory backend applied batch"
        );
        Ok(results)
    }
}

fn parse_body(body: &[u8]) -> Result<Value, ItemError> {
    serde_json::from_slice(body).map_err(|e| ItemError::Rejected {
        status: 400,
        reason: format!("failed to parse document: {}", e),
    })
}

fn not_found(tx: &Transaction) -> ItemError {
    ItemError::NotFound {
        index: tx.index.clone(),
        id: tx.id.clone(),
    }
}

fn response(
    tx: &Transaction,
    status: u16,
    version: Option<u64>,
    source: Option<Value>,
) -> ItemResponse {
    ItemResponse {
        index: tx.index.clone(),
        id: tx.id.clone(),
        status,
        version,
        source,
    }
}

/// Shallow merge of top-level fields; non-objects replace outright
fn merge(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                target.insert(key, value);
            }
        }
        (target, patch) => *target = patch,
    }
}

fn matches_query(source: &Value, query: &Map<String, Value>) -> bool {
    query
        .iter()
        .all(|(field, expected)| source.get(field) == Some(expected))
}
