//! Result fan-out.
//!
//! Turns one backend response into exactly one result per transaction, in
//! batch order. A transport failure becomes a failure for every member.

use crate::{Batch, ItemResult, error::{ItemError, TransportError}};
use tracing::{debug, warn};

pub(crate) fn fan_out(batch: Batch, response: Result<Vec<ItemResult>, TransportError>) {
    let Batch {
        batch_id,
        transactions,
        created_at,
        ..
    } = batch;

    match response {
        Ok(items) => {
            if items.len() != transactions.len() {
                warn!(
                    batch_id,
                    expected = transactions.len(),
                    received = items.len(),
                    "Backend response length does not match batch"
                );
            }

            let mut items = items.into_iter();
            let mut failed = 0usize;
            let total = transactions.len();
            for tx in transactions {
                let outcome = items.next().unwrap_or_else(|| {
                    Err(ItemError::Rejected {
                        status: 500,
                        reason: "missing item response".to_string(),
                    })
                });
                if outcome.is_err() {
                    failed += 1;
                }
                tx.respond(outcome);
            }

            debug!(
                batch_id,
                total,
                failed,
                elapsed_ms = created_at.elapsed().as_millis() as u64,
                "Batch completed"
            );
        }
        Err(TransportError(reason)) => {
            warn!(
                batch_id,
                items = transactions.len(),
                error = %reason,
                "Batch transport failed"
            );
            for tx in transactions {
                tx.respond(Err(ItemError::Transport(reason.clone())));
            }
        }
    }
}
