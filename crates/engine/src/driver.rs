//! Write driver
//!
//! Submits a batch in one bulk insert. The store's outcome is reported as-is:
//! no retries, and per-document rejections are never interpreted here.

use bulkcheck_core::{CollectionHandle, InsertOptions, InsertOutcome, Predicate, Result, Store};
use tracing::debug;

use crate::batch::Batch;

/// Result of one bulk submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Outcome reported by the store
    pub outcome: InsertOutcome,
    /// Collection size after minus before. Diagnostic only.
    pub observed_delta: i64,
}

/// Insert `batch` with the given error mode.
pub fn submit<S: Store + ?Sized>(
    store: &S,
    collection: &CollectionHandle,
    batch: &Batch,
    continue_on_error: bool,
) -> Result<Submission> {
    let before = store.count(collection, &Predicate::All)?;
    let outcome = store.insert(
        collection,
        batch.documents(),
        InsertOptions::new(continue_on_error),
    )?;
    let after = store.count(collection, &Predicate::All)?;
    let observed_delta = after as i64 - before as i64;

    match &outcome.last_error {
        Some(err) => debug!(
            inserted = observed_delta,
            batch = batch.len(),
            reported = outcome.inserted,
            errors = outcome.error_count,
            last_error = %err,
            layer = %err.code.layer(),
            "Batch submitted with rejections"
        ),
        None => debug!(
            inserted = observed_delta,
            batch = batch.len(),
            reported = outcome.inserted,
            "Batch submitted"
        ),
    }

    Ok(Submission {
        outcome,
        observed_delta,
    })
}
