//! Invariant verification
//!
//! After a submission, every document of the batch must be present exactly
//! when the error mode says it should be:
//!
//! - a faulted document is never present
//! - with continue-on-error, every well-formed document is present
//! - without it, well-formed documents are present only up to the first fault
//!
//! The sentinel seeded before the scenario must survive every batch.

use bulkcheck_core::{CollectionHandle, Document, DocumentReader, HarnessError, Predicate, Result};
use tracing::error;

/// Expected presence of each document, in batch order.
pub fn expected_presence(documents: &[Document], continue_on_error: bool) -> Vec<bool> {
    let mut seen_failure = false;
    documents
        .iter()
        .map(|doc| {
            if doc.is_faulted() {
                seen_failure = true;
                false
            } else {
                !seen_failure || continue_on_error
            }
        })
        .collect()
}

/// Presence tally of a verified batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchVerification {
    /// Documents found, as expected
    pub present: u64,
    /// Documents missing, as expected
    pub absent: u64,
}

/// Check every document of `documents` against its expected presence.
///
/// Stops at the first mismatch.
pub fn verify_batch<R: DocumentReader + ?Sized>(
    reader: &R,
    collection: &CollectionHandle,
    documents: &[Document],
    continue_on_error: bool,
) -> Result<BatchVerification> {
    let expected = expected_presence(documents, continue_on_error);
    let mut tally = BatchVerification::default();

    for (position, (doc, &expected_present)) in documents.iter().zip(&expected).enumerate() {
        let observed = reader.count(collection, &Predicate::IdEquals(doc.id))?;
        let consistent = match observed {
            0 => !expected_present,
            1 => expected_present,
            _ => false,
        };

        if !consistent {
            let status = doc.status();
            error!(
                id = doc.id,
                position,
                status = %status,
                expected_present,
                observed,
                "Presence invariant violated"
            );
            return Err(HarnessError::InvariantViolation {
                id: doc.id,
                position,
                status,
                expected_present,
                observed,
            });
        }

        if expected_present {
            tally.present += 1;
        } else {
            tally.absent += 1;
        }
    }

    Ok(tally)
}

/// Check that exactly one document carries the sentinel marker and that it
/// is still the sentinel.
///
/// The id and the marker must sit on the same document.
pub fn verify_sentinel<R: DocumentReader + ?Sized>(
    reader: &R,
    collection: &CollectionHandle,
) -> Result<()> {
    let found = reader.count(collection, &Predicate::SentinelMarker)?;
    let intact = reader.count(collection, &Predicate::Sentinel)? == 1;

    if found == 1 && intact {
        return Ok(());
    }

    error!(found, intact, "Sentinel document corrupted");
    Err(HarnessError::SentinelCorrupted { found, intact })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bulkcheck_core::{DocId, IndexedPair, StoreResult, SENTINEL_ID};
    use parking_lot::RwLock;

    fn docs(n: i64) -> Vec<Document> {
        (1..=n).map(|id| Document::new(id, id, String::new())).collect()
    }

    fn router_fault(doc: &mut Document) {
        doc.partition_key = None;
    }

    fn storage_fault(doc: &mut Document) {
        doc.indexed = Some(IndexedPair::parallel_arrays());
    }

    /// Reader over a fixed list of stored documents
    #[derive(Default)]
    struct Snapshot {
        stored: RwLock<Vec<Document>>,
    }

    impl Snapshot {
        fn with(ids: &[DocId]) -> Self {
            let stored = ids.iter().map(|&id| Document::new(id, id, String::new())).collect();
            Self {
                stored: RwLock::new(stored),
            }
        }
    }

    impl DocumentReader for Snapshot {
        fn count(&self, _collection: &CollectionHandle, predicate: &Predicate) -> StoreResult<u64> {
            Ok(self.stored.read().iter().filter(|d| predicate.matches(d)).count() as u64)
        }
    }

    fn coll() -> CollectionHandle {
        CollectionHandle::new("db", "c")
    }

    #[test]
    fn test_router_fault_stop_on_error() {
        let mut batch = docs(5);
        router_fault(&mut batch[2]);
        assert_eq!(
            expected_presence(&batch, false),
            vec![true, true, false, false, false]
        );
    }

    #[test]
    fn test_router_fault_continue_on_error() {
        let mut batch = docs(5);
        router_fault(&mut batch[2]);
        assert_eq!(
            expected_presence(&batch, true),
            vec![true, true, false, true, true]
        );
    }

    #[test]
    fn test_first_and_last_faulted() {
        let mut batch = docs(5);
        storage_fault(&mut batch[0]);
        storage_fault(&mut batch[4]);
        assert_eq!(
            expected_presence(&batch, true),
            vec![false, true, true, true, false]
        );
        assert_eq!(expected_presence(&batch, false), vec![false; 5]);
    }

    #[test]
    fn test_clean_batch_all_present() {
        assert_eq!(expected_presence(&docs(3), false), vec![true; 3]);
        assert!(expected_presence(&[], true).is_empty());
    }

    #[test]
    fn test_verify_batch_counts() {
        let mut batch = docs(5);
        router_fault(&mut batch[2]);
        let reader = Snapshot::with(&[1, 2, 4, 5]);

        let tally = verify_batch(&reader, &coll(), &batch, true).unwrap();
        assert_eq!(tally, BatchVerification { present: 4, absent: 1 });
    }

    #[test]
    fn test_verify_batch_reports_first_mismatch() {
        let mut batch = docs(5);
        router_fault(&mut batch[2]);
        // Store kept going even though the mode was stop-on-error
        let reader = Snapshot::with(&[1, 2, 4, 5]);

        let err = verify_batch(&reader, &coll(), &batch, false).unwrap_err();
        match err {
            HarnessError::InvariantViolation {
                id,
                position,
                expected_present,
                observed,
                ..
            } => {
                assert_eq!(id, 4);
                assert_eq!(position, 3);
                assert!(!expected_present);
                assert_eq!(observed, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_faulted_document_present_is_violation() {
        let mut batch = docs(2);
        storage_fault(&mut batch[1]);
        let reader = Snapshot::with(&[1, 2]);

        let err = verify_batch(&reader, &coll(), &batch, true).unwrap_err();
        assert!(matches!(
            err,
            HarnessError::InvariantViolation { position: 1, status, .. } if status.is_faulted()
        ));
    }

    #[test]
    fn test_duplicate_copies_are_violation() {
        let reader = Snapshot::with(&[1, 1]);
        let err = verify_batch(&reader, &coll(), &docs(1), true).unwrap_err();
        assert!(matches!(err, HarnessError::InvariantViolation { observed: 2, .. }));
    }

    #[test]
    fn test_sentinel_intact() {
        let reader = Snapshot::with(&[1, 2]);
        reader.stored.write().push(Document::sentinel());
        assert!(verify_sentinel(&reader, &coll()).is_ok());
    }

    #[test]
    fn test_sentinel_missing() {
        let reader = Snapshot::with(&[1]);
        let err = verify_sentinel(&reader, &coll()).unwrap_err();
        assert!(matches!(
            err,
            HarnessError::SentinelCorrupted { found: 0, intact: false }
        ));
    }

    #[test]
    fn test_sentinel_marker_copied() {
        let reader = Snapshot::with(&[]);
        let mut copy = Document::new(9, 0, String::new());
        copy.marker = Document::sentinel().marker;
        reader.stored.write().push(Document::sentinel());
        reader.stored.write().push(copy);

        let err = verify_sentinel(&reader, &coll()).unwrap_err();
        assert!(matches!(
            err,
            HarnessError::SentinelCorrupted { found: 2, intact: true }
        ));
    }

    #[test]
    fn test_sentinel_marker_moved_to_other_document() {
        let reader = Snapshot::with(&[]);
        let mut stripped = Document::sentinel();
        stripped.marker = None;
        let mut impostor = Document::new(9, 0, String::new());
        impostor.marker = Document::sentinel().marker;
        reader.stored.write().push(stripped);
        reader.stored.write().push(impostor);

        let err = verify_sentinel(&reader, &coll()).unwrap_err();
        assert!(matches!(
            err,
            HarnessError::SentinelCorrupted { found: 1, intact: false }
        ));
    }

    #[test]
    fn test_sentinel_marker_stripped() {
        let reader = Snapshot::with(&[SENTINEL_ID]);
        let err = verify_sentinel(&reader, &coll()).unwrap_err();
        assert!(matches!(
            err,
            HarnessError::SentinelCorrupted { found: 0, intact: false }
        ));
    }
}
