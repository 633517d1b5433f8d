//! Batch generation
//!
//! A batch is built by drawing a target aggregate size, then appending
//! documents of randomly drawn sizes until the running serialized total
//! reaches the target. Ids increase by one per document and continue from
//! the previous batch, so they never repeat within a scenario.

use bulkcheck_core::{base_overhead, encoded_len, filler, DocId, Document, InclusiveRange};
use rand::Rng;

/// Swap the low and high bytes of a 3-byte integer.
///
/// Consecutive ids land far apart in key order, so one batch spans several
/// chunks. The transform is its own inverse for values below `2^24`; higher
/// bits are dropped.
pub fn scramble_key(n: i64) -> i64 {
    ((n << 16) & 0xff_0000) | (n & 0xff00) | ((n >> 16) & 0xff)
}

/// Inputs for [`generate_batch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSpec {
    /// Target aggregate serialized size (bytes)
    pub target_sizes: InclusiveRange,
    /// Serialized size per document (bytes)
    pub document_sizes: InclusiveRange,
    /// Id of the first document
    pub start_id: DocId,
    /// Pass partition keys through [`scramble_key`]
    pub scramble: bool,
}

/// An ordered batch of documents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    documents: Vec<Document>,
    target_size: u64,
    generated_size: u64,
}

impl Batch {
    /// Wrap existing documents; the target is their current size.
    pub fn from_documents(documents: Vec<Document>) -> Self {
        let size = documents.iter().map(|d| encoded_len(d) as u64).sum();
        Self {
            documents,
            target_size: size,
            generated_size: size,
        }
    }

    /// Documents in batch order
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Mutable access for fault injection
    pub fn documents_mut(&mut self) -> &mut [Document] {
        &mut self.documents
    }

    /// Number of documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the batch is empty
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Drawn target size
    pub fn target_size(&self) -> u64 {
        self.target_size
    }

    /// Serialized size when generated, before any corruption
    pub fn generated_size(&self) -> u64 {
        self.generated_size
    }

    /// Current serialized size
    pub fn serialized_size(&self) -> u64 {
        self.documents.iter().map(|d| encoded_len(d) as u64).sum()
    }
}

/// Build a batch reaching a random target size.
///
/// Returns the batch and the next free id.
pub fn generate_batch<R: Rng + ?Sized>(rng: &mut R, spec: &BatchSpec) -> (Batch, DocId) {
    let target = rng.gen_range(spec.target_sizes.min..=spec.target_sizes.max);
    let base = base_overhead() as u64;

    let mut documents = Vec::new();
    let mut total = 0u64;
    let mut id = spec.start_id;

    while total < target {
        let size = rng.gen_range(spec.document_sizes.min..=spec.document_sizes.max);
        let key = if spec.scramble { scramble_key(id) } else { id };
        let document = Document::new(id, key, filler(size.saturating_sub(base) as usize));

        total += encoded_len(&document) as u64;
        documents.push(document);
        id += 1;
    }

    let batch = Batch {
        documents,
        target_size: target,
        generated_size: total,
    };
    (batch, id)
}
