//! Fault injection
//!
//! Picks which batch positions fail and corrupts those documents so that
//! either the router or a storage node rejects them.

use bulkcheck_core::{
    Document, FaultLocation, HarnessConfig, InclusiveRange, IndexedPair, ScenarioOptions,
    StorageFaultMechanism,
};
use rand::seq::SliceRandom;
use rand::Rng;
use smallvec::SmallVec;
use tracing::debug;

use crate::batch::Batch;

/// Sorted batch positions
pub type Positions = SmallVec<[usize; 16]>;

/// How faults are injected into every batch of a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultTemplate {
    /// Number of faults per batch
    pub count_range: InclusiveRange,
    /// Layer that must reject the faulted documents
    pub location: FaultLocation,
    /// Storage-level corruption, used when `location` is `Storage`
    pub mechanism: StorageFaultMechanism,
    /// Always fault position 0
    pub force_first: bool,
    /// Always fault the last position
    pub force_last: bool,
}

impl FaultTemplate {
    /// Template for one scenario
    pub fn for_scenario(options: &ScenarioOptions, config: &HarnessConfig) -> Self {
        Self {
            count_range: config.fault_counts,
            location: options.fault_location,
            mechanism: config.storage_fault,
            force_first: options.force_first_fault,
            force_last: options.force_last_fault,
        }
    }
}

/// Positions corrupted in one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultPlan {
    /// Ascending positions
    pub positions: Positions,
    /// Layer expected to reject them
    pub location: FaultLocation,
}

/// Choose up to `count` distinct positions in `[0, len)`, ascending.
///
/// `force_first` puts position 0 in place of the smallest pick (or adds it
/// when nothing was picked). `force_last` then does the same with `len - 1`
/// and the largest pick, unless the first was forced and is the only pick.
pub fn choose_positions<R: Rng + ?Sized>(
    rng: &mut R,
    len: usize,
    count: usize,
    force_first: bool,
    force_last: bool,
) -> Positions {
    if len == 0 {
        return Positions::new();
    }

    let mut pool: Vec<usize> = (0..len).collect();
    let (chosen, _) = pool.partial_shuffle(rng, count.min(len));
    let mut positions: Positions = chosen.iter().copied().collect();
    positions.sort_unstable();

    if force_first {
        match positions.first_mut() {
            Some(first) => *first = 0,
            None => positions.push(0),
        }
    }
    if force_last && (positions.len() >= 2 || !force_first) {
        match positions.last_mut() {
            Some(last) => *last = len - 1,
            None => positions.push(len - 1),
        }
    }

    positions.sort_unstable();
    positions.dedup();
    positions
}

/// Corrupt one document so the given layer rejects it.
pub fn corrupt(doc: &mut Document, location: FaultLocation, mechanism: StorageFaultMechanism) {
    match location {
        FaultLocation::Router => doc.partition_key = None,
        FaultLocation::Storage => match mechanism {
            StorageFaultMechanism::ParallelArrays => {
                doc.indexed = Some(IndexedPair::parallel_arrays());
            }
            StorageFaultMechanism::DuplicateSentinel => {
                let sentinel = Document::sentinel();
                doc.partition_key = sentinel.partition_key;
                doc.marker = sentinel.marker;
            }
        },
    }
}

/// Draw a fault count, choose positions and corrupt them in place.
pub fn inject_faults<R: Rng + ?Sized>(
    rng: &mut R,
    batch: &mut Batch,
    template: &FaultTemplate,
) -> FaultPlan {
    let count = rng.gen_range(template.count_range.min..=template.count_range.max) as usize;
    let positions = choose_positions(
        rng,
        batch.len(),
        count,
        template.force_first,
        template.force_last,
    );

    let documents = batch.documents_mut();
    for &position in &positions {
        corrupt(&mut documents[position], template.location, template.mechanism);
    }

    debug!(
        location = %template.location,
        positions = ?positions.as_slice(),
        "Injected faults"
    );

    FaultPlan {
        positions,
        location: template.location,
    }
}
