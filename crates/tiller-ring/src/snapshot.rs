//! Serializable ring state for hosts that persist membership.
//!
//! The ring itself never touches disk. A host that wants to survive restarts
//! serializes a [`RingSnapshot`] (capacity, last-removed pointer, removal
//! table) and rebuilds with [`MementoRing::from_snapshot`], which refuses
//! state that violates the ring's structural invariants instead of producing
//! a hasher that silently mis-routes keys.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tiller_hash::HashFn;

use crate::memento::{MementoRing, Removal};

/// Point-in-time copy of a ring's mutable state.
///
/// `removals` carries the table in unspecified order; the linked
/// `prev_removed` chain, not the vector order, encodes removal chronology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingSnapshot {
    /// High-water mark of issued ids.
    pub capacity: i32,
    /// Top of the removal stack.
    pub last_removed: i32,
    /// Every currently-removed bucket.
    pub removals: Vec<Removal>,
}

/// A snapshot that cannot be a valid ring state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    /// Capacity was negative.
    #[error("negative capacity {0}")]
    NegativeCapacity(i32),

    /// More removals than issued buckets.
    #[error("{removals} removals exceed capacity {capacity}")]
    TooManyRemovals { removals: usize, capacity: i32 },

    /// The same bucket appeared twice in the removal table.
    #[error("bucket {0} removed twice")]
    DuplicateRemoval(i32),

    /// A removed bucket id outside `[0, capacity)`.
    #[error("removed bucket {bucket} outside capacity {capacity}")]
    BucketOutOfRange { bucket: i32, capacity: i32 },

    /// The `prev_removed` chain starting at `last_removed` does not visit
    /// every removal exactly once, or its recorded working-set sizes are not
    /// increasing toward the bottom of the stack.
    #[error("removal chain broken at bucket {0}")]
    BrokenChain(i32),

    /// With an empty removal table, `last_removed` must equal `capacity`
    /// (the next fresh id).
    #[error("last_removed {last_removed} does not match capacity {capacity} on an empty table")]
    DanglingLastRemoved { last_removed: i32, capacity: i32 },
}

impl MementoRing {
    /// Copy out the ring's mutable state.
    pub fn snapshot(&self) -> RingSnapshot {
        let (capacity, last_removed, removed) = self.parts();
        RingSnapshot {
            capacity,
            last_removed,
            removals: removed.values().copied().collect(),
        }
    }

    /// Rebuild a ring from persisted state, validating the structural
    /// invariants first.
    ///
    /// Checks: the working set is non-negative, no bucket is removed twice,
    /// every removed id lies in `[0, capacity)`, and the `prev_removed`
    /// links form one acyclic chain rooted at `last_removed` that covers the
    /// whole table with working-set sizes strictly increasing toward the
    /// bottom (the order lookups rely on for termination).
    pub fn from_snapshot(hash: HashFn, snapshot: RingSnapshot) -> Result<Self, SnapshotError> {
        let RingSnapshot {
            capacity,
            last_removed,
            removals,
        } = snapshot;

        if capacity < 0 {
            return Err(SnapshotError::NegativeCapacity(capacity));
        }
        if removals.len() > capacity as usize {
            return Err(SnapshotError::TooManyRemovals {
                removals: removals.len(),
                capacity,
            });
        }

        let mut removed = HashMap::with_capacity(removals.len());
        for removal in removals {
            if removal.bucket < 0 || removal.bucket >= capacity {
                return Err(SnapshotError::BucketOutOfRange {
                    bucket: removal.bucket,
                    capacity,
                });
            }
            if removed.insert(removal.bucket, removal).is_some() {
                return Err(SnapshotError::DuplicateRemoval(removal.bucket));
            }
        }

        if removed.is_empty() {
            if last_removed != capacity {
                return Err(SnapshotError::DanglingLastRemoved {
                    last_removed,
                    capacity,
                });
            }
            return Ok(Self::from_parts(hash, capacity, last_removed, removed));
        }

        // Walk the stack from the top; each hop must reach a yet-unvisited
        // entry with a strictly larger recorded working set, and the walk
        // must consume the entire table before falling off the bottom.
        let mut visited = 0usize;
        let mut cursor = last_removed;
        let mut floor = -1;
        while let Some(entry) = removed.get(&cursor) {
            if visited == removed.len() || entry.replacement <= floor {
                return Err(SnapshotError::BrokenChain(cursor));
            }
            visited += 1;
            floor = entry.replacement;
            cursor = entry.prev_removed;
        }
        if visited != removed.len() {
            return Err(SnapshotError::BrokenChain(cursor));
        }

        Ok(Self::from_parts(hash, capacity, last_removed, removed))
    }
}
