//! MementoHash consistent hashing for deterministic bucket placement.
//!
//! This crate maps opaque string keys to integer-labeled buckets such that
//! adding or removing a bucket remaps only a minimal fraction of keys.
//! [`MementoRing`] layers the MementoHash scheme (Coluzzi et al., 2023) over
//! Lamping–Veach JumpHash: lookups jump into the full historical capacity,
//! then a compact table of removals redirects any key that lands on a removed
//! bucket to a live one, in O(removed) worst case and O(1) when nothing has
//! been removed.
//!
//! Bucket ids are dense and stable: removing bucket 3 and later adding a
//! bucket hands 3 back out. Hosts that want to persist a ring serialize a
//! [`RingSnapshot`] and rebuild with [`MementoRing::from_snapshot`].

mod jump;
mod memento;
mod snapshot;

pub use memento::{MementoRing, Removal};
pub use snapshot::{RingSnapshot, SnapshotError};
