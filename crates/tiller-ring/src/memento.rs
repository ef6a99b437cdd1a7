//! The MementoHash ring: JumpHash over the full capacity, plus a memento of
//! every removal that redirects lookups away from removed buckets.

use std::collections::HashMap;
use std::fmt;

use tiller_hash::{HashAlgorithm, HashFn};
use tracing::debug;

use crate::jump::jump_hash;

/// Record of a single bucket removal.
///
/// The removals form a linked stack: `prev_removed` points at the bucket that
/// was removed immediately before this one. At the bottom of the stack
/// `prev_removed` holds the working-set size at first-removal time, which is
/// never a removed id and so acts as the end marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Removal {
    /// The removed bucket id.
    pub bucket: i32,
    /// The bucket that absorbed this one's keys. Numerically equal to the
    /// working-set size right after the removal, which is also the modulus
    /// used when redirecting a lookup out of this bucket.
    pub replacement: i32,
    /// The bucket removed immediately before this one.
    pub prev_removed: i32,
}

/// Consistent hasher with stable, dense bucket ids.
///
/// `capacity` is the high-water mark of issued ids; `removed` tracks every
/// currently-removed id. Lookups jump into `[0, capacity)` and tunnel through
/// the removal table until they reach a live bucket. Mutation is
/// single-writer; lookups are read-only and re-entrant.
///
/// When the removal table is empty, `last_removed` always equals `capacity`,
/// i.e. the next fresh id; that is what makes [`add_bucket`](Self::add_bucket)
/// a plain append on a ring that has never shrunk.
#[derive(Debug, Clone, PartialEq)]
pub struct MementoRing {
    hash: HashFn,
    /// One more than the largest id currently issued (`N`).
    capacity: i32,
    /// Top of the removal stack (`L`); next id to hand out when the table
    /// is empty.
    last_removed: i32,
    /// Removed buckets keyed by id (`R`).
    removed: HashMap<i32, Removal>,
}

impl MementoRing {
    /// Create an empty ring using the default algorithm (CRC32).
    pub fn new() -> Self {
        Self::with_algorithm(HashAlgorithm::default())
    }

    /// Create an empty ring using the given digest algorithm.
    pub fn with_algorithm(algorithm: HashAlgorithm) -> Self {
        Self::with_hash(HashFn::new(algorithm))
    }

    /// Create an empty ring using the given digest function.
    pub fn with_hash(hash: HashFn) -> Self {
        Self {
            hash,
            capacity: 0,
            last_removed: 0,
            removed: HashMap::new(),
        }
    }

    /// The digest function this ring hashes keys with.
    pub fn hash_fn(&self) -> HashFn {
        self.hash
    }

    /// Add a bucket and return its id.
    ///
    /// Reuses the most recently removed id when the removal table is
    /// non-empty; otherwise appends a fresh id at `capacity`.
    pub fn add_bucket(&mut self) -> i32 {
        let bucket = self.last_removed;

        // Pops `bucket` off the removal stack, or yields `bucket + 1` when
        // the table is empty (fresh append).
        self.last_removed = self.restore(bucket);

        if self.capacity <= bucket {
            self.capacity = bucket + 1;
        }

        debug!(bucket, capacity = self.capacity, "bucket added");
        bucket
    }

    /// Remove a live bucket, returning its id, or `-1` when the id was never
    /// issued.
    ///
    /// Removing an id that is already in the removal table is not a supported
    /// operation; callers must track liveness (the server pool does).
    pub fn remove_bucket(&mut self, bucket: i32) -> i32 {
        if bucket < 0 || bucket >= self.capacity {
            return -1;
        }

        // Tail removal with a clean table shrinks capacity instead of
        // recording a memento.
        if self.removed.is_empty() && bucket == self.capacity - 1 {
            self.last_removed = bucket;
            self.capacity = bucket;
            debug!(bucket, capacity = self.capacity, "tail bucket dropped");
            return bucket;
        }

        // `replacement` is the working-set size *after* this removal: the
        // modulus for redirected lookups, computed before the insert below
        // shrinks the set.
        let replacement = self.working_set() - 1;
        self.removed.insert(
            bucket,
            Removal {
                bucket,
                replacement,
                prev_removed: self.last_removed,
            },
        );
        self.last_removed = bucket;

        debug!(bucket, replacement, "bucket removed");
        bucket
    }

    /// The live bucket responsible for `key`, or `-1` when the working set is
    /// empty.
    ///
    /// Terminates within `removed_len() + 1` redirection rounds: every round
    /// strictly shrinks the historical working-set bound it hashes into.
    pub fn bucket(&self, key: &str) -> i32 {
        if self.is_empty() {
            return -1;
        }

        // Initial candidate in [0, capacity).
        let mut bucket = jump_hash(self.hash.hash_str(key), self.capacity);

        let mut replacement = self.replacement_of(bucket);
        while replacement >= 0 {
            // `bucket` is removed. Reseed with the removed id and hash into
            // the working set as it stood right after that removal. The
            // modulus is taken on the unsigned digest so the result stays in
            // [0, replacement) for any 64-bit digest.
            bucket =
                (self.hash.hash_str_with_seed(key, i64::from(bucket)) % replacement as u64) as i32;

            // If we landed on a bucket that was removed *before* the current
            // frame (its recorded working set is at least as large), the key
            // was redirected off it in some earlier epoch; follow the stored
            // substitutes forward instead of reseeding.
            let mut r = self.replacement_of(bucket);
            while r >= replacement {
                bucket = r;
                r = self.replacement_of(bucket);
            }
            replacement = r;
        }

        bucket
    }

    /// Working-set size: buckets currently live.
    pub fn len(&self) -> usize {
        self.capacity as usize - self.removed.len()
    }

    /// Whether no live bucket exists.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// High-water mark of issued ids (`N`); the modulus of the initial jump.
    pub fn capacity(&self) -> i32 {
        self.capacity
    }

    /// Number of currently-removed buckets.
    pub fn removed_len(&self) -> usize {
        self.removed.len()
    }

    /// Whether `bucket` is currently live.
    pub fn contains(&self, bucket: i32) -> bool {
        (0..self.capacity).contains(&bucket) && !self.removed.contains_key(&bucket)
    }

    /// Iterate over the currently live bucket ids, ascending.
    pub fn live_buckets(&self) -> impl Iterator<Item = i32> + '_ {
        (0..self.capacity).filter(|b| !self.removed.contains_key(b))
    }

    fn working_set(&self) -> i32 {
        self.capacity - self.removed.len() as i32
    }

    /// The recorded replacement for `bucket`, or `-1` when it is live.
    fn replacement_of(&self, bucket: i32) -> i32 {
        self.removed.get(&bucket).map_or(-1, |r| r.replacement)
    }

    /// Pop `bucket` from the removal table and return the bucket removed
    /// before it. With an empty table this is a fresh append: the next id is
    /// simply `bucket + 1`.
    fn restore(&mut self, bucket: i32) -> i32 {
        if self.removed.is_empty() {
            return bucket + 1;
        }
        match self.removed.remove(&bucket) {
            Some(r) => r.prev_removed,
            None => -1,
        }
    }

    pub(crate) fn parts(&self) -> (i32, i32, &HashMap<i32, Removal>) {
        (self.capacity, self.last_removed, &self.removed)
    }

    pub(crate) fn from_parts(
        hash: HashFn,
        capacity: i32,
        last_removed: i32,
        removed: HashMap<i32, Removal>,
    ) -> Self {
        Self {
            hash,
            capacity,
            last_removed,
            removed,
        }
    }
}

impl Default for MementoRing {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MementoRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MementoRing{{capacity: {}, live: {}, removed: {}}}",
            self.capacity,
            self.len(),
            self.removed.len()
        )
    }
}
