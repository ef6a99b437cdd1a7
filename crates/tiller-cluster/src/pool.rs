//! Bucket ↔ node registry with work-object book-keeping.

use std::collections::HashMap;

use tracing::debug;

use crate::error::PoolError;
use crate::node::{ServerNode, WorkObject};

/// The server pool: which node owns which bucket, and which objects sit
/// where.
///
/// The two registry maps are mirror images at all times, so lookups are O(1)
/// in both directions. The pool never invents bucket ids; it only stores the
/// ids the hash ring issued to the balancer.
#[derive(Debug, Default, Clone)]
pub struct ServerPool {
    /// Bucket id → owning node.
    node_by_bucket: HashMap<i32, ServerNode>,
    /// Node → its bucket id.
    bucket_by_node: HashMap<ServerNode, i32>,
    /// Tracked work objects, keyed by object id.
    objects: HashMap<u64, WorkObject>,
}

impl ServerPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `node` as the owner of `bucket`.
    pub fn add_node(&mut self, node: ServerNode, bucket: i32) -> Result<(), PoolError> {
        if self.node_by_bucket.contains_key(&bucket) {
            return Err(PoolError::BucketExists(bucket));
        }
        if self.bucket_by_node.contains_key(&node) {
            return Err(PoolError::NodeExists(node));
        }

        self.node_by_bucket.insert(bucket, node);
        self.bucket_by_node.insert(node, bucket);
        debug!(%node, bucket, "node registered");
        Ok(())
    }

    /// Drop `node` from the pool, returning the `(bucket, node)` pair that
    /// was registered.
    ///
    /// Objects assigned to the node's bucket become unassigned; they stay in
    /// the book so the balancer can re-place them.
    pub fn remove_node(&mut self, node: &ServerNode) -> Result<(i32, ServerNode), PoolError> {
        let bucket = self
            .bucket_by_node
            .remove(node)
            .ok_or(PoolError::NodeNotFound(*node))?;
        let owner = self
            .node_by_bucket
            .remove(&bucket)
            .expect("registry maps out of sync");

        for obj in self.objects.values_mut() {
            if obj.bucket() == Some(bucket) {
                obj.set_bucket(None);
            }
        }

        debug!(node = %owner, bucket, "node dropped");
        Ok((bucket, owner))
    }

    /// The node owning `bucket`, if any.
    pub fn node(&self, bucket: i32) -> Option<ServerNode> {
        self.node_by_bucket.get(&bucket).copied()
    }

    /// The bucket owned by `node`, if it is registered.
    pub fn bucket_of(&self, node: &ServerNode) -> Option<i32> {
        self.bucket_by_node.get(node).copied()
    }

    /// Iterate over `(node, bucket)` pairs in unspecified order.
    pub fn nodes(&self) -> impl Iterator<Item = (ServerNode, i32)> + '_ {
        self.bucket_by_node.iter().map(|(n, b)| (*n, *b))
    }

    /// Iterate over `(bucket, node)` pairs in unspecified order.
    pub fn buckets(&self) -> impl Iterator<Item = (i32, ServerNode)> + '_ {
        self.node_by_bucket.iter().map(|(b, n)| (*b, *n))
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.node_by_bucket.len()
    }

    /// Whether the pool has no nodes.
    pub fn is_empty(&self) -> bool {
        self.node_by_bucket.is_empty()
    }

    /// Place (or move) a work object onto a registered bucket.
    pub fn assign_object(&mut self, id: u64, bucket: i32) -> Result<(), PoolError> {
        if !self.node_by_bucket.contains_key(&bucket) {
            return Err(PoolError::BucketNotFound(bucket));
        }
        self.objects
            .entry(id)
            .or_insert_with(|| WorkObject::new(id))
            .set_bucket(Some(bucket));
        Ok(())
    }

    /// Take a work object off its bucket, returning the bucket it was on.
    pub fn unassign_object(&mut self, id: u64) -> Option<i32> {
        let obj = self.objects.get_mut(&id)?;
        let bucket = obj.bucket();
        obj.set_bucket(None);
        bucket
    }

    /// Look up a tracked work object.
    pub fn object(&self, id: u64) -> Option<&WorkObject> {
        self.objects.get(&id)
    }

    /// Iterate over the ids of objects currently assigned to `bucket`.
    pub fn objects_on(&self, bucket: i32) -> impl Iterator<Item = u64> + '_ {
        self.objects
            .values()
            .filter(move |o| o.bucket() == Some(bucket))
            .map(|o| o.id())
    }

    /// Number of tracked work objects (assigned or not).
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}
