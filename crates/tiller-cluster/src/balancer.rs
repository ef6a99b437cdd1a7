//! The load balancer: hash ring + server pool behind one writer.

use tiller_hash::HashAlgorithm;
use tiller_ring::MementoRing;
use tracing::{info, warn};

use crate::error::ClusterError;
use crate::node::ServerNode;
use crate::pool::ServerPool;

/// Maps keys to server nodes with minimal disruption under membership churn.
///
/// The balancer owns both halves of the state: the [`MementoRing`] issues and
/// retires bucket ids, the [`ServerPool`] remembers which node holds each id.
/// Every mutation goes through here, which is what keeps the two in
/// lock-step; lookups never mutate.
#[derive(Debug, Clone)]
pub struct LoadBalancer {
    pool: ServerPool,
    ring: MementoRing,
}

impl LoadBalancer {
    /// Create an empty balancer hashing with CRC32.
    pub fn new() -> Self {
        Self::with_algorithm(HashAlgorithm::default())
    }

    /// Create an empty balancer with the given digest algorithm.
    pub fn with_algorithm(algorithm: HashAlgorithm) -> Self {
        Self {
            pool: ServerPool::new(),
            ring: MementoRing::with_algorithm(algorithm),
        }
    }

    /// Add a batch of nodes, returning the bucket assigned to each.
    ///
    /// Fails on an empty batch. If a node is rejected by the pool (already
    /// present), its just-issued bucket is rolled back out of the ring and
    /// the error is returned; nodes earlier in the batch stay added.
    pub fn add_nodes(&mut self, nodes: &[ServerNode]) -> Result<Vec<i32>, ClusterError> {
        if nodes.is_empty() {
            return Err(ClusterError::EmptyBatch("add"));
        }

        let mut buckets = Vec::with_capacity(nodes.len());
        for &node in nodes {
            let bucket = self.ring.add_bucket();
            if let Err(e) = self.pool.add_node(node, bucket) {
                self.ring.remove_bucket(bucket);
                return Err(e.into());
            }
            info!(%node, bucket, "node joined");
            buckets.push(bucket);
        }
        Ok(buckets)
    }

    /// Remove a batch of nodes.
    ///
    /// Fails on an empty batch, on a batch larger than the working set, and
    /// on the first node that is not in the pool (earlier removals stand).
    pub fn remove_nodes(&mut self, nodes: &[ServerNode]) -> Result<(), ClusterError> {
        if nodes.is_empty() {
            return Err(ClusterError::EmptyBatch("remove"));
        }
        if nodes.len() > self.ring.len() {
            return Err(ClusterError::NotEnoughNodes {
                requested: nodes.len(),
                available: self.ring.len(),
            });
        }

        for node in nodes {
            let (bucket, _) = self.pool.remove_node(node)?;
            self.ring.remove_bucket(bucket);
            info!(%node, bucket, "node left");
        }
        Ok(())
    }

    /// The node responsible for `key`.
    pub fn node_for(&self, key: &str) -> Result<ServerNode, ClusterError> {
        if key.is_empty() {
            return Err(ClusterError::EmptyKey);
        }
        if self.ring.is_empty() {
            return Err(ClusterError::NoNodes);
        }

        let bucket = self.ring.bucket(key);
        self.pool.node(bucket).ok_or_else(|| {
            warn!(bucket, "ring issued a bucket the pool does not know");
            ClusterError::BucketUnmapped(bucket)
        })
    }

    /// Route a work object by key and record the placement in the pool.
    pub fn place_object(&mut self, id: u64, key: &str) -> Result<ServerNode, ClusterError> {
        let node = self.node_for(key)?;
        let bucket = self
            .pool
            .bucket_of(&node)
            .expect("node resolved from the pool");
        self.pool.assign_object(id, bucket)?;
        Ok(node)
    }

    /// Number of serving nodes.
    pub fn node_count(&self) -> usize {
        self.ring.len()
    }

    /// Iterate over `(node, bucket)` pairs.
    pub fn nodes(&self) -> impl Iterator<Item = (ServerNode, i32)> + '_ {
        self.pool.nodes()
    }

    /// Iterate over `(bucket, node)` pairs.
    pub fn buckets(&self) -> impl Iterator<Item = (i32, ServerNode)> + '_ {
        self.pool.buckets()
    }

    /// Read access to the hash ring.
    pub fn ring(&self) -> &MementoRing {
        &self.ring
    }

    /// Read access to the pool registry.
    pub fn pool(&self) -> &ServerPool {
        &self.pool
    }
}

impl Default for LoadBalancer {
    fn default() -> Self {
        Self::new()
    }
}
