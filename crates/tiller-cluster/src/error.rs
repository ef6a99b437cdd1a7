//! Error types for the pool and balancer.

use crate::node::ServerNode;

/// Errors produced by the server pool registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// The bucket already has a node registered.
    #[error("bucket {0} already exists")]
    BucketExists(i32),

    /// The node is already registered under another bucket.
    #[error("node {0} already exists")]
    NodeExists(ServerNode),

    /// The node is not in the pool.
    #[error("node {0} not found")]
    NodeNotFound(ServerNode),

    /// The bucket has no registered node.
    #[error("bucket {0} not found")]
    BucketNotFound(i32),
}

/// Errors produced by the load balancer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClusterError {
    /// A batch operation was called with no nodes.
    #[error("no nodes to {0}")]
    EmptyBatch(&'static str),

    /// More nodes were asked to leave than are currently serving.
    #[error("cannot remove {requested} nodes from a working set of {available}")]
    NotEnoughNodes { requested: usize, available: usize },

    /// Keys must be non-empty.
    #[error("key cannot be empty")]
    EmptyKey,

    /// A lookup was attempted against an empty balancer.
    #[error("no nodes in the cluster")]
    NoNodes,

    /// The ring issued a bucket the pool has no node for. Registry drift;
    /// indicates a caller mutated one side without the other.
    #[error("no node registered for bucket {0}")]
    BucketUnmapped(i32),

    /// A node address failed to parse.
    #[error("invalid node address {0:?}")]
    InvalidAddress(String),

    /// An error from the pool registry.
    #[error(transparent)]
    Pool(#[from] PoolError),
}
