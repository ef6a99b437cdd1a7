//! Shared helpers for Tiller integration tests.
//!
//! Everything here is deterministic: node addresses come from a fixed
//! sequence and keys from a fixed format, so a failing distribution or churn
//! test reproduces byte-for-byte.

use tiller_cluster::{LoadBalancer, ServerNode};
use tiller_hash::HashAlgorithm;

/// Deterministic key stream: `key-000000`, `key-000001`, …
pub fn keys(count: usize) -> impl Iterator<Item = String> {
    (0..count).map(|i| format!("key-{i:06}"))
}

/// Deterministic node sequence in 10.0.0.0/8 (distinct for `count` < 2^24).
pub fn node_seq(count: usize) -> Vec<ServerNode> {
    (0..count)
        .map(|i| ServerNode::from_v4_bytes([10, (i >> 16) as u8, (i >> 8) as u8, i as u8]))
        .collect()
}

/// A balancer pre-populated with `count` nodes from [`node_seq`].
pub fn balancer_with(count: usize, algorithm: HashAlgorithm) -> (LoadBalancer, Vec<ServerNode>) {
    let nodes = node_seq(count);
    let mut lb = LoadBalancer::with_algorithm(algorithm);
    lb.add_nodes(&nodes).expect("seeding the balancer");
    (lb, nodes)
}

/// All digest algorithms, for tests that must hold regardless of family.
pub const ALGORITHMS: [HashAlgorithm; 3] = [
    HashAlgorithm::Crc32,
    HashAlgorithm::Md5,
    HashAlgorithm::Sha256,
];
