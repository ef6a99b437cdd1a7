//! Server pool and load balancer for Tiller.
//!
//! [`LoadBalancer`] is the single writer that keeps two structures in
//! lock-step: the consistent hash ring (which issues integer buckets) and the
//! [`ServerPool`] (which remembers which [`ServerNode`] owns each bucket, and
//! which work objects sit on it). Keys go in, nodes come out.

mod balancer;
mod error;
mod node;
mod pool;

pub use balancer::LoadBalancer;
pub use error::{ClusterError, PoolError};
pub use node::{ServerNode, WorkObject};
pub use pool::ServerPool;
