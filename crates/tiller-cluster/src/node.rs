//! Node and work-object types.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use crate::error::ClusterError;

/// A server in the pool, identified by its IP address.
///
/// Cheap to copy; equality and hashing follow the address, so the same
/// address always names the same node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServerNode {
    addr: IpAddr,
}

impl ServerNode {
    /// Create a node from an already-parsed address.
    pub fn new(addr: IpAddr) -> Self {
        Self { addr }
    }

    /// Create a node from raw IPv4 bytes (big-endian).
    pub fn from_v4_bytes(bytes: [u8; 4]) -> Self {
        Self::new(IpAddr::V4(Ipv4Addr::from(bytes)))
    }

    /// The node's address.
    pub fn addr(&self) -> IpAddr {
        self.addr
    }
}

impl FromStr for ServerNode {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<IpAddr>()
            .map(Self::new)
            .map_err(|_| ClusterError::InvalidAddress(s.to_string()))
    }
}

impl fmt::Display for ServerNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.addr.fmt(f)
    }
}

/// A unit of work placed on the cluster.
///
/// An object remembers the bucket it is assigned to, not the node: the
/// node is always recoverable through the pool, and buckets stay valid
/// across node handle churn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkObject {
    id: u64,
    bucket: Option<i32>,
}

impl WorkObject {
    /// Create an unassigned work object.
    pub fn new(id: u64) -> Self {
        Self { id, bucket: None }
    }

    /// The object's identifier.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The bucket this object currently sits on, if any.
    pub fn bucket(&self) -> Option<i32> {
        self.bucket
    }

    pub(crate) fn set_bucket(&mut self, bucket: Option<i32>) {
        self.bucket = bucket;
    }
}

impl fmt::Display for WorkObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WorkObject({})", self.id)
    }
}
