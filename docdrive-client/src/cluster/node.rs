//! Cluster nodes and the interface used to run reads on them.

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use docdrive_core::{Query, Reply, Result};
use uuid::Uuid;

/// Role a node currently plays in its replica set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRole {
    /// Accepts writes; always readable.
    Primary,
    /// Replicates from the primary; readable when the preference allows it.
    Secondary,
    /// Votes in elections but holds no data.
    Arbiter,
    /// Not yet classified by the topology monitor.
    Unknown,
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "PRIMARY"),
            Self::Secondary => write!(f, "SECONDARY"),
            Self::Arbiter => write!(f, "ARBITER"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Describes a member of the cluster as last observed by topology monitoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    /// Unique identifier of the node.
    pub id: Uuid,
    /// Network address of the node.
    pub address: SocketAddr,
    /// Current replica-set role.
    pub role: NodeRole,
    /// Replica-set tags, matched against read preference tag sets.
    pub tags: HashMap<String, String>,
    /// Last measured round-trip time.
    pub latency: Duration,
}

impl NodeInfo {
    /// Creates a node description with no tags and zero latency.
    pub fn new(address: SocketAddr, role: NodeRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            address,
            role,
            tags: HashMap::new(),
            latency: Duration::ZERO,
        }
    }

    /// Adds a tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Sets the measured round-trip time.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Returns the node's network address.
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Returns the node's role.
    pub fn role(&self) -> NodeRole {
        self.role
    }

    /// Returns `true` if the node is the primary.
    pub fn is_primary(&self) -> bool {
        self.role == NodeRole::Primary
    }

    /// Returns `true` if the node is a secondary.
    pub fn is_secondary(&self) -> bool {
        self.role == NodeRole::Secondary
    }
}

impl fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node[address={}, role={}]", self.address, self.role)
    }
}

/// A single addressable endpoint able to answer queries.
///
/// Connection handling, authentication and response decoding live behind
/// this trait; the read path only sees a typed [`Reply`] or a typed failure.
#[async_trait]
pub trait Node: Send + Sync + fmt::Debug {
    /// Returns the node's description.
    fn info(&self) -> &NodeInfo;

    /// Sends `query` to the node and waits for its reply.
    async fn process(&self, query: Query) -> Result<Reply>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn test_node_info_defaults() {
        let info = NodeInfo::new(addr(27017), NodeRole::Primary);
        assert!(info.is_primary());
        assert!(!info.is_secondary());
        assert!(info.tags.is_empty());
        assert_eq!(info.latency, Duration::ZERO);
        assert_eq!(info.address(), addr(27017));
    }

    #[test]
    fn test_node_info_builders() {
        let info = NodeInfo::new(addr(27018), NodeRole::Secondary)
            .with_tag("dc", "east")
            .with_latency(Duration::from_millis(4));
        assert_eq!(info.tags.get("dc").map(String::as_str), Some("east"));
        assert_eq!(info.latency, Duration::from_millis(4));
    }

    #[test]
    fn test_node_ids_are_unique() {
        let a = NodeInfo::new(addr(1), NodeRole::Secondary);
        let b = NodeInfo::new(addr(1), NodeRole::Secondary);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_display() {
        let info = NodeInfo::new(addr(27019), NodeRole::Arbiter);
        assert_eq!(info.to_string(), "Node[address=127.0.0.1:27019, role=ARBITER]");
    }
}
