//! The cluster interface and a fixed-membership implementation.

use std::fmt;
use std::sync::Arc;

use super::node::Node;

/// The driver's current view of reachable nodes.
///
/// Topology monitoring owns and updates the view; the read path only takes
/// snapshots of it and never mutates it.
pub trait Cluster: Send + Sync + fmt::Debug {
    /// Returns a snapshot of the nodes currently known to be reachable.
    fn nodes(&self) -> Vec<Arc<dyn Node>>;
}

/// A cluster whose membership never changes.
#[derive(Debug, Clone, Default)]
pub struct StaticCluster {
    nodes: Vec<Arc<dyn Node>>,
}

impl StaticCluster {
    /// Creates a cluster from the given nodes.
    pub fn new(nodes: Vec<Arc<dyn Node>>) -> Self {
        Self { nodes }
    }

    /// Returns the number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the cluster has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Cluster for StaticCluster {
    fn nodes(&self) -> Vec<Arc<dyn Node>> {
        self.nodes.clone()
    }
}

impl FromIterator<Arc<dyn Node>> for StaticCluster {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Node>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
