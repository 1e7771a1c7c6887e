//! Cluster topology as seen by the read path.

mod node;
mod static_cluster;

pub use node::{Node, NodeInfo, NodeRole};
pub use static_cluster::{Cluster, StaticCluster};
