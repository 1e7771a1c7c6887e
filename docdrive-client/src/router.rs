//! Routing of reads to the node chosen by a read preference.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use docdrive_core::protocol::QueryOptions;
use docdrive_core::{Query, Reply, Result};
use tracing::instrument;

use crate::cluster::Cluster;
use crate::operation::ReadOperation;
use crate::read_preference::ReadPreference;
use crate::session::Session;

/// Sends each read to exactly one node picked by the read preference.
///
/// The router borrows its collaborators for the duration of a call and keeps
/// nothing between calls; the policy is consulted on every read.
#[derive(Clone, Copy)]
pub struct ReadRouter<'a> {
    cluster: &'a dyn Cluster,
    read_preference: &'a dyn ReadPreference,
    timeout: Option<Duration>,
}

impl<'a> ReadRouter<'a> {
    /// Creates a router over `cluster` using `read_preference`.
    pub fn new(cluster: &'a dyn Cluster, read_preference: &'a dyn ReadPreference) -> Self {
        Self {
            cluster,
            read_preference,
            timeout: None,
        }
    }

    /// Creates a router from the session's cluster, read preference and
    /// operation timeout.
    pub fn from_session(session: &'a Session) -> Self {
        Self::new(session.cluster(), session.read_preference())
            .with_timeout(session.config().operation_timeout())
    }

    /// Sets the deadline handed to each read operation.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Runs `query` on the node selected by the read preference and returns
    /// the node's reply unchanged.
    ///
    /// # Errors
    ///
    /// - [`NoEligibleNode`](docdrive_core::DriverError::NoEligibleNode) if the
    ///   policy selects nothing; no node is contacted in that case.
    /// - Any failure of the read operation itself (network, protocol, timeout).
    #[instrument(
        name = "read_router.read",
        skip(self, query),
        fields(
            namespace = %query.full_collection_name(),
            mode = %self.read_preference.mode(),
        ),
        level = "debug"
    )]
    pub async fn read(&self, query: Query) -> Result<Reply> {
        let node = self
            .read_preference
            .select_node(self.cluster)
            .map_err(|err| {
                tracing::debug!(error = %err, "node selection failed");
                err
            })?;

        let options = self.read_preference.query_options(query.options());
        let query = query.with_options(options);

        tracing::debug!(
            address = %node.info().address,
            flags = options.flags().bits(),
            "routing read"
        );

        ReadOperation::new(query)
            .with_timeout(self.timeout)
            .execute(node.as_ref())
            .await
    }
}

impl fmt::Debug for ReadRouter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadRouter")
            .field("read_preference", &self.read_preference)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Runs `query` through the session's read preference on the session's
/// cluster.
pub async fn read(session: &Session, query: Query) -> Result<Reply> {
    ReadRouter::from_session(session).read(query).await
}

/// Anything bound to a session can issue routed reads.
#[async_trait]
pub trait Readable: Sync {
    /// Returns the session reads are issued through.
    fn session(&self) -> &Session;

    /// Returns the session's cluster.
    fn cluster(&self) -> &dyn Cluster {
        self.session().cluster()
    }

    /// Returns the session's read preference.
    fn read_preference(&self) -> &dyn ReadPreference {
        self.session().read_preference()
    }

    /// Returns `options` adjusted by the session's read preference.
    fn query_options(&self, options: QueryOptions) -> QueryOptions {
        self.read_preference().query_options(options)
    }

    /// Routes `query` through the session. See [`ReadRouter::read`].
    async fn read(&self, query: Query) -> Result<Reply> {
        read(self.session(), query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::testing::{addr, StubNode};
    use crate::cluster::{Node, NodeInfo, NodeRole, StaticCluster};
    use crate::read_preference::{Primary, Secondary};
    use docdrive_core::doc;
    use docdrive_core::protocol::QueryFlags;
    use docdrive_core::DriverError;
    use std::sync::Arc;

    fn stub(port: u16, role: NodeRole) -> Arc<StubNode> {
        Arc::new(StubNode::new(NodeInfo::new(addr(port), role)))
    }

    fn cluster_of(nodes: &[Arc<StubNode>]) -> StaticCluster {
        nodes
            .iter()
            .map(|node| Arc::clone(node) as Arc<dyn Node>)
            .collect()
    }

    fn query() -> Query {
        Query::new("app", "users", doc! {})
    }

    #[tokio::test]
    async fn test_read_contacts_only_selected_node() {
        let primary = stub(1, NodeRole::Primary);
        let secondary = stub(2, NodeRole::Secondary);
        let cluster = cluster_of(&[primary.clone(), secondary.clone()]);

        let policy = Secondary::new();
        let router = ReadRouter::new(&cluster, &policy);
        router.read(query()).await.unwrap();

        assert_eq!(primary.calls(), 0);
        assert_eq!(secondary.calls(), 1);
    }

    #[tokio::test]
    async fn test_selection_failure_contacts_nobody() {
        let secondary = stub(2, NodeRole::Secondary);
        let cluster = cluster_of(&[secondary.clone()]);

        let err = ReadRouter::new(&cluster, &Primary::new())
            .read(query())
            .await
            .unwrap_err();

        assert!(matches!(err, DriverError::NoEligibleNode(_)));
        assert_eq!(secondary.calls(), 0);
    }

    #[tokio::test]
    async fn test_execution_failure_is_not_selection_failure() {
        let primary = Arc::new(StubNode::failing(NodeInfo::new(addr(1), NodeRole::Primary)));
        let cluster = cluster_of(&[primary.clone()]);

        let err = ReadRouter::new(&cluster, &Primary::new())
            .read(query())
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::Network(_)));
        assert_eq!(primary.calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_role_node_is_skipped() {
        let unknown = stub(3, NodeRole::Unknown);
        let primary = stub(1, NodeRole::Primary);
        let cluster = cluster_of(&[unknown.clone(), primary.clone()]);

        ReadRouter::new(&cluster, &Primary::new())
            .read(query())
            .await
            .unwrap();
        assert_eq!(unknown.calls(), 0);
        assert_eq!(primary.calls(), 1);
    }

    #[test]
    fn test_router_debug_omits_cluster() {
        let cluster = StaticCluster::default();
        let router = ReadRouter::new(&cluster, &Primary);
        let rendered = format!("{:?}", router);
        assert!(rendered.starts_with("ReadRouter"));
        assert!(rendered.contains("Primary"));
    }

    #[test]
    fn test_query_options_from_policy() {
        let options = Secondary::new().query_options(QueryOptions::new());
        assert!(options.flags().contains(QueryFlags::SLAVE_OK));
    }
}
