//! Common test doubles for integration tests.

#![allow(dead_code)]

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use docdrive_client::core::bson::Document;
use docdrive_client::core::doc;
use docdrive_client::core::protocol::{QueryOptions, WireCodec};
use docdrive_client::core::{DriverError, Query, Reply, Result};
use docdrive_client::{Cluster, Node, NodeInfo, NodeRole, ReadMode, ReadPreference};
use tokio_util::codec::{Decoder, Encoder};

pub fn addr(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

/// Answers with a single document naming the node, and records every query.
#[derive(Debug)]
pub struct RecordingNode {
    info: NodeInfo,
    calls: AtomicUsize,
    queries: Mutex<Vec<Query>>,
}

impl RecordingNode {
    pub fn new(port: u16, role: NodeRole) -> Arc<Self> {
        Self::with_info(NodeInfo::new(addr(port), role))
    }

    pub fn with_info(info: NodeInfo) -> Arc<Self> {
        Arc::new(Self {
            info,
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<Query> {
        self.queries.lock().ok()?.last().cloned()
    }

    /// The reply this node produces for `query`.
    pub fn reply_for(&self, query: &Query) -> Reply {
        Reply::new(
            query.request_id(),
            vec![doc! { "ok" => 1i32, "served_by" => i32::from(self.info.address.port()) }],
        )
        .with_cursor_id(i64::from(self.info.address.port()))
    }
}

#[async_trait]
impl Node for RecordingNode {
    fn info(&self) -> &NodeInfo {
        &self.info
    }

    async fn process(&self, query: Query) -> Result<Reply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.reply_for(&query);
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query);
        }
        Ok(reply)
    }
}

/// Never answers within any reasonable deadline.
#[derive(Debug)]
pub struct SlowNode {
    info: NodeInfo,
    delay: Duration,
}

impl SlowNode {
    pub fn new(port: u16, role: NodeRole, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            info: NodeInfo::new(addr(port), role),
            delay,
        })
    }
}

#[async_trait]
impl Node for SlowNode {
    fn info(&self) -> &NodeInfo {
        &self.info
    }

    async fn process(&self, query: Query) -> Result<Reply> {
        tokio::time::sleep(self.delay).await;
        Ok(Reply::new(query.request_id(), Vec::new()))
    }
}

/// Fails every round-trip with a network error.
#[derive(Debug)]
pub struct UnreachableNode {
    info: NodeInfo,
    calls: AtomicUsize,
}

impl UnreachableNode {
    pub fn new(port: u16, role: NodeRole) -> Arc<Self> {
        Arc::new(Self {
            info: NodeInfo::new(addr(port), role),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Node for UnreachableNode {
    fn info(&self) -> &NodeInfo {
        &self.info
    }

    async fn process(&self, _query: Query) -> Result<Reply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(DriverError::Network(format!(
            "connection to {} refused",
            self.info.address
        )))
    }
}

type Responder = Box<dyn Fn(&Query) -> Reply + Send + Sync>;

/// Pushes every query and reply through their byte encodings, as a socket
/// would.
pub struct WireNode {
    info: NodeInfo,
    responder: Responder,
    seen: Mutex<Vec<Query>>,
}

impl WireNode {
    pub fn new(
        port: u16,
        role: NodeRole,
        responder: impl Fn(&Query) -> Reply + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            info: NodeInfo::new(addr(port), role),
            responder: Box::new(responder),
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Queries as decoded from the bytes the driver sent.
    pub fn seen(&self) -> Vec<Query> {
        self.seen.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

impl fmt::Debug for WireNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WireNode").field("info", &self.info).finish()
    }
}

#[async_trait]
impl Node for WireNode {
    fn info(&self) -> &NodeInfo {
        &self.info
    }

    async fn process(&self, query: Query) -> Result<Reply> {
        let mut codec = WireCodec::new();

        let mut outbound = BytesMut::new();
        codec.encode(query, &mut outbound)?;
        let received = Query::decode(&outbound)?;

        let reply = (self.responder)(&received);
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(received);
        }

        let mut inbound = reply.encode()?;
        codec
            .decode(&mut inbound)?
            .ok_or_else(|| DriverError::Network("connection closed mid-frame".to_string()))
    }
}

/// Always selects the node at `index` of the snapshot and counts how often
/// the cluster was consulted.
#[derive(Debug, Default)]
pub struct FixedIndexPreference {
    index: usize,
    selections: AtomicUsize,
}

impl FixedIndexPreference {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            selections: AtomicUsize::new(0),
        }
    }

    pub fn selections(&self) -> usize {
        self.selections.load(Ordering::SeqCst)
    }
}

impl ReadPreference for FixedIndexPreference {
    fn mode(&self) -> ReadMode {
        ReadMode::Nearest
    }

    fn select_node(&self, cluster: &dyn Cluster) -> Result<Arc<dyn Node>> {
        self.selections.fetch_add(1, Ordering::SeqCst);
        cluster
            .nodes()
            .get(self.index)
            .cloned()
            .ok_or_else(|| DriverError::NoEligibleNode(format!("no node at index {}", self.index)))
    }

    fn query_options(&self, options: QueryOptions) -> QueryOptions {
        options
    }
}

/// A cluster whose snapshot count is observable.
#[derive(Debug)]
pub struct CountingCluster {
    nodes: Vec<Arc<dyn Node>>,
    snapshots: AtomicUsize,
}

impl CountingCluster {
    pub fn new(nodes: Vec<Arc<dyn Node>>) -> Self {
        Self {
            nodes,
            snapshots: AtomicUsize::new(0),
        }
    }

    pub fn snapshots(&self) -> usize {
        self.snapshots.load(Ordering::SeqCst)
    }
}

impl Cluster for CountingCluster {
    fn nodes(&self) -> Vec<Arc<dyn Node>> {
        self.snapshots.fetch_add(1, Ordering::SeqCst);
        self.nodes.clone()
    }
}

pub fn served_by(documents: &[Document]) -> Option<i32> {
    documents.first().and_then(|doc| doc.get_i32("served_by"))
}
