//! The built-in read preference modes.

use std::sync::Arc;

use docdrive_core::protocol::{QueryFlags, QueryOptions};
use docdrive_core::{DriverError, Result};

use super::{selection, ReadMode, ReadPreference, TagSet};
use crate::cluster::{Cluster, Node};

fn no_eligible_node(mode: ReadMode, tag_sets: &[TagSet], known: usize) -> DriverError {
    if tag_sets.is_empty() {
        DriverError::NoEligibleNode(format!("{} read among {} known nodes", mode, known))
    } else {
        let sets: Vec<String> = tag_sets.iter().map(|set| format!("{{{}}}", set)).collect();
        DriverError::NoEligibleNode(format!(
            "{} read with tag sets [{}] among {} known nodes",
            mode,
            sets.join(", "),
            known
        ))
    }
}

fn slave_ok(options: QueryOptions) -> QueryOptions {
    options.with_flags(QueryFlags::SLAVE_OK)
}

fn selected(mode: ReadMode, node: Arc<dyn Node>) -> Arc<dyn Node> {
    tracing::trace!(
        mode = %mode,
        address = %node.info().address,
        role = %node.info().role,
        "selected node"
    );
    node
}

/// Reads only from the primary.
#[derive(Debug, Clone, Copy, Default)]
pub struct Primary;

impl Primary {
    /// Creates the primary read preference.
    pub fn new() -> Self {
        Self
    }
}

impl ReadPreference for Primary {
    fn mode(&self) -> ReadMode {
        ReadMode::Primary
    }

    fn select_node(&self, cluster: &dyn Cluster) -> Result<Arc<dyn Node>> {
        let nodes = cluster.nodes();
        selection::primary(&nodes)
            .map(|node| selected(self.mode(), node))
            .ok_or_else(|| no_eligible_node(self.mode(), &[], nodes.len()))
    }

    fn query_options(&self, options: QueryOptions) -> QueryOptions {
        options
    }
}

/// Reads from the primary, falling back to a matching secondary.
#[derive(Debug, Clone, Default)]
pub struct PrimaryPreferred {
    tag_sets: Vec<TagSet>,
}

impl PrimaryPreferred {
    /// Creates the preference with no tag constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the preference constrained by `tag_sets` for secondary fallback.
    pub fn with_tag_sets(tag_sets: Vec<TagSet>) -> Self {
        Self { tag_sets }
    }

    /// Returns the configured tag sets.
    pub fn tag_sets(&self) -> &[TagSet] {
        &self.tag_sets
    }
}

impl ReadPreference for PrimaryPreferred {
    fn mode(&self) -> ReadMode {
        ReadMode::PrimaryPreferred
    }

    fn select_node(&self, cluster: &dyn Cluster) -> Result<Arc<dyn Node>> {
        let nodes = cluster.nodes();
        selection::primary(&nodes)
            .or_else(|| {
                tracing::debug!("no primary available, trying secondaries");
                selection::secondary(&nodes, &self.tag_sets)
            })
            .map(|node| selected(self.mode(), node))
            .ok_or_else(|| no_eligible_node(self.mode(), &self.tag_sets, nodes.len()))
    }

    fn query_options(&self, options: QueryOptions) -> QueryOptions {
        slave_ok(options)
    }
}

/// Reads only from a matching secondary.
#[derive(Debug, Clone, Default)]
pub struct Secondary {
    tag_sets: Vec<TagSet>,
}

impl Secondary {
    /// Creates the preference with no tag constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the preference constrained by `tag_sets`.
    pub fn with_tag_sets(tag_sets: Vec<TagSet>) -> Self {
        Self { tag_sets }
    }

    /// Returns the configured tag sets.
    pub fn tag_sets(&self) -> &[TagSet] {
        &self.tag_sets
    }
}

impl ReadPreference for Secondary {
    fn mode(&self) -> ReadMode {
        ReadMode::Secondary
    }

    fn select_node(&self, cluster: &dyn Cluster) -> Result<Arc<dyn Node>> {
        let nodes = cluster.nodes();
        selection::secondary(&nodes, &self.tag_sets)
            .map(|node| selected(self.mode(), node))
            .ok_or_else(|| no_eligible_node(self.mode(), &self.tag_sets, nodes.len()))
    }

    fn query_options(&self, options: QueryOptions) -> QueryOptions {
        slave_ok(options)
    }
}

/// Reads from a matching secondary, falling back to the primary.
#[derive(Debug, Clone, Default)]
pub struct SecondaryPreferred {
    tag_sets: Vec<TagSet>,
}

impl SecondaryPreferred {
    /// Creates the preference with no tag constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the preference constrained by `tag_sets`.
    pub fn with_tag_sets(tag_sets: Vec<TagSet>) -> Self {
        Self { tag_sets }
    }

    /// Returns the configured tag sets.
    pub fn tag_sets(&self) -> &[TagSet] {
        &self.tag_sets
    }
}

impl ReadPreference for SecondaryPreferred {
    fn mode(&self) -> ReadMode {
        ReadMode::SecondaryPreferred
    }

    fn select_node(&self, cluster: &dyn Cluster) -> Result<Arc<dyn Node>> {
        let nodes = cluster.nodes();
        selection::secondary(&nodes, &self.tag_sets)
            .or_else(|| {
                tracing::debug!("no matching secondary available, falling back to primary");
                selection::primary(&nodes)
            })
            .map(|node| selected(self.mode(), node))
            .ok_or_else(|| no_eligible_node(self.mode(), &self.tag_sets, nodes.len()))
    }

    fn query_options(&self, options: QueryOptions) -> QueryOptions {
        slave_ok(options)
    }
}

/// Reads from the lowest-latency matching member, primary or secondary.
#[derive(Debug, Clone, Default)]
pub struct Nearest {
    tag_sets: Vec<TagSet>,
}

impl Nearest {
    /// Creates the preference with no tag constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the preference constrained by `tag_sets`.
    pub fn with_tag_sets(tag_sets: Vec<TagSet>) -> Self {
        Self { tag_sets }
    }

    /// Returns the configured tag sets.
    pub fn tag_sets(&self) -> &[TagSet] {
        &self.tag_sets
    }
}

impl ReadPreference for Nearest {
    fn mode(&self) -> ReadMode {
        ReadMode::Nearest
    }

    fn select_node(&self, cluster: &dyn Cluster) -> Result<Arc<dyn Node>> {
        let nodes = cluster.nodes();
        selection::any_member(&nodes, &self.tag_sets)
            .map(|node| selected(self.mode(), node))
            .ok_or_else(|| no_eligible_node(self.mode(), &self.tag_sets, nodes.len()))
    }

    fn query_options(&self, options: QueryOptions) -> QueryOptions {
        slave_ok(options)
    }
}
