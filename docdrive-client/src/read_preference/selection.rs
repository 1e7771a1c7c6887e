//! Node selection helpers shared by the read preference modes.
//!
//! All helpers work on a single snapshot of the cluster's nodes. Ties on
//! latency go to the node listed first.

use std::sync::Arc;

use crate::cluster::{Node, NodeInfo};

use super::TagSet;

/// Returns the first primary in the snapshot.
pub(crate) fn primary(nodes: &[Arc<dyn Node>]) -> Option<Arc<dyn Node>> {
    nodes.iter().find(|node| node.info().is_primary()).cloned()
}

/// Returns the nearest secondary matching the first satisfiable tag set.
pub(crate) fn secondary(nodes: &[Arc<dyn Node>], tag_sets: &[TagSet]) -> Option<Arc<dyn Node>> {
    nearest(nodes, tag_sets, NodeInfo::is_secondary)
}

/// Returns the nearest data-bearing node matching the first satisfiable tag set.
pub(crate) fn any_member(nodes: &[Arc<dyn Node>], tag_sets: &[TagSet]) -> Option<Arc<dyn Node>> {
    nearest(nodes, tag_sets, |info| info.is_primary() || info.is_secondary())
}

fn nearest<F>(nodes: &[Arc<dyn Node>], tag_sets: &[TagSet], eligible: F) -> Option<Arc<dyn Node>>
where
    F: Fn(&NodeInfo) -> bool,
{
    let nearest_matching = |tag_set: Option<&TagSet>| {
        nodes
            .iter()
            .filter(|node| eligible(node.info()))
            .filter(|node| tag_set.map_or(true, |set| set.matches(node.info())))
            .min_by_key(|node| node.info().latency)
            .cloned()
    };

    if tag_sets.is_empty() {
        return nearest_matching(None);
    }
    tag_sets
        .iter()
        .find_map(|tag_set| nearest_matching(Some(tag_set)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::testing::{addr, node, node_with};
    use crate::cluster::NodeRole;

    #[test]
    fn test_primary_found() {
        let nodes = vec![node(1, NodeRole::Secondary), node(2, NodeRole::Primary)];
        assert_eq!(primary(&nodes).unwrap().info().address, addr(2));
    }

    #[test]
    fn test_primary_missing() {
        let nodes = vec![node(1, NodeRole::Secondary), node(2, NodeRole::Arbiter)];
        assert!(primary(&nodes).is_none());
    }

    #[test]
    fn test_secondary_prefers_lowest_latency() {
        let nodes = vec![
            node_with(1, NodeRole::Secondary, 20, &[]),
            node_with(2, NodeRole::Secondary, 5, &[]),
            node_with(3, NodeRole::Primary, 1, &[]),
        ];
        assert_eq!(secondary(&nodes, &[]).unwrap().info().address, addr(2));
    }

    #[test]
    fn test_latency_tie_goes_to_first_listed() {
        let nodes = vec![
            node_with(1, NodeRole::Secondary, 5, &[]),
            node_with(2, NodeRole::Secondary, 5, &[]),
        ];
        assert_eq!(secondary(&nodes, &[]).unwrap().info().address, addr(1));
    }

    #[test]
    fn test_tag_sets_tried_in_order() {
        let nodes = vec![
            node_with(1, NodeRole::Secondary, 1, &[("dc", "west")]),
            node_with(2, NodeRole::Secondary, 9, &[("dc", "east")]),
        ];
        let sets = vec![
            TagSet::new().with("dc", "north"),
            TagSet::new().with("dc", "east"),
            TagSet::new(),
        ];
        assert_eq!(secondary(&nodes, &sets).unwrap().info().address, addr(2));
    }

    #[test]
    fn test_no_tag_set_satisfiable() {
        let nodes = vec![node_with(1, NodeRole::Secondary, 1, &[("dc", "west")])];
        let sets = vec![TagSet::new().with("dc", "east")];
        assert!(secondary(&nodes, &sets).is_none());
    }

    #[test]
    fn test_arbiters_and_unknown_never_selected() {
        let nodes = vec![
            node_with(1, NodeRole::Arbiter, 0, &[]),
            node_with(2, NodeRole::Unknown, 0, &[]),
        ];
        assert!(secondary(&nodes, &[]).is_none());
        assert!(any_member(&nodes, &[]).is_none());
    }

    #[test]
    fn test_any_member_includes_primary() {
        let nodes = vec![
            node_with(1, NodeRole::Secondary, 10, &[]),
            node_with(2, NodeRole::Primary, 2, &[]),
        ];
        assert_eq!(any_member(&nodes, &[]).unwrap().info().address, addr(2));
    }
}
