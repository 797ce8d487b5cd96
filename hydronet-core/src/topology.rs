//! Adjacency between nodes and links.
//!
//! The topology is a multigraph: several links may join the same pair of
//! nodes. It only keeps identifiers and never checks them against the asset
//! table. A node is registered while at least one link touches it.

use fxhash::FxHashMap;
use indexmap::IndexSet;

use crate::core::{AssetId, Connections};

/// Bidirectional node/link adjacency index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Topology {
    /// Incident links of each node, in insertion order.
    node_links: FxHashMap<AssetId, IndexSet<AssetId>>,
    /// Endpoints of each link.
    link_nodes: FxHashMap<AssetId, Connections>,
}

impl Topology {
    /// Creates an empty topology.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a link between two nodes. Does nothing if the link is
    /// already registered.
    pub fn add_link(&mut self, link: AssetId, start: AssetId, end: AssetId) {
        if self.link_nodes.contains_key(&link) {
            return;
        }
        self.link_nodes.insert(link, [start, end]);
        self.node_links.entry(start).or_default().insert(link);
        self.node_links.entry(end).or_default().insert(link);
    }

    /// Unregisters a link, and any endpoint left without links.
    pub fn remove_link(&mut self, link: AssetId) {
        let Some(nodes) = self.link_nodes.remove(&link) else {
            return;
        };
        for node in nodes {
            if let Some(links) = self.node_links.get_mut(&node) {
                links.shift_remove(&link);
                if links.is_empty() {
                    self.node_links.remove(&node);
                }
            }
        }
    }

    /// Unregisters a node together with every incident link.
    pub fn remove_node(&mut self, node: AssetId) {
        let Some(links) = self.node_links.remove(&node) else {
            return;
        };
        for link in links {
            self.remove_link(link);
        }
    }

    /// The links incident to a node, in the order they were registered.
    pub fn links(&self, node: AssetId) -> impl Iterator<Item = AssetId> + '_ {
        self.node_links.get(&node).into_iter().flatten().copied()
    }

    /// Number of links incident to a node.
    #[must_use]
    pub fn degree(&self, node: AssetId) -> usize {
        self.node_links.get(&node).map_or(0, IndexSet::len)
    }

    /// The endpoints of a link, if it is registered.
    #[must_use]
    pub fn nodes(&self, link: AssetId) -> Option<Connections> {
        self.link_nodes.get(&link).copied()
    }

    /// Whether the link is registered.
    #[must_use]
    pub fn has_link(&self, link: AssetId) -> bool {
        self.link_nodes.contains_key(&link)
    }

    /// Whether the node is registered.
    #[must_use]
    pub fn has_node(&self, node: AssetId) -> bool {
        self.node_links.contains_key(&node)
    }

    /// Number of registered links.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.link_nodes.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use itertools::Itertools;
    use rstest::{fixture, rstest};

    const J1: AssetId = AssetId::new(1);
    const J2: AssetId = AssetId::new(2);
    const J3: AssetId = AssetId::new(3);
    const P1: AssetId = AssetId::new(4);
    const P2: AssetId = AssetId::new(5);
    const P3: AssetId = AssetId::new(6);

    #[fixture]
    fn topology() -> Topology {
        let mut t = Topology::new();
        t.add_link(P1, J1, J2);
        t.add_link(P2, J2, J3);
        t.add_link(P3, J1, J2);
        t
    }

    #[rstest]
    fn multigraph(topology: Topology) {
        assert_eq!(topology.links(J1).collect_vec(), [P1, P3]);
        assert_eq!(topology.links(J2).collect_vec(), [P1, P2, P3]);
        assert_eq!(topology.nodes(P3), Some([J1, J2]));
        assert_eq!(topology.degree(J3), 1);
        assert_eq!(topology.link_count(), 3);
    }

    #[rstest]
    fn duplicate_links_are_ignored(mut topology: Topology) {
        topology.add_link(P1, J2, J3);
        assert_eq!(topology.nodes(P1), Some([J1, J2]));
        assert_eq!(topology.degree(J3), 1);
    }

    #[rstest]
    fn removing_links(mut topology: Topology) {
        topology.remove_link(P2);
        assert!(!topology.has_link(P2));
        assert!(!topology.has_node(J3));
        assert_eq!(topology.links(J3).count(), 0);
        assert_eq!(topology.links(J2).collect_vec(), [P1, P3]);
    }

    #[rstest]
    fn removal_is_undone_by_insertion(mut topology: Topology) {
        let before = topology.clone();
        topology.remove_link(P1);
        topology.add_link(P1, J1, J2);
        assert_eq!(topology, before);
    }

    #[rstest]
    fn removing_nodes_drops_links(mut topology: Topology) {
        topology.remove_node(J2);
        assert!(!topology.has_node(J2));
        assert_eq!(topology.link_count(), 0);
        assert_eq!(topology.degree(J1), 0);
        assert_eq!(topology.nodes(P1), None);
        // Unknown ids are ignored
        topology.remove_node(AssetId::new(99));
        topology.remove_link(AssetId::new(99));
    }
}
