//! Classification of asset ids into nodes and links.

use std::collections::BTreeSet;

use crate::core::AssetId;

/// The sets of node ids and link ids present in a model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetIndex {
    nodes: BTreeSet<AssetId>,
    links: BTreeSet<AssetId>,
}

impl AssetIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies `id` as a node. Returns `false` for the reserved id.
    pub fn add_node(&mut self, id: AssetId) -> bool {
        if id.is_none() {
            return false;
        }
        self.links.remove(&id);
        self.nodes.insert(id);
        true
    }

    /// Classifies `id` as a link. Returns `false` for the reserved id.
    pub fn add_link(&mut self, id: AssetId) -> bool {
        if id.is_none() {
            return false;
        }
        self.nodes.remove(&id);
        self.links.insert(id);
        true
    }

    /// Forgets `id`, whichever its class.
    pub fn remove(&mut self, id: AssetId) {
        self.nodes.remove(&id);
        self.links.remove(&id);
    }

    /// Whether `id` is a node.
    #[must_use]
    pub fn has_node(&self, id: AssetId) -> bool {
        self.nodes.contains(&id)
    }

    /// Whether `id` is a link.
    #[must_use]
    pub fn has_link(&self, id: AssetId) -> bool {
        self.links.contains(&id)
    }

    /// Node ids, ascending.
    pub fn node_ids(&self) -> impl Iterator<Item = AssetId> + '_ {
        self.nodes.iter().copied()
    }

    /// Link ids, ascending.
    pub fn link_ids(&self) -> impl Iterator<Item = AssetId> + '_ {
        self.links.iter().copied()
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of links.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.links.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use itertools::Itertools;

    #[test]
    fn reclassification() {
        let mut index = AssetIndex::new();
        assert!(index.add_node(AssetId::new(1)));
        assert!(index.add_link(AssetId::new(2)));
        assert!(index.add_link(AssetId::new(1)));
        assert!(!index.has_node(AssetId::new(1)));
        assert_eq!(index.link_ids().collect_vec(), [AssetId::new(1), AssetId::new(2)]);
        assert_eq!(index.node_count(), 0);

        index.remove(AssetId::new(2));
        assert_eq!(index.link_count(), 1);
    }

    #[test]
    fn reserved_id_is_rejected() {
        let mut index = AssetIndex::new();
        assert!(!index.add_node(AssetId::NONE));
        assert!(!index.add_link(AssetId::NONE));
        assert_eq!(index, AssetIndex::new());
    }
}
