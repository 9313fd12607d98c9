//! The record of which selections have already been fetched for which entity.
use indexmap::IndexMap;

use crate::node::QueryNode;
use crate::traversal::merge_nodes;

/// Answers "which selections have already been fetched for entity `id`".
///
/// Derivation only reads from the tracker. Implementations must be side-effect free: calling
/// [`QueryTracker::tracked_children_for_id`] twice with the same ID returns the same selections.
pub trait QueryTracker {
    /// The selections fetched so far on the entity with the given ID, or nothing if the entity
    /// was never fetched.
    fn tracked_children_for_id(&self, id: &str) -> Vec<QueryNode>;
}

/// A [`QueryTracker`] backed by a map from entity ID to the nodes fetched for it.
#[derive(Debug, Clone, Default)]
pub struct InMemoryQueryTracker {
    tracked_nodes: IndexMap<String, Vec<QueryNode>>,
}

impl InMemoryQueryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `node` was fetched for the entity `id`. Only the children of `node` are
    /// reported back, so a field, fragment or root can be tracked alike.
    pub fn track_node_for_id(&mut self, node: QueryNode, id: impl Into<String>) {
        self.tracked_nodes.entry(id.into()).or_default().push(node);
    }

    /// Forgets everything fetched for the entity `id`, e.g. after it was deleted.
    pub fn untrack_nodes_for_id(&mut self, id: &str) {
        self.tracked_nodes.shift_remove(id);
    }

    pub fn is_tracked(&self, id: &str) -> bool {
        self.tracked_nodes.contains_key(id)
    }
}

impl QueryTracker for InMemoryQueryTracker {
    fn tracked_children_for_id(&self, id: &str) -> Vec<QueryNode> {
        let Some(nodes) = self.tracked_nodes.get(id) else {
            return Vec::new();
        };
        merge_nodes(nodes.iter().flat_map(|node| node.children().iter().cloned()))
    }
}
