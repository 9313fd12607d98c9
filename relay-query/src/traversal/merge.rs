//! Provides the accumulator that merges sibling selections by selection key.
use apollo_compiler::collections::IndexMap;
use indexmap::map::Entry;

use crate::node::QueryNode;
use crate::node::SelectionKey;

/// Sibling selections merged by selection key, in first-seen order.
///
/// Each entry keeps the first node inserted under its key and the concatenation of the children
/// of every node inserted under that key. Children are not merged with each other until the map
/// is turned back into nodes, so callers decide how (and whether) to recurse.
#[derive(Debug, Default)]
pub(crate) struct SelectionMap {
    selections: IndexMap<SelectionKey, MergedSelection>,
}

#[derive(Debug)]
struct MergedSelection {
    node: QueryNode,
    children: Vec<QueryNode>,
}

impl SelectionMap {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, node: QueryNode) {
        match self.selections.entry(node.key()) {
            Entry::Occupied(mut existing) => {
                // Leaves have nothing to merge: the first one wins.
                if node.can_have_subselections() {
                    existing
                        .get_mut()
                        .children
                        .extend(node.children().iter().cloned());
                }
            }
            Entry::Vacant(vacant) => {
                let children = node.children().to_vec();
                vacant.insert(MergedSelection { node, children });
            }
        }
    }

    pub(crate) fn extend(&mut self, nodes: impl IntoIterator<Item = QueryNode>) {
        for node in nodes {
            self.insert(node);
        }
    }

    /// Rebuilds one node per selection key. `rebuild` receives the first node seen for the key
    /// and the accumulated children of all nodes with that key; returning `None` drops the
    /// selection.
    pub(crate) fn into_nodes_with(
        self,
        mut rebuild: impl FnMut(&QueryNode, Vec<QueryNode>) -> Option<QueryNode>,
    ) -> Vec<QueryNode> {
        self.selections
            .into_values()
            .filter_map(|merged| rebuild(&merged.node, merged.children))
            .collect()
    }
}

/// Merges sibling selections: nodes with equal selection keys (storage key for fields, type
/// condition for fragments) become one node whose children are the recursively merged union.
///
/// Order is first-seen: a selection keeps the position of its first occurrence and new
/// selections are appended. Composite fields without children are kept; roots and fragments
/// without children are dropped.
pub fn merge_nodes(nodes: impl IntoIterator<Item = QueryNode>) -> Vec<QueryNode> {
    let mut selections = SelectionMap::new();
    selections.extend(nodes);
    selections.into_nodes_with(|node, children| {
        node.clone_with_children_preserving(merge_nodes(children), true)
    })
}
