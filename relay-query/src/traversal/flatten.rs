use apollo_compiler::Name;

use super::SelectionMap;
use crate::node::QueryNode;
use crate::utils::logging::snapshot;

/// Options of [`flatten_query`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlattenOptions {
    /// Inline every fragment into its parent, whatever its type condition.
    pub remove_fragments: bool,
    /// Keep composite fields whose selections all disappeared, as placeholders meaning "every
    /// sub-field". Roots and fragments are never kept empty.
    pub preserve_empty_nodes: bool,
}

impl FlattenOptions {
    pub fn remove_fragments() -> Self {
        Self {
            remove_fragments: true,
            preserve_empty_nodes: false,
        }
    }

    pub fn preserve_empty_nodes(self) -> Self {
        Self {
            preserve_empty_nodes: true,
            ..self
        }
    }
}

/// Normalizes a query tree into one selection per distinct identity.
///
/// Fragments whose type condition is the type of the enclosing selection (or every fragment
/// with [`FlattenOptions::remove_fragments`]) are inlined into their parent. Other fragments are
/// kept, one per type condition. Fields sharing a storage key are merged, recursively, in
/// first-seen order.
///
/// Returns `None` when nothing remains: a composite selection whose children all vanished is
/// dropped, and the emptiness propagates up to `node` itself.
pub fn flatten_query(node: &QueryNode, options: FlattenOptions) -> Option<QueryNode> {
    let flattened = flatten_node(node, node.children().to_vec(), options);
    snapshot!(
        "FlattenedQuery",
        flattened
            .as_ref()
            .map_or_else(String::new, ToString::to_string),
        "flattened query"
    );
    flattened
}

fn flatten_node(
    node: &QueryNode,
    children: Vec<QueryNode>,
    options: FlattenOptions,
) -> Option<QueryNode> {
    if !node.can_have_subselections() {
        return Some(node.clone());
    }
    let mut selections = SelectionMap::new();
    collect_selections(&mut selections, node.type_name(), children, options);
    let children = selections
        .into_nodes_with(|child, grandchildren| flatten_node(child, grandchildren, options));
    node.clone_with_children_preserving(children, options.preserve_empty_nodes)
}

fn collect_selections(
    selections: &mut SelectionMap,
    parent_type: &Name,
    children: impl IntoIterator<Item = QueryNode>,
    options: FlattenOptions,
) {
    for child in children {
        match &child {
            QueryNode::Fragment(fragment)
                if options.remove_fragments || fragment.type_condition() == parent_type =>
            {
                collect_selections(
                    selections,
                    parent_type,
                    fragment.children().iter().cloned(),
                    options,
                );
            }
            _ => selections.insert(child),
        }
    }
}
