use crate::node::QueryNode;

/// Recursively keeps the nodes accepted by `predicate`, starting with `node` itself.
///
/// A rejected node is removed along with its whole subtree. A composite node whose children were
/// all rejected collapses, unless it had no children to begin with.
pub fn filter_query(
    node: &QueryNode,
    predicate: &impl Fn(&QueryNode) -> bool,
) -> Option<QueryNode> {
    if !predicate(node) {
        return None;
    }
    if node.children().is_empty() {
        return Some(node.clone());
    }
    let children = node
        .children()
        .iter()
        .filter_map(|child| filter_query(child, predicate))
        .collect();
    node.clone_with_children(children)
}
