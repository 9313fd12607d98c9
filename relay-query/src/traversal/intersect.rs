use std::sync::Arc;

use super::FlattenOptions;
use super::flatten_query;
use crate::connection::ConnectionInterface;
use crate::connection::DEFAULT_CONNECTION_INTERFACE;
use crate::node::FieldNode;
use crate::node::QueryNode;

/// Computes the structural intersection of `subject` with `pattern`: the part of `subject`
/// whose fields also appear, by schema name, at the same position in `pattern`.
///
/// - Leaf fields of `subject` that reach this point are kept as they are.
/// - A `pattern` field without children stands for "every sub-field", so the matching `subject`
///   subtree is kept whole. The exception is a connection accepted by
///   `filter_unterminated_range`: its range fields (`edges`, `pageInfo`) are stripped, keeping
///   only the connection metadata.
/// - Fragments of `subject` are traversed against the same `pattern` node.
/// - A `pattern` field with arguments only matches `subject` fields with the same storage key.
///
/// `pattern` is flattened (fragments removed, empty fields preserved) before traversal. Returns
/// `None` when nothing of `subject` survives.
pub fn intersect_query(
    subject: &QueryNode,
    pattern: &QueryNode,
    filter_unterminated_range: impl Fn(&FieldNode) -> bool,
) -> Option<QueryNode> {
    intersect_query_with(
        &DEFAULT_CONNECTION_INTERFACE,
        subject,
        pattern,
        &filter_unterminated_range,
    )
}

pub(crate) fn intersect_query_with(
    interface: &ConnectionInterface,
    subject: &QueryNode,
    pattern: &QueryNode,
    filter_unterminated_range: &dyn Fn(&FieldNode) -> bool,
) -> Option<QueryNode> {
    let options = FlattenOptions::remove_fragments().preserve_empty_nodes();
    let pattern = flatten_query(pattern, options).unwrap_or_else(|| pattern.clone());
    Intersector {
        interface,
        filter_unterminated_range,
    }
    .traverse(subject, &pattern)
}

struct Intersector<'a> {
    interface: &'a ConnectionInterface,
    filter_unterminated_range: &'a dyn Fn(&FieldNode) -> bool,
}

impl Intersector<'_> {
    fn traverse(&self, subject: &QueryNode, pattern: &QueryNode) -> Option<QueryNode> {
        if !subject.can_have_subselections() {
            return Some(subject.clone());
        }
        if pattern.children().is_empty() {
            return match subject {
                QueryNode::Field(field)
                    if field.is_connection() && (self.filter_unterminated_range)(field) =>
                {
                    self.without_range_fields(subject)
                }
                _ => Some(subject.clone()),
            };
        }
        let children = subject
            .children()
            .iter()
            .filter_map(|child| match child {
                QueryNode::Fragment(_) => self.traverse(child, pattern),
                QueryNode::Field(field) => {
                    let pattern_child = matching_field(pattern, field)?;
                    self.traverse(child, pattern_child)
                }
                QueryNode::Root(_) => None,
            })
            .collect();
        subject.clone_with_children(children)
    }

    fn without_range_fields(&self, node: &QueryNode) -> Option<QueryNode> {
        let children = node
            .children()
            .iter()
            .filter_map(|child| match child {
                QueryNode::Field(field) if self.is_range_field(field) => None,
                QueryNode::Fragment(_) => self.without_range_fields(child),
                _ => Some(child.clone()),
            })
            .collect();
        node.clone_with_children(children)
    }

    fn is_range_field(&self, field: &Arc<FieldNode>) -> bool {
        field.name() == &self.interface.edges_field
            || field.name() == &self.interface.page_info_field
    }
}

fn matching_field<'p>(pattern: &'p QueryNode, subject: &FieldNode) -> Option<&'p QueryNode> {
    pattern.children().iter().find(|child| match child {
        QueryNode::Field(candidate) => {
            candidate.name() == subject.name()
                && (candidate.arguments().is_empty()
                    || candidate.storage_key() == subject.storage_key())
        }
        QueryNode::Root(_) | QueryNode::Fragment(_) => false,
    })
}
