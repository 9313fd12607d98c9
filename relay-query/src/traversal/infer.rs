use std::sync::LazyLock;

use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use regex::Regex;
use serde_json::Value;

use super::merge_nodes;
use crate::connection::ConnectionInterface;
use crate::connection::DEFAULT_CONNECTION_INTERFACE;
use crate::node::ANY_TYPE;
use crate::node::ArgumentList;
use crate::node::FieldMetadata;
use crate::node::FieldNode;
use crate::node::QueryNode;
use crate::node::TYPENAME_FIELD;

/// One call of a call-encoded response key, such as `first(10)` in `friends.first(10)`.
static CALL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)(?:\((.+?)\))?$").expect("Invalid regex pattern"));

/// Infers the selections that would have produced `data`, a response object.
///
/// Every key becomes a field: objects become composite fields, arrays plural fields whose
/// children are the union of the shapes of their object elements, and anything else a leaf.
/// Keys may encode arguments, e.g. `friends.first(10).orderby(name)`. Metadata keys (starting
/// with `__`, except `__typename`) are skipped. `node` objects also select `id` and `edges`
/// objects also select `cursor`, so inferred connections can be merged into the store.
///
/// Returns no fields when `data` is not an object.
pub fn infer_fields_from_data(data: &Value) -> Vec<QueryNode> {
    infer_fields_with(&DEFAULT_CONNECTION_INTERFACE, data)
}

pub(crate) fn infer_fields_with(interface: &ConnectionInterface, data: &Value) -> Vec<QueryNode> {
    let Value::Object(object) = data else {
        return Vec::new();
    };
    merge_nodes(
        object
            .iter()
            .filter(|(key, _)| !is_metadata_key(key))
            .filter_map(|(key, value)| infer_field(interface, key, value)),
    )
}

fn is_metadata_key(key: &str) -> bool {
    key.starts_with("__") && key != TYPENAME_FIELD.as_str()
}

fn infer_field(interface: &ConnectionInterface, key: &str, value: &Value) -> Option<QueryNode> {
    let Some((name, arguments)) = parse_response_key(key) else {
        tracing::warn!(key, "skipping response key that does not encode a field");
        return None;
    };
    let (metadata, mut children) = match value {
        Value::Array(items) if items.iter().any(Value::is_object) => (
            FieldMetadata::COMPOSITE.plural(),
            items
                .iter()
                .flat_map(|item| infer_fields_with(interface, item))
                .collect(),
        ),
        Value::Array(_) => (FieldMetadata::LEAF.plural(), Vec::new()),
        Value::Object(_) => (FieldMetadata::COMPOSITE, infer_fields_with(interface, value)),
        _ => (FieldMetadata::LEAF, Vec::new()),
    };
    if !metadata.can_have_subselections {
        return Some(
            FieldNode::leaf(name)
                .with_arguments(arguments)
                .with_metadata(metadata)
                .into(),
        );
    }
    if name == interface.node_field {
        children.push(FieldNode::leaf(interface.id_field.clone()).into());
    } else if name == interface.edges_field {
        children.push(FieldNode::leaf(interface.cursor_field.clone()).into());
    }
    Some(
        FieldNode::composite(name, ANY_TYPE, merge_nodes(children))
            .with_arguments(arguments)
            .with_metadata(metadata)
            .into(),
    )
}

/// Splits `friends.first(10).orderby(name)` into `friends` and the arguments `first: "10"` and
/// `orderby: "name"`. Comma-separated call values become lists.
fn parse_response_key(key: &str) -> Option<(Name, ArgumentList)> {
    let mut parts = key.split('.');
    let name = Name::new(parts.next()?).ok()?;
    let arguments = parts
        .map(|call| {
            let captures = CALL_PATTERN.captures(call)?;
            let name = Name::new(captures.get(1)?.as_str()).ok()?;
            let value = match captures.get(2).map(|value| value.as_str()) {
                None => ast::Value::Null,
                Some(value) if value.contains(',') => ast::Value::List(
                    value
                        .split(',')
                        .map(|item| Node::new(ast::Value::String(item.to_owned())))
                        .collect(),
                ),
                Some(value) => ast::Value::String(value.to_owned()),
            };
            Some(Node::new(ast::Argument {
                name,
                value: Node::new(value),
            }))
        })
        .collect::<Option<_>>()?;
    Some((name, arguments))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn printed(fields: &[QueryNode]) -> String {
        fields
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn infers_nested_objects() {
        let fields = infer_fields_from_data(&json!({
            "__dataID__": "123",
            "__typename": "Feedback",
            "feedback": {
                "id": "123",
                "doesViewerLike": true,
                "likers": { "count": 1 },
            },
        }));
        insta::assert_snapshot!(printed(&fields), @r###"
        __typename
        feedback {
          id
          doesViewerLike
          likers {
            count
          }
        }
        "###);
    }

    #[test]
    fn infers_connections_and_calls() {
        let fields = infer_fields_from_data(&json!({
            "friends.first(10).orderby(name,age)": {
                "edges": [
                    { "node": { "name": "Alice" } },
                    { "node": { "id": "2", "birthdate": "01-01" }, "cursor": "c2" },
                    null,
                ],
            },
        }));
        insta::assert_snapshot!(printed(&fields), @r###"
        friends(first: "10", orderby: ["name", "age"]) {
          edges {
            node {
              name
              id
              birthdate
            }
            cursor
          }
        }
        "###);
        let friends = fields[0].as_field().unwrap();
        assert!(friends.field_by_storage_key("edges").unwrap().is_plural());
    }

    #[test]
    fn infers_scalar_lists_as_leaves() {
        let fields = infer_fields_from_data(&json!({ "tags": ["a", "b"], "nothing": [] }));
        let metadata: Vec<_> = fields
            .iter()
            .map(|field| field.as_field().unwrap().metadata())
            .collect();
        assert_eq!(metadata, vec![FieldMetadata::LEAF.plural(); 2]);
    }

    #[test]
    fn skips_keys_that_are_not_fields() {
        let fields = infer_fields_from_data(&json!({ "not a field": 1, "count": 2 }));
        assert_eq!(printed(&fields), "count");
        assert!(infer_fields_from_data(&json!([1, 2])).is_empty());
    }
}
