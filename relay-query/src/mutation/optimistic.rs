use apollo_compiler::name;
use serde_json::Value;

use super::into_root;
use crate::connection::DEFAULT_CONNECTION_INTERFACE;
use crate::error::QueryError;
use crate::node::FieldNode;
use crate::node::FragmentNode;
use crate::node::OperationKind;
use crate::node::QueryNode;
use crate::node::RootNode;
use crate::traversal::FlattenOptions;
use crate::traversal::flatten_query;
use crate::traversal::infer_fields_with;

/// Builds a fragment on the payload type selecting exactly the fields of an optimistic
/// `response`, see [`infer_fields_from_data`](crate::infer_fields_from_data).
pub fn fragment_for_optimistic_update(response: &Value, fat_query: &FragmentNode) -> FragmentNode {
    FragmentNode::new(
        fat_query.type_condition().clone(),
        infer_fields_with(&DEFAULT_CONNECTION_INTERFACE, response),
    )
}

/// Builds the `OptimisticQuery` under which an optimistic `response` is written to the store:
/// the root field of `mutation`, with its arguments, selecting `clientMutationId` and the
/// fields of `response`.
pub fn query_for_optimistic_update(
    response: &Value,
    fat_query: &FragmentNode,
    mutation: &RootNode,
) -> Result<RootNode, QueryError> {
    let children: Vec<QueryNode> = vec![
        FieldNode::leaf(DEFAULT_CONNECTION_INTERFACE.client_mutation_id.clone()).into(),
        fragment_for_optimistic_update(response, fat_query).into(),
    ];
    let query = RootNode::new(
        OperationKind::Mutation,
        mutation.field_name().clone(),
        fat_query.type_condition().clone(),
    )
    .with_name(Some(name!("OptimisticQuery")))
    .with_arguments(mutation.arguments().to_vec())
    .with_children(children);
    into_root(flatten_query(&query.into(), FlattenOptions::default()))
}
