//! Derives the query sent along with a mutation: the smallest selection that refetches every
//! field the mutation may have changed and the client has already fetched.
//!
//! The inputs are:
//! - a fat query, a fragment on the mutation payload type selecting everything the mutation
//!   could possibly change;
//! - a [`QueryTracker`] knowing which fields the client fetched for which entity;
//! - the [`MutationConfig`]s describing what the mutation does.
//!
//! Each config contributes a fragment on the payload type. The fragments are merged under the
//! mutation root field, after the `clientMutationId` echo, and flattened.
use std::slice;
use std::sync::Arc;

use apollo_compiler::Name;
use indexmap::IndexMap;
use indexmap::IndexSet;

use crate::connection::ConnectionInterface;
use crate::connection::DEFAULT_CONNECTION_INTERFACE;
use crate::error::QueryError;
use crate::node::ANY_TYPE;
use crate::node::FieldNode;
use crate::node::FragmentNode;
use crate::node::OperationKind;
use crate::node::QueryNode;
use crate::node::RootNode;
use crate::node::StorageKey;
use crate::node::TYPENAME_FIELD;
use crate::tracker::QueryTracker;
use crate::traversal::FlattenOptions;
use crate::traversal::flatten_query;
use crate::traversal::intersect_query_with;
use crate::traversal::merge_nodes;
use crate::utils::logging::snapshot;

mod config;
mod optimistic;
mod range_behavior;

pub use config::DataIds;
pub use config::DeletedIdField;
pub use config::EdgeDeletion;
pub use config::EdgeInsertion;
pub use config::MutationConfig;
pub use config::MutationConfigKind;
pub use optimistic::fragment_for_optimistic_update;
pub use optimistic::query_for_optimistic_update;
pub use range_behavior::RangeBehavior;
pub use range_behavior::RangeBehaviors;

/// Builds mutation queries from a fat query and the tracked state of the client.
#[derive(Clone, Copy)]
pub struct MutationQuery<'a> {
    fat_query: &'a FragmentNode,
    tracker: &'a dyn QueryTracker,
    interface: &'a ConnectionInterface,
}

impl<'a> MutationQuery<'a> {
    pub fn new(fat_query: &'a FragmentNode, tracker: &'a dyn QueryTracker) -> Self {
        Self {
            fat_query,
            tracker,
            interface: &DEFAULT_CONNECTION_INTERFACE,
        }
    }

    pub fn with_connection_interface(mut self, interface: &'a ConnectionInterface) -> Self {
        self.interface = interface;
        self
    }

    pub fn fat_query(&self) -> &'a FragmentNode {
        self.fat_query
    }

    /// Builds the fragment refetching changed fields of existing entities.
    ///
    /// For every payload field, the selections tracked for its entity (or, for a plural field,
    /// the union over all its entities) are intersected with the field's fat query. The
    /// field is selected, with `id`, whenever the client has fetched anything for its entities.
    ///
    /// # Errors
    /// - [`QueryError::InvalidField`] if a field is not on the fat query.
    /// - [`QueryError::ShapeMismatch`] if a plural field is given a single ID, or a singular
    ///   field a list.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn fragment_for_fields(
        &self,
        field_ids: &IndexMap<Name, DataIds>,
    ) -> Result<FragmentNode, QueryError> {
        let mut mutated_fields = Vec::new();
        for (field_name, ids) in field_ids {
            let fat_field = self.fat_field(slice::from_ref(field_name))?;
            match ids {
                DataIds::Single(_) if fat_field.is_plural() => {
                    return Err(QueryError::ShapeMismatch {
                        field_name: field_name.to_string(),
                        expected: "a list of IDs",
                        found: "a single ID",
                    });
                }
                DataIds::Plural(_) if !fat_field.is_plural() => {
                    return Err(QueryError::ShapeMismatch {
                        field_name: field_name.to_string(),
                        expected: "a single ID",
                        found: "a list of IDs",
                    });
                }
                DataIds::Single(_) | DataIds::Plural(_) => {}
            }
            let tracked_children = merge_nodes(
                ids.as_slice()
                    .iter()
                    .flat_map(|id| self.tracker.tracked_children_for_id(id)),
            );
            let mutated_field = self.tracked_field(fat_field, tracked_children, |tracked, fat| {
                intersect_query_with(self.interface, tracked, fat, &|_| false)
            });
            mutated_fields.extend(mutated_field);
        }
        let fragment = FragmentNode::new(self.fat_query.type_condition().clone(), mutated_fields);
        snapshot!("FieldsChange", fragment, "built fragment for changed fields");
        Ok(fragment)
    }

    /// Builds the fragment refetching the parent of a connection an edge was removed from.
    ///
    /// The tracked selections of the parent are intersected with its fat query, minus the
    /// connection itself: the deleted edge is removed from the store by ID, not refetched.
    ///
    /// # Errors
    /// Returns [`QueryError::InvalidField`] if the parent path or the connection is not on
    /// the fat query.
    #[tracing::instrument(level = "trace", skip_all, fields(parent_id = %deletion.parent_id))]
    pub fn fragment_for_edge_deletion(
        &self,
        deletion: &EdgeDeletion,
    ) -> Result<FragmentNode, QueryError> {
        let fat_parent = self.fat_field(&deletion.parent_path)?;
        self.check_connection(fat_parent, &deletion.connection_name)?;
        let tracked_children = self.tracker.tracked_children_for_id(&deletion.parent_id);
        let mutated_parent = self.tracked_field(fat_parent, tracked_children, |tracked, fat| {
            let intersection = intersect_query_with(self.interface, tracked, fat, &|_| false)?;
            without_field(&intersection, &deletion.connection_name)
        });
        let mutated_path = match mutated_parent {
            Some(parent) => self.with_ancestors(&deletion.parent_path, parent)?,
            None => None,
        };
        let fragment = FragmentNode::new(
            self.fat_query.type_condition().clone(),
            mutated_path.into_iter().collect(),
        );
        snapshot!("EdgeDeletion", fragment, "built fragment for edge deletion");
        Ok(fragment)
    }

    /// Builds the fragment fetching an edge added to a connection.
    ///
    /// Every tracked instance of the connection on the parent is looked up in the range
    /// behaviors by call-filter signature. The edges of connections that can be updated in
    /// place are merged into the selection of the new edge. With a parent name, the parent is
    /// refetched too: in-place connections only for their metadata, the others whole.
    ///
    /// # Errors
    /// Returns [`QueryError::InvalidField`] if the parent or the connection is not on the fat
    /// query.
    #[tracing::instrument(level = "trace", skip_all, fields(parent_id = %insertion.parent_id))]
    pub fn fragment_for_edge_insertion(
        &self,
        insertion: &EdgeInsertion,
    ) -> Result<FragmentNode, QueryError> {
        let tracked_children = self.tracker.tracked_children_for_id(&insertion.parent_id);
        let mut mutated_fields = Vec::new();
        let mut keys_without_behavior = IndexSet::<StorageKey>::new();
        let mut tracked_edges = Vec::new();
        let tracked_connections = tracked_children
            .iter()
            .flat_map(|child| find_descendant_fields(child, &insertion.connection_name));
        for connection in tracked_connections {
            let signature = self.interface.call_filter_signature(&connection);
            if insertion.range_behaviors.updates_in_place(&signature) {
                let connection = QueryNode::Field(connection);
                tracked_edges.extend(find_descendant_fields(
                    &connection,
                    &self.interface.edges_field,
                ));
                continue;
            }
            if insertion.range_behaviors.get(&signature) != Some(RangeBehavior::Refetch) {
                tracing::warn!(
                    connection = %connection.storage_key(),
                    parent_id = %insertion.parent_id,
                    edge = %insertion.edge_name,
                    "connection does not match any range behavior and will be refetched whole; \
                     configure a range behavior, or `refetch` to silence this warning",
                );
            }
            keys_without_behavior.insert(connection.storage_key());
        }
        if !tracked_edges.is_empty() {
            mutated_fields.push(self.edge_field(insertion, &tracked_edges)?);
        }
        if let Some(parent_name) = &insertion.parent_name {
            let fat_parent = self.fat_field(slice::from_ref(parent_name))?;
            self.check_connection(fat_parent, &insertion.connection_name)?;
            let filter_unterminated_range = |connection: &FieldNode| {
                connection.name() == &insertion.connection_name
                    && !keys_without_behavior.contains(&connection.storage_key())
            };
            mutated_fields.extend(self.tracked_field(
                fat_parent,
                tracked_children,
                |tracked, fat| {
                    intersect_query_with(self.interface, tracked, fat, &filter_unterminated_range)
                },
            ));
        }
        let fragment = FragmentNode::new(self.fat_query.type_condition().clone(), mutated_fields);
        snapshot!("EdgeInsertion", fragment, "built fragment for edge insertion");
        Ok(fragment)
    }

    /// Builds the mutation query for `configs`.
    ///
    /// The result is a mutation named `mutation_name` selecting the root field of `mutation`,
    /// with its arguments, and below it `clientMutationId` followed by the selections of every
    /// config, merged and flattened.
    ///
    /// # Errors
    /// Fails on the first config that fails, see the `fragment_for_*` methods. Also fails
    /// with [`QueryError::InvalidName`] if `mutation_name` is not a GraphQL name.
    #[tracing::instrument(level = "trace", skip_all, fields(mutation_name = %mutation_name))]
    pub fn build_query(
        &self,
        configs: &[MutationConfig],
        mutation_name: &str,
        mutation: &RootNode,
    ) -> Result<RootNode, QueryError> {
        let operation_name = Name::new(mutation_name)?;
        let mut children: Vec<QueryNode> =
            vec![FieldNode::leaf(self.interface.client_mutation_id.clone()).into()];
        for config in configs {
            tracing::debug!(kind = %config.kind(), mutation_name, "building config selections");
            match config {
                MutationConfig::FieldsChange { field_ids } => {
                    children.push(self.fragment_for_fields(field_ids)?.into());
                }
                MutationConfig::NodeDelete {
                    deletion,
                    deleted_id_field_name,
                } => {
                    children.push(FieldNode::leaf(deleted_id_field_name.clone()).into());
                    children.push(self.fragment_for_edge_deletion(deletion)?.into());
                }
                MutationConfig::RangeDelete {
                    deletion,
                    deleted_id_field_name,
                } => {
                    children.push(self.deleted_id_field(deleted_id_field_name)?);
                    children.push(self.fragment_for_edge_deletion(deletion)?.into());
                }
                MutationConfig::RangeAdd(insertion) => {
                    children.push(self.fragment_for_edge_insertion(insertion)?.into());
                }
                MutationConfig::RequiredChildren {
                    children: required_children,
                } => {
                    children.extend(required_children.iter().cloned().map(QueryNode::from));
                }
            }
        }
        let query = RootNode::new(
            OperationKind::Mutation,
            mutation.field_name().clone(),
            self.fat_query.type_condition().clone(),
        )
        .with_name(Some(operation_name))
        .with_arguments(mutation.arguments().to_vec())
        .with_children(children);
        let query = into_root(flatten_query(
            &query.into(),
            FlattenOptions::remove_fragments(),
        ))?;
        snapshot!(query, "built mutation query");
        Ok(query)
    }

    /// Follows `path` from the fat query root.
    fn fat_field(&self, path: &[Name]) -> Result<&'a Arc<FieldNode>, QueryError> {
        let mut segments = path.iter();
        let first = segments
            .next()
            .ok_or_else(|| QueryError::internal("empty path on fat query"))?;
        let mut field = self
            .fat_query
            .field_by_storage_key(first)
            .ok_or_else(|| QueryError::invalid_field(first.as_str()))?;
        for segment in segments {
            field = field
                .field_by_storage_key(segment)
                .ok_or_else(|| QueryError::invalid_field(segment.as_str()))?;
        }
        Ok(field)
    }

    /// Nests `node`, the field reached by `path`, under the fat fields leading to it. Each
    /// ancestor only selects the next segment of the path.
    fn with_ancestors(
        &self,
        path: &[Name],
        mut node: QueryNode,
    ) -> Result<Option<QueryNode>, QueryError> {
        for depth in (1..path.len()).rev() {
            let ancestor = QueryNode::Field(self.fat_field(&path[..depth])?.clone());
            match ancestor.clone_with_children(vec![node]) {
                Some(wrapped) => node = wrapped,
                None => return Ok(None),
            }
        }
        Ok(Some(node))
    }

    /// A fat parent without selections may hold any connection.
    fn check_connection(
        &self,
        fat_parent: &FieldNode,
        connection_name: &Name,
    ) -> Result<(), QueryError> {
        if fat_parent.children().is_empty()
            || !find_descendant_fields(&fat_parent.clone().into(), connection_name).is_empty()
        {
            Ok(())
        } else {
            Err(QueryError::invalid_field(connection_name.as_str()))
        }
    }

    /// Selects `fat_field` with the selections `mutate` derives from the tracked selections,
    /// plus `id`. Nothing is selected if nothing was tracked.
    fn tracked_field(
        &self,
        fat_field: &Arc<FieldNode>,
        tracked_children: Vec<QueryNode>,
        mutate: impl FnOnce(&QueryNode, &QueryNode) -> Option<QueryNode>,
    ) -> Option<QueryNode> {
        let fat_field = QueryNode::Field(fat_field.clone());
        let tracked_field = fat_field.clone_with_children(tracked_children)?;
        if !tracked_field.can_have_subselections() {
            return Some(tracked_field);
        }
        let children = mutate(&tracked_field, &fat_field)
            .map(|mutated| mutated.children().to_vec())
            .unwrap_or_default();
        self.with_id(&fat_field.clone_with_children_preserving(children, true)?)
    }

    fn with_id(&self, node: &QueryNode) -> Option<QueryNode> {
        let id = &self.interface.id_field;
        let has_id = node
            .children()
            .iter()
            .any(|child| child.as_field().is_some_and(|field| field.name() == id));
        if has_id {
            return Some(node.clone());
        }
        let mut children = node.children().to_vec();
        children.push(FieldNode::leaf(id.clone()).into());
        node.clone_with_children(children)
    }

    /// The new edge: `cursor`, `__typename`, `source` (unless the parent only exists on the
    /// client), the scalars of the fat edge and every tracked edge selection, with `id` on
    /// the node.
    fn edge_field(
        &self,
        insertion: &EdgeInsertion,
        tracked_edges: &[Arc<FieldNode>],
    ) -> Result<QueryNode, QueryError> {
        let interface = self.interface;
        let fat_edge = self.fat_query.field_by_storage_key(&insertion.edge_name);
        let mut children: Vec<QueryNode> = vec![
            FieldNode::leaf(interface.cursor_field.clone()).into(),
            FieldNode::leaf(TYPENAME_FIELD).into(),
        ];
        if interface.edges_have_source_field && !interface.is_client_id(&insertion.parent_id) {
            let source_children = vec![
                FieldNode::leaf(interface.id_field.clone()).into(),
                FieldNode::leaf(TYPENAME_FIELD).into(),
            ];
            children.push(
                FieldNode::composite(interface.source_field.clone(), ANY_TYPE, source_children)
                    .into(),
            );
        }
        if let Some(fat_edge) = fat_edge {
            children.extend(
                fat_edge
                    .children()
                    .iter()
                    .filter(|child| !child.can_have_subselections())
                    .cloned(),
            );
        }
        children.extend(
            tracked_edges
                .iter()
                .flat_map(|edge| edge.children().iter().cloned()),
        );
        let edge_type = fat_edge.map_or(ANY_TYPE, |fat_edge| fat_edge.type_name().clone());
        let edge: QueryNode =
            FieldNode::composite(insertion.edge_name.clone(), edge_type, children).into();
        let edge = flatten_query(&edge, FlattenOptions::default())
            .ok_or_else(|| QueryError::internal("new edge field has no selections"))?;
        let children = edge
            .children()
            .iter()
            .filter_map(|child| match child.as_field() {
                Some(field) if field.name() == &interface.node_field => self.with_id(child),
                _ => Some(child.clone()),
            })
            .collect();
        edge.clone_with_children(children)
            .ok_or_else(|| QueryError::internal("new edge field has no selections"))
    }

    /// `deletedCommentId`, or `formerFriend { id }` for the path `["formerFriend"]`.
    fn deleted_id_field(&self, deleted_id_field: &DeletedIdField) -> Result<QueryNode, QueryError> {
        match deleted_id_field {
            DeletedIdField::Field(name) => Ok(FieldNode::leaf(name.clone()).into()),
            DeletedIdField::Path(path) => {
                if path.is_empty() {
                    return Err(QueryError::InvalidDeletedIdPath);
                }
                let id: QueryNode = FieldNode::leaf(self.interface.id_field.clone()).into();
                Ok(path.iter().rev().fold(id, |child, name| {
                    FieldNode::composite(name.clone(), ANY_TYPE, vec![child]).into()
                }))
            }
        }
    }
}

/// Finds the fields named `field_name` among `node` (if it is a field) or its children,
/// looking through fragments but not into other fields.
fn find_descendant_fields(node: &QueryNode, field_name: &Name) -> Vec<Arc<FieldNode>> {
    let mut fields = Vec::new();
    collect_descendant_fields(node, field_name, true, &mut fields);
    fields
}

fn collect_descendant_fields(
    node: &QueryNode,
    field_name: &Name,
    is_root: bool,
    fields: &mut Vec<Arc<FieldNode>>,
) {
    match node {
        QueryNode::Field(field) if field.name() == field_name => {
            fields.push(field.clone());
            return;
        }
        _ => {}
    }
    if is_root || matches!(node, QueryNode::Fragment(_)) {
        for child in node.children() {
            collect_descendant_fields(child, field_name, false, fields);
        }
    }
}

/// Removes the fields named `field_name` among the children of `node`, looking through
/// fragments.
fn without_field(node: &QueryNode, field_name: &Name) -> Option<QueryNode> {
    let children = node
        .children()
        .iter()
        .filter_map(|child| match child {
            QueryNode::Field(field) if field.name() == field_name => None,
            QueryNode::Fragment(_) => without_field(child, field_name),
            _ => Some(child.clone()),
        })
        .collect();
    node.clone_with_children(children)
}

fn into_root(node: Option<QueryNode>) -> Result<RootNode, QueryError> {
    match node {
        Some(QueryNode::Root(root)) => Ok(Arc::unwrap_or_clone(root)),
        _ => Err(QueryError::internal("mutation query has no selections")),
    }
}
