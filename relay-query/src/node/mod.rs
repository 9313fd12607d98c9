//! Query node types.
//!
//! A query tree is made of three kinds of nodes, all wrapped by [`QueryNode`]:
//! - [`RootNode`]: the top-level selection of a query or mutation (e.g. `viewer` or
//!   `commentCreate(input: $input)`).
//! - [`FragmentNode`]: a type-conditioned group of selections (`... on Feedback { ... }`).
//! - [`FieldNode`]: a scalar or composite field selection with its arguments.
//!
//! Trees are logically immutable. Every transformation builds new nodes bottom-up through
//! [`QueryNode::clone_with_children`], sharing untouched subtrees through reference counting.
//!
//! Two selections are "the same" for merging purposes when their selection keys are equal:
//! fields are identified by their [`StorageKey`] (schema name plus sorted arguments) and
//! fragments by their type condition. Object identity never matters.

use std::fmt;
use std::sync::Arc;

use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use apollo_compiler::name;

use crate::display_helpers::State;
use crate::display_helpers::write_indented_lines;

mod contains;
mod storage_key;

pub use storage_key::StorageKey;
pub(crate) use storage_key::write_call_value;
pub(crate) use storage_key::write_value;

pub(crate) const TYPENAME_FIELD: Name = name!("__typename");
/// The response type of synthesized composite fields whose concrete type is not known.
pub(crate) const ANY_TYPE: Name = name!("__Any");
/// The response type of synthesized leaf fields.
pub(crate) const STRING_TYPE: Name = name!("String");

pub type ArgumentList = Vec<Node<ast::Argument>>;

/// The kind of operation a [`RootNode`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl From<ast::OperationType> for OperationKind {
    fn from(operation_type: ast::OperationType) -> Self {
        match operation_type {
            ast::OperationType::Query => Self::Query,
            ast::OperationType::Mutation => Self::Mutation,
            ast::OperationType::Subscription => Self::Subscription,
        }
    }
}

/// Schema-derived facts about a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FieldMetadata {
    /// Whether the field's type is composite. A composite field with no children is treated as
    /// "every sub-field" by intersection, and is dropped by flattening unless empty nodes are
    /// preserved.
    pub can_have_subselections: bool,
    /// Whether the field is a paginated connection (exposes `edges` and `pageInfo`).
    pub is_connection: bool,
    /// Whether the field returns a list.
    pub is_plural: bool,
}

impl FieldMetadata {
    pub const LEAF: Self = Self {
        can_have_subselections: false,
        is_connection: false,
        is_plural: false,
    };

    pub const COMPOSITE: Self = Self {
        can_have_subselections: true,
        is_connection: false,
        is_plural: false,
    };

    pub const CONNECTION: Self = Self {
        can_have_subselections: true,
        is_connection: true,
        is_plural: false,
    };

    pub fn plural(self) -> Self {
        Self {
            is_plural: true,
            ..self
        }
    }
}

/// A node of a query tree. Cloning is cheap: the node data is reference counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryNode {
    Root(Arc<RootNode>),
    Fragment(Arc<FragmentNode>),
    Field(Arc<FieldNode>),
}

/// Identifies which selections merge together under a common parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum SelectionKey {
    Field { storage_key: StorageKey },
    Fragment { type_condition: Name },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootNode {
    operation: OperationKind,
    name: Option<Name>,
    field_name: Name,
    arguments: ArgumentList,
    type_name: Name,
    children: Vec<QueryNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentNode {
    type_condition: Name,
    children: Vec<QueryNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNode {
    name: Name,
    arguments: ArgumentList,
    type_name: Name,
    metadata: FieldMetadata,
    children: Vec<QueryNode>,
}

impl RootNode {
    pub fn new(operation: OperationKind, field_name: Name, type_name: Name) -> Self {
        Self {
            operation,
            name: None,
            field_name,
            arguments: Vec::new(),
            type_name,
            children: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: Option<Name>) -> Self {
        self.name = name;
        self
    }

    pub fn with_arguments(mut self, arguments: ArgumentList) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn with_children(mut self, children: Vec<QueryNode>) -> Self {
        self.children = children;
        self
    }

    pub fn operation(&self) -> OperationKind {
        self.operation
    }

    /// The operation name, e.g. `CommentAddMutation`.
    pub fn name(&self) -> Option<&Name> {
        self.name.as_ref()
    }

    /// The root field name, e.g. `commentCreate`.
    pub fn field_name(&self) -> &Name {
        &self.field_name
    }

    pub fn arguments(&self) -> &[Node<ast::Argument>] {
        &self.arguments
    }

    pub fn type_name(&self) -> &Name {
        &self.type_name
    }

    pub fn children(&self) -> &[QueryNode] {
        &self.children
    }

    pub fn storage_key(&self) -> StorageKey {
        StorageKey::new(&self.field_name, &self.arguments)
    }
}

impl FragmentNode {
    pub fn new(type_condition: Name, children: Vec<QueryNode>) -> Self {
        Self {
            type_condition,
            children,
        }
    }

    pub fn type_condition(&self) -> &Name {
        &self.type_condition
    }

    pub fn children(&self) -> &[QueryNode] {
        &self.children
    }

    /// Finds a field among the children of this fragment, looking through nested fragments.
    pub fn field_by_storage_key(&self, storage_key: &str) -> Option<&Arc<FieldNode>> {
        find_field_by_storage_key(&self.children, storage_key)
    }
}

impl FieldNode {
    /// A scalar field.
    pub fn leaf(name: Name) -> Self {
        Self {
            name,
            arguments: Vec::new(),
            type_name: STRING_TYPE,
            metadata: FieldMetadata::LEAF,
            children: Vec::new(),
        }
    }

    /// A composite field of the given type.
    pub fn composite(name: Name, type_name: Name, children: Vec<QueryNode>) -> Self {
        Self {
            name,
            arguments: Vec::new(),
            type_name,
            metadata: FieldMetadata::COMPOSITE,
            children,
        }
    }

    pub fn with_arguments(mut self, arguments: ArgumentList) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn with_type_name(mut self, type_name: Name) -> Self {
        self.type_name = type_name;
        self
    }

    pub fn with_metadata(mut self, metadata: FieldMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_children(mut self, children: Vec<QueryNode>) -> Self {
        self.children = children;
        self
    }

    /// The schema name of the field (aliases are not modeled).
    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn arguments(&self) -> &[Node<ast::Argument>] {
        &self.arguments
    }

    pub fn type_name(&self) -> &Name {
        &self.type_name
    }

    pub fn metadata(&self) -> FieldMetadata {
        self.metadata
    }

    pub fn can_have_subselections(&self) -> bool {
        self.metadata.can_have_subselections
    }

    pub fn is_connection(&self) -> bool {
        self.metadata.is_connection
    }

    pub fn is_plural(&self) -> bool {
        self.metadata.is_plural
    }

    pub fn children(&self) -> &[QueryNode] {
        &self.children
    }

    pub fn storage_key(&self) -> StorageKey {
        StorageKey::new(&self.name, &self.arguments)
    }

    /// Finds a field among the children of this field, looking through fragments.
    pub fn field_by_storage_key(&self, storage_key: &str) -> Option<&Arc<FieldNode>> {
        find_field_by_storage_key(&self.children, storage_key)
    }
}

fn find_field_by_storage_key<'a>(
    children: &'a [QueryNode],
    storage_key: &str,
) -> Option<&'a Arc<FieldNode>> {
    children.iter().find_map(|child| match child {
        QueryNode::Field(field) if field.storage_key().as_str() == storage_key => Some(field),
        QueryNode::Fragment(fragment) => fragment.field_by_storage_key(storage_key),
        QueryNode::Field(_) | QueryNode::Root(_) => None,
    })
}

impl QueryNode {
    pub fn children(&self) -> &[QueryNode] {
        match self {
            Self::Root(root) => &root.children,
            Self::Fragment(fragment) => &fragment.children,
            Self::Field(field) => &field.children,
        }
    }

    /// Roots and fragments always can; fields can when their type is composite.
    pub fn can_have_subselections(&self) -> bool {
        match self {
            Self::Root(_) | Self::Fragment(_) => true,
            Self::Field(field) => field.can_have_subselections(),
        }
    }

    /// The type of the selections nested under this node: the response type of a root or field,
    /// or the type condition of a fragment.
    pub fn type_name(&self) -> &Name {
        match self {
            Self::Root(root) => &root.type_name,
            Self::Fragment(fragment) => &fragment.type_condition,
            Self::Field(field) => &field.type_name,
        }
    }

    /// The schema name of a field or root field. Fragments have none.
    pub fn schema_name(&self) -> Option<&Name> {
        match self {
            Self::Root(root) => Some(&root.field_name),
            Self::Fragment(_) => None,
            Self::Field(field) => Some(&field.name),
        }
    }

    pub fn as_field(&self) -> Option<&Arc<FieldNode>> {
        match self {
            Self::Field(field) => Some(field),
            Self::Root(_) | Self::Fragment(_) => None,
        }
    }

    pub fn as_fragment(&self) -> Option<&Arc<FragmentNode>> {
        match self {
            Self::Fragment(fragment) => Some(fragment),
            Self::Root(_) | Self::Field(_) => None,
        }
    }

    pub fn as_root(&self) -> Option<&Arc<RootNode>> {
        match self {
            Self::Root(root) => Some(root),
            Self::Fragment(_) | Self::Field(_) => None,
        }
    }

    pub(crate) fn key(&self) -> SelectionKey {
        match self {
            Self::Root(root) => SelectionKey::Field {
                storage_key: root.storage_key(),
            },
            Self::Fragment(fragment) => SelectionKey::Fragment {
                type_condition: fragment.type_condition.clone(),
            },
            Self::Field(field) => SelectionKey::Field {
                storage_key: field.storage_key(),
            },
        }
    }

    /// Returns a copy of this node with `children` as its children.
    ///
    /// Leaf fields ignore `children` and are returned as is. Any other node without children
    /// is empty and yields `None`.
    pub fn clone_with_children(&self, children: Vec<QueryNode>) -> Option<QueryNode> {
        self.clone_with_children_preserving(children, false)
    }

    /// Like [`QueryNode::clone_with_children`], but when `preserve_empty_nodes` is set a
    /// composite field without children is kept as a placeholder instead of being dropped.
    pub(crate) fn clone_with_children_preserving(
        &self,
        children: Vec<QueryNode>,
        preserve_empty_nodes: bool,
    ) -> Option<QueryNode> {
        if !self.can_have_subselections() {
            return Some(self.clone());
        }
        if children.is_empty() && !(preserve_empty_nodes && matches!(self, Self::Field(_))) {
            return None;
        }
        Some(match self {
            Self::Root(root) => Self::Root(Arc::new(RootNode {
                operation: root.operation,
                name: root.name.clone(),
                field_name: root.field_name.clone(),
                arguments: root.arguments.clone(),
                type_name: root.type_name.clone(),
                children,
            })),
            Self::Fragment(fragment) => Self::Fragment(Arc::new(FragmentNode {
                type_condition: fragment.type_condition.clone(),
                children,
            })),
            Self::Field(field) => Self::Field(Arc::new(FieldNode {
                name: field.name.clone(),
                arguments: field.arguments.clone(),
                type_name: field.type_name.clone(),
                metadata: field.metadata,
                children,
            })),
        })
    }
}

impl From<RootNode> for QueryNode {
    fn from(root: RootNode) -> Self {
        Self::Root(Arc::new(root))
    }
}

impl From<FragmentNode> for QueryNode {
    fn from(fragment: FragmentNode) -> Self {
        Self::Fragment(Arc::new(fragment))
    }
}

impl From<FieldNode> for QueryNode {
    fn from(field: FieldNode) -> Self {
        Self::Field(Arc::new(field))
    }
}

// Display implementations print GraphQL text with two-space indentation.

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(&mut State::new(f), self)
    }
}

impl fmt::Display for RootNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_root(&mut State::new(f), self)
    }
}

impl fmt::Display for FragmentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_fragment(&mut State::new(f), self)
    }
}

impl fmt::Display for FieldNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_field(&mut State::new(f), self)
    }
}

fn write_node(state: &mut State<'_, '_>, node: &QueryNode) -> fmt::Result {
    match node {
        QueryNode::Root(root) => write_root(state, root),
        QueryNode::Fragment(fragment) => write_fragment(state, fragment),
        QueryNode::Field(field) => write_field(state, field),
    }
}

fn write_root(state: &mut State<'_, '_>, root: &RootNode) -> fmt::Result {
    state.write(root.operation)?;
    if let Some(name) = &root.name {
        state.write(" ")?;
        state.write(name)?;
    }
    state.write(" {")?;
    state.indent_no_new_line();
    state.new_line()?;
    write_field_head(state, &root.field_name, &root.arguments)?;
    write_selections(state, &root.children)?;
    state.dedent()?;
    state.write("}")
}

fn write_fragment(state: &mut State<'_, '_>, fragment: &FragmentNode) -> fmt::Result {
    state.write("... on ")?;
    state.write(&fragment.type_condition)?;
    write_selections(state, &fragment.children)
}

fn write_field(state: &mut State<'_, '_>, field: &FieldNode) -> fmt::Result {
    write_field_head(state, &field.name, &field.arguments)?;
    write_selections(state, &field.children)
}

fn write_field_head(
    state: &mut State<'_, '_>,
    name: &Name,
    arguments: &[Node<ast::Argument>],
) -> fmt::Result {
    state.write(name)?;
    if arguments.is_empty() {
        return Ok(());
    }
    let mut printed = String::from("(");
    for (index, argument) in arguments.iter().enumerate() {
        if index > 0 {
            printed.push_str(", ");
        }
        printed.push_str(argument.name.as_str());
        printed.push_str(": ");
        write_value(&mut printed, &argument.value, false);
    }
    printed.push(')');
    state.write(printed)
}

fn write_selections(state: &mut State<'_, '_>, children: &[QueryNode]) -> fmt::Result {
    if children.is_empty() {
        return Ok(());
    }
    state.write(" {")?;
    write_indented_lines(state, children, |state, child| write_node(state, child))?;
    state.write("}")
}

const _: () = {
    const fn assert_thread_safe<T: Sync + Send>() {}

    assert_thread_safe::<QueryNode>();
};
