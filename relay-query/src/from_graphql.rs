//! Builds query trees from GraphQL documents, typed against a schema.
use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::Schema;
use apollo_compiler::ast;
use apollo_compiler::collections::IndexMap;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::validation::Valid;

use crate::connection::ConnectionInterface;
use crate::error::QueryError;
use crate::node::FieldMetadata;
use crate::node::FieldNode;
use crate::node::FragmentNode;
use crate::node::OperationKind;
use crate::node::QueryNode;
use crate::node::RootNode;
use crate::node::TYPENAME_FIELD;

/// A validated schema that turns GraphQL fragments and operations into query trees.
///
/// Field metadata comes from the schema: scalars, enums and `__typename` are leaves, list types
/// are plural, and composite types exposing both the `edges` and `pageInfo` fields of the
/// [`ConnectionInterface`] are connections. Named fragment spreads are inlined as
/// type-conditioned fragments and aliases are ignored.
///
/// Documents are parsed but not validated against the schema, so that fat queries may select
/// composite fields without a selection set:
///
/// ```graphql
/// fragment FeedbackLikeFatQuery on FeedbackLikeResponsePayload {
///   feedback { doesViewerLike likers }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct QuerySchema {
    schema: Valid<Schema>,
    interface: ConnectionInterface,
}

impl QuerySchema {
    pub fn parse(sdl: &str) -> Result<Self, QueryError> {
        let schema = Schema::parse_and_validate(sdl, "schema.graphql").map_err(|err| {
            QueryError::InvalidGraphQL {
                message: err.errors.to_string(),
            }
        })?;
        Ok(Self {
            schema,
            interface: ConnectionInterface::default(),
        })
    }

    pub fn with_connection_interface(mut self, interface: ConnectionInterface) -> Self {
        self.interface = interface;
        self
    }

    pub fn schema(&self) -> &Valid<Schema> {
        &self.schema
    }

    pub fn connection_interface(&self) -> &ConnectionInterface {
        &self.interface
    }

    /// Converts the first fragment definition of `source`. Other fragment definitions of the
    /// document may be spread into it. The fragment's own name is not kept.
    pub fn fragment(&self, source: &str) -> Result<FragmentNode, QueryError> {
        let document = parse_document(source, "fragment.graphql")?;
        let converter = Converter::new(self, &document);
        let definition = document
            .definitions
            .iter()
            .find_map(|definition| match definition {
                ast::Definition::FragmentDefinition(fragment) => Some(fragment),
                _ => None,
            })
            .ok_or_else(|| QueryError::InvalidGraphQL {
                message: "expected a fragment definition".to_owned(),
            })?;
        let mut visiting = vec![definition.name.clone()];
        let children = converter.selections(
            &definition.type_condition,
            &definition.selection_set,
            &mut visiting,
        )?;
        Ok(FragmentNode::new(definition.type_condition.clone(), children))
    }

    /// Converts the first operation of `source`, whose selection set must start with the root
    /// field, e.g. `mutation { commentCreate(input: $input) }`.
    pub fn operation(&self, source: &str) -> Result<RootNode, QueryError> {
        let document = parse_document(source, "operation.graphql")?;
        let converter = Converter::new(self, &document);
        let operation = document
            .definitions
            .iter()
            .find_map(|definition| match definition {
                ast::Definition::OperationDefinition(operation) => Some(operation),
                _ => None,
            })
            .ok_or_else(|| QueryError::InvalidGraphQL {
                message: "expected an operation definition".to_owned(),
            })?;
        let root_type = self
            .schema
            .root_operation(operation.operation_type)
            .ok_or_else(|| QueryError::InvalidGraphQL {
                message: format!(
                    "schema does not define a {} root type",
                    OperationKind::from(operation.operation_type)
                ),
            })?;
        let Some(ast::Selection::Field(root_field)) = operation.selection_set.first() else {
            return Err(QueryError::InvalidGraphQL {
                message: "expected the operation to select a root field".to_owned(),
            });
        };
        let definition = self
            .schema
            .type_field(root_type, &root_field.name)
            .map_err(|_| unknown_field(root_type, &root_field.name))?;
        let type_name = definition.ty.inner_named_type();
        let children =
            converter.selections(type_name, &root_field.selection_set, &mut Vec::new())?;
        Ok(RootNode::new(
            operation.operation_type.into(),
            root_field.name.clone(),
            type_name.clone(),
        )
        .with_name(operation.name.clone())
        .with_arguments(root_field.arguments.clone())
        .with_children(children))
    }

    fn is_connection(&self, type_name: &Name) -> bool {
        self.schema
            .type_field(type_name, &self.interface.edges_field)
            .is_ok()
            && self
                .schema
                .type_field(type_name, &self.interface.page_info_field)
                .is_ok()
    }
}

fn parse_document(source: &str, path: &str) -> Result<ast::Document, QueryError> {
    ast::Document::parse(source, path).map_err(|err| QueryError::InvalidGraphQL {
        message: err.errors.to_string(),
    })
}

fn unknown_field(type_name: &Name, field_name: &Name) -> QueryError {
    QueryError::UnknownField {
        type_name: type_name.to_string(),
        field_name: field_name.to_string(),
    }
}

struct Converter<'a> {
    schema: &'a QuerySchema,
    fragments: IndexMap<Name, &'a Node<ast::FragmentDefinition>>,
}

impl<'a> Converter<'a> {
    fn new(schema: &'a QuerySchema, document: &'a ast::Document) -> Self {
        let fragments = document
            .definitions
            .iter()
            .filter_map(|definition| match definition {
                ast::Definition::FragmentDefinition(fragment) => {
                    Some((fragment.name.clone(), fragment))
                }
                _ => None,
            })
            .collect();
        Self { schema, fragments }
    }

    /// `visiting` holds the names of the fragments being expanded, to reject cyclic spreads.
    fn selections(
        &self,
        parent_type: &Name,
        selections: &[ast::Selection],
        visiting: &mut Vec<Name>,
    ) -> Result<Vec<QueryNode>, QueryError> {
        selections
            .iter()
            .map(|selection| match selection {
                ast::Selection::Field(field) => self.field(parent_type, field, visiting),
                ast::Selection::InlineFragment(inline) => {
                    let type_condition = inline.type_condition.as_ref().unwrap_or(parent_type);
                    let children =
                        self.selections(type_condition, &inline.selection_set, visiting)?;
                    Ok(FragmentNode::new(type_condition.clone(), children).into())
                }
                ast::Selection::FragmentSpread(spread) => {
                    let definition = self.fragments.get(&spread.fragment_name).ok_or_else(|| {
                        QueryError::UnknownFragment {
                            fragment_name: spread.fragment_name.to_string(),
                        }
                    })?;
                    if visiting.contains(&spread.fragment_name) {
                        return Err(QueryError::InvalidGraphQL {
                            message: format!(
                                "fragment `{}` spreads itself",
                                spread.fragment_name
                            ),
                        });
                    }
                    visiting.push(spread.fragment_name.clone());
                    let children = self.selections(
                        &definition.type_condition,
                        &definition.selection_set,
                        visiting,
                    );
                    visiting.pop();
                    Ok(FragmentNode::new(definition.type_condition.clone(), children?).into())
                }
            })
            .collect()
    }

    fn field(
        &self,
        parent_type: &Name,
        field: &ast::Field,
        visiting: &mut Vec<Name>,
    ) -> Result<QueryNode, QueryError> {
        if field.name == TYPENAME_FIELD {
            return Ok(FieldNode::leaf(TYPENAME_FIELD).into());
        }
        let schema = &self.schema.schema;
        let definition = schema
            .type_field(parent_type, &field.name)
            .map_err(|_| unknown_field(parent_type, &field.name))?;
        let type_name = definition.ty.inner_named_type();
        let is_plural = definition.ty.is_list();
        let leaf = match schema.types.get(type_name) {
            Some(ExtendedType::Scalar(_) | ExtendedType::Enum(_)) => true,
            Some(_) => false,
            None => {
                return Err(QueryError::internal(format!(
                    "type `{type_name}` of field `{parent_type}.{}` is not defined",
                    field.name
                )));
            }
        };
        let metadata = if leaf {
            FieldMetadata::LEAF
        } else if self.schema.is_connection(type_name) {
            FieldMetadata::CONNECTION
        } else {
            FieldMetadata::COMPOSITE
        };
        let metadata = if is_plural {
            metadata.plural()
        } else {
            metadata
        };
        let children = if leaf {
            Vec::new()
        } else {
            self.selections(type_name, &field.selection_set, visiting)?
        };
        Ok(FieldNode::composite(field.name.clone(), type_name.clone(), children)
            .with_metadata(metadata)
            .with_arguments(field.arguments.clone())
            .into())
    }
}
