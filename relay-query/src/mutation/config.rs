//! Mutation configurations: what a mutation does to the client's data, per kind.
use apollo_compiler::Name;
use indexmap::IndexMap;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::RangeBehavior;
use super::RangeBehaviors;
use crate::error::QueryError;
use crate::from_graphql::QuerySchema;
use crate::node::FragmentNode;

/// The kinds of [`MutationConfig`], spelled as in JSON configs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MutationConfigKind {
    FieldsChange,
    NodeDelete,
    RangeDelete,
    RangeAdd,
    RequiredChildren,
}

/// One effect of a mutation on data the client may have fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationConfig {
    /// Fields of existing entities changed. Maps each payload field to the ID(s) of the
    /// entities it returns.
    FieldsChange { field_ids: IndexMap<Name, DataIds> },
    /// A node was deleted. Its ID is echoed by the payload scalar `deleted_id_field_name`.
    NodeDelete {
        deletion: EdgeDeletion,
        deleted_id_field_name: Name,
    },
    /// An edge was removed from a connection.
    RangeDelete {
        deletion: EdgeDeletion,
        deleted_id_field_name: DeletedIdField,
    },
    /// An edge was added to a connection.
    RangeAdd(EdgeInsertion),
    /// Selections that are always fetched, whatever the client has seen.
    RequiredChildren { children: Vec<FragmentNode> },
}

/// The ID, or IDs for a plural field, of the entities returned by a payload field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, derive_more::From)]
#[serde(untagged)]
pub enum DataIds {
    Single(String),
    Plural(Vec<String>),
}

impl From<&str> for DataIds {
    fn from(id: &str) -> Self {
        Self::Single(id.to_owned())
    }
}

impl DataIds {
    pub fn as_slice(&self) -> &[String] {
        match self {
            Self::Single(id) => std::slice::from_ref(id),
            Self::Plural(ids) => ids,
        }
    }
}

/// Where the payload echoes the ID of a deleted edge's node.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::From)]
pub enum DeletedIdField {
    /// A scalar payload field, e.g. `deletedCommentId`.
    Field(Name),
    /// A path of composite payload fields leading to the deleted node, e.g. `["formerFriend"]`
    /// for `formerFriend { id }`.
    Path(Vec<Name>),
}

/// Describes the removal of an edge from the connection `connection_name` of the entity
/// `parent_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeDeletion {
    /// The path from the payload to the connection's parent, e.g. `["feedback"]`.
    pub parent_path: Vec<Name>,
    pub parent_id: String,
    pub connection_name: Name,
}

impl EdgeDeletion {
    pub fn new(parent_name: Name, parent_id: impl Into<String>, connection_name: Name) -> Self {
        Self {
            parent_path: vec![parent_name],
            parent_id: parent_id.into(),
            connection_name,
        }
    }
}

/// Describes the insertion of an edge, returned by the payload field `edge_name`, into the
/// connection `connection_name` of the entity `parent_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeInsertion {
    /// The payload field returning the parent. Without it, connections that cannot be updated
    /// in place are not refetched.
    pub parent_name: Option<Name>,
    pub parent_id: String,
    pub connection_name: Name,
    pub edge_name: Name,
    pub range_behaviors: RangeBehaviors,
}

impl MutationConfig {
    pub fn kind(&self) -> MutationConfigKind {
        match self {
            Self::FieldsChange { .. } => MutationConfigKind::FieldsChange,
            Self::NodeDelete { .. } => MutationConfigKind::NodeDelete,
            Self::RangeDelete { .. } => MutationConfigKind::RangeDelete,
            Self::RangeAdd(_) => MutationConfigKind::RangeAdd,
            Self::RequiredChildren { .. } => MutationConfigKind::RequiredChildren,
        }
    }

    /// Reads a config object of the mutation `mutation_name`, such as
    ///
    /// ```json
    /// {
    ///   "type": "RANGE_ADD",
    ///   "parentName": "feedback",
    ///   "parentID": "123",
    ///   "connectionName": "comments",
    ///   "edgeName": "feedbackCommentEdge",
    ///   "rangeBehaviors": { "": "prepend" }
    /// }
    /// ```
    ///
    /// `REQUIRED_CHILDREN` configs list GraphQL fragments, which are converted with `schema`.
    ///
    /// # Errors
    /// - [`QueryError::UnrecognizedConfig`] if `type` is not a known kind.
    /// - [`QueryError::InvalidConfig`] if a field is missing or malformed.
    pub fn from_json(
        value: &Value,
        mutation_name: &str,
        schema: &QuerySchema,
    ) -> Result<Self, QueryError> {
        let kind = value.get("type").and_then(Value::as_str).unwrap_or_default();
        let parsed_kind: MutationConfigKind =
            kind.parse().map_err(|_| QueryError::UnrecognizedConfig {
                kind: kind.to_owned(),
                mutation_name: mutation_name.to_owned(),
            })?;
        let reader = ConfigReader {
            value,
            kind: parsed_kind,
            mutation_name,
        };
        match parsed_kind {
            MutationConfigKind::FieldsChange => {
                let json: FieldsChangeJson = reader.read()?;
                let field_ids = json
                    .field_ids
                    .into_iter()
                    .map(|(name, ids)| Ok((reader.name(&name)?, ids)))
                    .collect::<Result<_, QueryError>>()?;
                Ok(Self::FieldsChange { field_ids })
            }
            MutationConfigKind::NodeDelete => {
                let json: NodeDeleteJson = reader.read()?;
                Ok(Self::NodeDelete {
                    deletion: EdgeDeletion::new(
                        reader.name(&json.parent_name)?,
                        json.parent_id,
                        reader.name(&json.connection_name)?,
                    ),
                    deleted_id_field_name: reader.name(&json.deleted_id_field_name)?,
                })
            }
            MutationConfigKind::RangeDelete => {
                let json: RangeDeleteJson = reader.read()?;
                let parent_path = match (json.path_to_connection, json.parent_name) {
                    (Some(mut path), parent_name) => {
                        if path.len() < 2 {
                            return Err(reader.invalid(
                                "`pathToConnection` must name the parent and the connection",
                            ));
                        }
                        if path.pop().as_ref() != Some(&json.connection_name) {
                            return Err(reader.invalid(
                                "`pathToConnection` must end with `connectionName`",
                            ));
                        }
                        match parent_name {
                            Some(parent_name) if path.last() != Some(&parent_name) => {
                                return Err(reader.invalid(
                                    "`parentName` must be the parent in `pathToConnection`",
                                ));
                            }
                            _ => {}
                        }
                        reader.names(&path)?
                    }
                    (None, Some(parent_name)) => vec![reader.name(&parent_name)?],
                    (None, None) => {
                        return Err(reader.invalid("expected `parentName` or `pathToConnection`"));
                    }
                };
                let deleted_id_field_name = match json.deleted_id_field_name {
                    DeletedIdJson::Field(name) => DeletedIdField::Field(reader.name(&name)?),
                    DeletedIdJson::Path(path) => DeletedIdField::Path(reader.names(&path)?),
                };
                Ok(Self::RangeDelete {
                    deletion: EdgeDeletion {
                        parent_path,
                        parent_id: json.parent_id,
                        connection_name: reader.name(&json.connection_name)?,
                    },
                    deleted_id_field_name,
                })
            }
            MutationConfigKind::RangeAdd => {
                let json: RangeAddJson = reader.read()?;
                let range_behaviors = RangeBehaviors::from_pairs(
                    json.range_behaviors
                        .iter()
                        .map(|(key, behavior)| (key.as_str(), *behavior)),
                )?;
                Ok(Self::RangeAdd(EdgeInsertion {
                    parent_name: json
                        .parent_name
                        .map(|name| reader.name(&name))
                        .transpose()?,
                    parent_id: json.parent_id,
                    connection_name: reader.name(&json.connection_name)?,
                    edge_name: reader.name(&json.edge_name)?,
                    range_behaviors,
                }))
            }
            MutationConfigKind::RequiredChildren => {
                let json: RequiredChildrenJson = reader.read()?;
                let children = json
                    .children
                    .iter()
                    .map(|source| schema.fragment(source))
                    .collect::<Result<_, _>>()?;
                Ok(Self::RequiredChildren { children })
            }
        }
    }

    /// Reads a JSON array of config objects, see [`MutationConfig::from_json`].
    pub fn from_json_list(
        value: &Value,
        mutation_name: &str,
        schema: &QuerySchema,
    ) -> Result<Vec<Self>, QueryError> {
        let Value::Array(configs) = value else {
            return Err(QueryError::InvalidConfig {
                kind: "configs".to_owned(),
                mutation_name: mutation_name.to_owned(),
                message: "expected an array of configs".to_owned(),
            });
        };
        configs
            .iter()
            .map(|config| Self::from_json(config, mutation_name, schema))
            .collect()
    }
}

struct ConfigReader<'a> {
    value: &'a Value,
    kind: MutationConfigKind,
    mutation_name: &'a str,
}

impl ConfigReader<'_> {
    fn invalid(&self, message: impl Into<String>) -> QueryError {
        QueryError::InvalidConfig {
            kind: self.kind.to_string(),
            mutation_name: self.mutation_name.to_owned(),
            message: message.into(),
        }
    }

    fn read<T: DeserializeOwned>(&self) -> Result<T, QueryError> {
        T::deserialize(self.value).map_err(|err| self.invalid(err.to_string()))
    }

    fn name(&self, name: &str) -> Result<Name, QueryError> {
        Name::new(name).map_err(|_| self.invalid(format!("`{name}` is not a valid field name")))
    }

    fn names(&self, names: &[String]) -> Result<Vec<Name>, QueryError> {
        names.iter().map(|name| self.name(name)).collect()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldsChangeJson {
    #[serde(rename = "fieldIDs")]
    field_ids: IndexMap<String, DataIds>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeDeleteJson {
    parent_name: String,
    #[serde(rename = "parentID")]
    parent_id: String,
    connection_name: String,
    #[serde(rename = "deletedIDFieldName")]
    deleted_id_field_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RangeDeleteJson {
    parent_name: Option<String>,
    path_to_connection: Option<Vec<String>>,
    #[serde(rename = "parentID")]
    parent_id: String,
    connection_name: String,
    #[serde(rename = "deletedIDFieldName")]
    deleted_id_field_name: DeletedIdJson,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DeletedIdJson {
    Field(String),
    Path(Vec<String>),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RangeAddJson {
    parent_name: Option<String>,
    #[serde(rename = "parentID")]
    parent_id: String,
    connection_name: String,
    edge_name: String,
    range_behaviors: IndexMap<String, RangeBehavior>,
}

#[derive(Deserialize)]
struct RequiredChildrenJson {
    children: Vec<String>,
}
