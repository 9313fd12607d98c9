//! Naming conventions of Relay-style connections and mutation payloads.
use std::sync::LazyLock;

use apollo_compiler::Name;
use apollo_compiler::name;
use itertools::Itertools;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use crate::node::FieldNode;
use crate::node::write_call_value;

pub(crate) static DEFAULT_CONNECTION_INTERFACE: LazyLock<ConnectionInterface> =
    LazyLock::new(ConnectionInterface::default);

/// The field and argument names the derivation engine relies on.
///
/// The defaults follow the Relay connection specification. Every field can be overridden, e.g.
/// from JSON:
///
/// ```
/// # use relay_query::ConnectionInterface;
/// let interface: ConnectionInterface = serde_json::from_str(
///     r#"{ "edges_have_source_field": false, "pagination_arguments": ["first", "after"] }"#,
/// ).unwrap();
/// assert_eq!(interface.edges_field, "edges");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectionInterface {
    /// The scalar echoed back by every mutation payload to correlate it with its request.
    #[serde(serialize_with = "serialize_name", deserialize_with = "deserialize_name")]
    pub client_mutation_id: Name,
    /// The entity identity field.
    #[serde(serialize_with = "serialize_name", deserialize_with = "deserialize_name")]
    pub id_field: Name,
    #[serde(serialize_with = "serialize_name", deserialize_with = "deserialize_name")]
    pub cursor_field: Name,
    #[serde(serialize_with = "serialize_name", deserialize_with = "deserialize_name")]
    pub edges_field: Name,
    #[serde(serialize_with = "serialize_name", deserialize_with = "deserialize_name")]
    pub node_field: Name,
    #[serde(serialize_with = "serialize_name", deserialize_with = "deserialize_name")]
    pub page_info_field: Name,
    /// The edge field pointing back at the connection's parent.
    #[serde(serialize_with = "serialize_name", deserialize_with = "deserialize_name")]
    pub source_field: Name,
    /// Whether the schema exposes `source` on edges.
    pub edges_have_source_field: bool,
    /// Arguments that only select a window of a connection. They are left out of call-filter
    /// signatures, so `comments(first: 10, orderby: "toplevel")` and
    /// `comments(last: 5, orderby: "toplevel")` share the signature `orderby(toplevel)`.
    pub pagination_arguments: Vec<String>,
    /// Prefix of IDs minted on the client, which the server cannot resolve.
    pub client_id_prefix: String,
}

impl Default for ConnectionInterface {
    fn default() -> Self {
        Self {
            client_mutation_id: name!("clientMutationId"),
            id_field: name!("id"),
            cursor_field: name!("cursor"),
            edges_field: name!("edges"),
            node_field: name!("node"),
            page_info_field: name!("pageInfo"),
            source_field: name!("source"),
            edges_have_source_field: true,
            pagination_arguments: ["after", "before", "find", "first", "last", "surrounds"]
                .into_iter()
                .map(String::from)
                .collect(),
            client_id_prefix: "client:".to_owned(),
        }
    }
}

impl ConnectionInterface {
    pub fn is_client_id(&self, id: &str) -> bool {
        id.starts_with(&self.client_id_prefix)
    }

    pub fn is_pagination_argument(&self, argument_name: &str) -> bool {
        self.pagination_arguments
            .iter()
            .any(|name| name == argument_name)
    }

    /// Returns the call-filter signature of a connection field: its non-pagination arguments
    /// sorted by name and spelled `name(value)`, joined with `.`. A connection without filter
    /// arguments has the empty signature.
    ///
    /// `comments(orderby: "toplevel", first: "10")` has the signature `orderby(toplevel)`.
    pub fn call_filter_signature(&self, connection: &FieldNode) -> String {
        connection
            .arguments()
            .iter()
            .filter(|argument| !self.is_pagination_argument(argument.name.as_str()))
            .sorted_by(|a, b| a.name.as_str().cmp(b.name.as_str()))
            .map(|argument| {
                let mut call = format!("{}(", argument.name);
                write_call_value(&mut call, &argument.value);
                call.push(')');
                call
            })
            .join(".")
    }
}

fn serialize_name<S: Serializer>(name: &Name, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(name.as_str())
}

fn deserialize_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Name, D::Error> {
    let value = String::deserialize(deserializer)?;
    Name::new(&value).map_err(|_| {
        serde::de::Error::custom(format!("`{value}` is not a valid GraphQL name"))
    })
}
