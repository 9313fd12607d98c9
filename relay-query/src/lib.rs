//! Query tree transformations for Relay-style GraphQL clients.
//!
//! ## Flattening
//!
//! [`flatten_query`] normalizes a selection tree reached through arbitrarily nested fragments
//! into one selection per distinct field identity (its [`StorageKey`]).
//!
//! ## Mutation queries
//!
//! [`MutationQuery`] derives the query to send along with a mutation from:
//! - a *fat query*, selecting every payload field the mutation may change,
//! - a [`QueryTracker`], recording which fields the client already fetched for which entity,
//! - the [`MutationConfig`]s of the mutation.
//!
//! Only fields that are both possibly changed and already fetched are selected.
//!
//! ```
//! use relay_query::InMemoryQueryTracker;
//! use relay_query::MutationConfig;
//! use relay_query::MutationQuery;
//! use relay_query::QuerySchema;
//!
//! let schema = QuerySchema::parse(r#"
//!     type Query { feedback: Feedback }
//!     type Mutation { feedbackLike(input: ID): FeedbackLikeResponsePayload }
//!     type Feedback { id: ID! doesViewerLike: Boolean url: String }
//!     type FeedbackLikeResponsePayload { clientMutationId: String feedback: Feedback }
//! "#)?;
//! let fat_query = schema.fragment(
//!     "fragment Fat on FeedbackLikeResponsePayload { feedback { doesViewerLike } }",
//! )?;
//! let mutation = schema.operation("mutation { feedbackLike(input: $input) }")?;
//!
//! let mut tracker = InMemoryQueryTracker::new();
//! tracker.track_node_for_id(
//!     schema.fragment("fragment Seen on Feedback { doesViewerLike url }")?.into(),
//!     "123",
//! );
//!
//! let configs = MutationConfig::from_json_list(
//!     &serde_json::json!([{ "type": "FIELDS_CHANGE", "fieldIDs": { "feedback": "123" } }]),
//!     "FeedbackLikeMutation",
//!     &schema,
//! )?;
//! let query = MutationQuery::new(&fat_query, &tracker).build_query(
//!     &configs,
//!     "FeedbackLikeMutation",
//!     &mutation,
//! )?;
//! assert_eq!(
//!     query.to_string(),
//!     "mutation FeedbackLikeMutation {\n  feedbackLike(input: $input) {\n    clientMutationId\n    feedback {\n      doesViewerLike\n      id\n    }\n  }\n}",
//! );
//! # Ok::<(), relay_query::QueryError>(())
//! ```

#![warn(
    rustdoc::broken_intra_doc_links,
    unreachable_pub,
    unreachable_patterns,
    unused,
    unused_qualifications,
    dead_code,
    while_true,
    unconditional_panic,
    clippy::all
)]

mod connection;
mod display_helpers;
pub mod error;
mod from_graphql;
pub mod mutation;
pub mod node;
mod tracker;
mod traversal;
pub(crate) mod utils;

pub use crate::connection::ConnectionInterface;
pub use crate::error::QueryError;
pub use crate::from_graphql::QuerySchema;
pub use crate::mutation::MutationConfig;
pub use crate::mutation::MutationQuery;
pub use crate::mutation::fragment_for_optimistic_update;
pub use crate::mutation::query_for_optimistic_update;
pub use crate::node::FieldNode;
pub use crate::node::FragmentNode;
pub use crate::node::QueryNode;
pub use crate::node::RootNode;
pub use crate::node::StorageKey;
pub use crate::tracker::InMemoryQueryTracker;
pub use crate::tracker::QueryTracker;
pub use crate::traversal::FlattenOptions;
pub use crate::traversal::filter_query;
pub use crate::traversal::flatten_query;
pub use crate::traversal::infer_fields_from_data;
pub use crate::traversal::intersect_query;
pub use crate::traversal::merge_nodes;
