//! Errors raised while building, transforming, or deriving queries.
use apollo_compiler::InvalidNameError;
use displaydoc::Display;
use thiserror::Error;

/// Errors returned by this crate.
///
/// Every variant signals a programmer or configuration mistake: a mutation configuration that
/// does not match the fat query, a malformed configuration object, or a GraphQL document that
/// does not match its schema. None of them are transient.
#[derive(Debug, Clone, Error, Display, PartialEq, Eq)]
#[non_exhaustive]
pub enum QueryError {
    /// Invalid field name on fat query, `{field_name}`.
    InvalidField {
        /// The path segment that was not found.
        field_name: String,
    },

    /// Unrecognized config key `{kind}` for `{mutation_name}`.
    UnrecognizedConfig {
        /// The config `type` as supplied.
        kind: String,
        /// The mutation the config was declared on.
        mutation_name: String,
    },

    /// Invalid `{kind}` config for `{mutation_name}`: {message}
    InvalidConfig {
        kind: String,
        mutation_name: String,
        message: String,
    },

    /// Expected {expected} for field `{field_name}`, but {found} was given.
    ShapeMismatch {
        field_name: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Invalid deleted node id name: the path must contain at least one field name.
    InvalidDeletedIdPath,

    /// Invalid range behavior key `{key}`: {message}
    InvalidRangeBehaviorKey { key: String, message: String },

    /// Invalid GraphQL name: {message}
    InvalidName { message: String },

    /// Invalid GraphQL document: {message}
    InvalidGraphQL { message: String },

    /// Cannot query field `{field_name}` on type `{type_name}`.
    UnknownField {
        type_name: String,
        field_name: String,
    },

    /// Unknown fragment `{fragment_name}`.
    UnknownFragment { fragment_name: String },

    /// An internal error has occurred, please report this bug to the maintainers: {message}
    Internal { message: String },
}

impl QueryError {
    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_field(field_name: impl Into<String>) -> Self {
        Self::InvalidField {
            field_name: field_name.into(),
        }
    }
}

impl From<InvalidNameError> for QueryError {
    fn from(err: InvalidNameError) -> Self {
        Self::InvalidName {
            message: err.to_string(),
        }
    }
}
