use std::sync::LazyLock;

use indexmap::IndexMap;
use itertools::Itertools;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;

use crate::error::QueryError;

/// One `name(value)` call of a call-filter signature.
static CALL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)\(([^()]*)\)").expect("Invalid regex pattern"));

/// How a connection reacts to an edge added by a `RANGE_ADD` mutation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RangeBehavior {
    Append,
    Ignore,
    Prepend,
    /// The connection is refetched instead of being updated in place.
    Refetch,
}

/// Range behaviors keyed by call-filter signature, e.g. `orderby(toplevel)` or the empty
/// signature for a connection without filter arguments.
///
/// Keys are canonicalized on insertion: calls are sorted by name, so `orderby(toplevel).filter(friends)`
/// and `filter(friends).orderby(toplevel)` name the same connections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeBehaviors {
    behaviors: IndexMap<String, RangeBehavior>,
}

impl RangeBehaviors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<'k>(
        pairs: impl IntoIterator<Item = (&'k str, RangeBehavior)>,
    ) -> Result<Self, QueryError> {
        let mut behaviors = Self::new();
        for (key, behavior) in pairs {
            behaviors.insert(key, behavior)?;
        }
        Ok(behaviors)
    }

    /// Sets the behavior of the connections with call-filter signature `key`.
    ///
    /// # Errors
    /// Returns [`QueryError::InvalidRangeBehaviorKey`] unless `key` is empty or a `.`-separated
    /// list of `name(value)` calls.
    pub fn insert(&mut self, key: &str, behavior: RangeBehavior) -> Result<(), QueryError> {
        let key = canonical_key(key)?;
        self.behaviors.insert(key, behavior);
        Ok(())
    }

    /// The configured behavior for a call-filter signature, as returned by
    /// [`ConnectionInterface::call_filter_signature`](crate::ConnectionInterface::call_filter_signature).
    pub fn get(&self, signature: &str) -> Option<RangeBehavior> {
        self.behaviors.get(signature).copied()
    }

    /// Whether edges added to connections with this signature can be inserted in place.
    /// Unconfigured and `refetch` connections cannot.
    pub fn updates_in_place(&self, signature: &str) -> bool {
        self.get(signature)
            .is_some_and(|behavior| behavior != RangeBehavior::Refetch)
    }

    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, RangeBehavior)> {
        self.behaviors
            .iter()
            .map(|(key, behavior)| (key.as_str(), *behavior))
    }
}

fn canonical_key(key: &str) -> Result<String, QueryError> {
    let mut calls = Vec::new();
    let mut rest = key;
    while !rest.is_empty() {
        let Some(captures) = CALL_PATTERN.captures(rest) else {
            return Err(QueryError::InvalidRangeBehaviorKey {
                key: key.to_owned(),
                message: format!("expected a `name(value)` call at `{rest}`"),
            });
        };
        let call = captures.get(0).map_or("", |call| call.as_str());
        let name = captures.get(1).map_or("", |name| name.as_str());
        calls.push((name, call));
        rest = &rest[call.len()..];
        if let Some(next) = rest.strip_prefix('.') {
            if next.is_empty() {
                return Err(QueryError::InvalidRangeBehaviorKey {
                    key: key.to_owned(),
                    message: "trailing `.`".to_owned(),
                });
            }
            rest = next;
        } else if !rest.is_empty() {
            return Err(QueryError::InvalidRangeBehaviorKey {
                key: key.to_owned(),
                message: format!("expected `.` before `{rest}`"),
            });
        }
    }
    Ok(calls
        .into_iter()
        .sorted_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, call)| call)
        .join("."))
}
