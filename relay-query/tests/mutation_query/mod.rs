use relay_query::FragmentNode;
use relay_query::InMemoryQueryTracker;
use relay_query::QuerySchema;
use relay_query::RootNode;

mod configs;
mod optimistic;

pub(crate) fn schema() -> QuerySchema {
    QuerySchema::parse(include_str!("../fixtures/schema.graphql")).unwrap()
}

pub(crate) fn fragment(schema: &QuerySchema, source: &str) -> FragmentNode {
    schema.fragment(source).unwrap()
}

pub(crate) fn mutation(schema: &QuerySchema, root_field: &str) -> RootNode {
    schema
        .operation(&format!("mutation {{ {root_field}(input: $input) }}"))
        .unwrap()
}

/// A tracker that has fetched `source`, a fragment on the entity type, for every ID in `ids`.
pub(crate) fn tracker(schema: &QuerySchema, ids: &[&str], source: &str) -> InMemoryQueryTracker {
    let mut tracker = InMemoryQueryTracker::new();
    for id in ids {
        tracker.track_node_for_id(fragment(schema, source).into(), *id);
    }
    tracker
}
