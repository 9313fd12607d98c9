//! Whole-tree transformations: flattening, merging, intersection, filtering and inference of
//! selections from response data.

mod filter;
mod flatten;
mod infer;
mod intersect;
mod merge;

pub use filter::filter_query;
pub use flatten::FlattenOptions;
pub use flatten::flatten_query;
pub use infer::infer_fields_from_data;
pub(crate) use infer::infer_fields_with;
pub use intersect::intersect_query;
pub(crate) use intersect::intersect_query_with;
pub use merge::merge_nodes;
pub(crate) use merge::SelectionMap;
