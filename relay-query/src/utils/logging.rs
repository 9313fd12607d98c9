/// A wrapper around `tracing::trace!` that records how query trees evolve while a mutation query
/// is derived. It is not related to snapshot testing.
///
/// Pass the snapshot tag, the printed tree and a message literal:
/// ```ignore
/// snapshot!("FieldsChange", fragment.to_string(), "tracked fields intersected");
/// // Generates:
/// // trace!(snapshot = "FieldsChange", data = fragment.to_string(), "tracked fields intersected");
/// ```
/// Passing just a value and a message tags the snapshot with the value's type name and prints it
/// through `Display`:
/// ```ignore
/// snapshot!(query, "assembled mutation query");
/// ```
/// Both forms compile to nothing unless the `snapshot_tracing` feature is enabled.
macro_rules! snapshot {
    ($value:expr, $msg:literal) => {
        #[cfg(feature = "snapshot_tracing")]
        tracing::trace!(
            snapshot = std::any::type_name_of_val(&$value),
            data = %$value,
            $msg
        );
    };
    ($name:literal, $value:expr, $msg:literal) => {
        #[cfg(feature = "snapshot_tracing")]
        tracing::trace!(snapshot = $name, data = %$value, $msg);
    };
}

pub(crate) use snapshot;
