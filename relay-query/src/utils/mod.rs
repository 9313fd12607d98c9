//! Tools that help the ergonomics of this crate.

pub(crate) mod logging;
