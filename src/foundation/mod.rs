//! Shared geometry, error and math helpers.

pub(crate) mod core;
pub(crate) mod error;
pub(crate) mod math;
