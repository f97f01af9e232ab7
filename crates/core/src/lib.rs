//! `bizscope-core`: tabular data foundation.
//!
//! This crate contains the **input model** shared by every analyzer: the
//! immutable [`Dataset`], its cell [`Value`]s and the per-column
//! [`ColumnKind`] derived once at construction. No statistics live here.

pub mod dataset;
pub mod error;
pub mod value;
pub mod value_object;

pub use dataset::Dataset;
pub use error::{DataError, DataResult};
pub use value::{ColumnKind, Value};
pub use value_object::ValueObject;
