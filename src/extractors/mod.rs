//! Request extractors.

pub mod sql;

pub use sql::SqlText;
