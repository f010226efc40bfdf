//! HTTP handlers for listing, querying and updating configured databases.

pub mod list;
pub mod query;
pub mod scoped;

pub use list::*;
pub use query::*;
pub use scoped::*;

use crate::error::AppError;
use axum::http::Uri;

/// Any path no route claims.
pub async fn unknown_endpoint(uri: Uri) -> AppError {
    AppError::BadRequest(format!("Unknown endpoint {}.", uri.path()))
}
