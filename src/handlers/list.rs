//! Registry listings.

use crate::config::Registry;
use crate::error::AppError;
use crate::response::{database_list, environment_list};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};

/// Flat registries list identifiers; scoped registries list environments.
pub async fn list(State(state): State<AppState>) -> Result<Response, AppError> {
    let registry = state.registry.current().await?;
    Ok(match registry.as_ref() {
        Registry::Flat(_) => database_list(registry.identifiers()).into_response(),
        Registry::Scoped(_) => environment_list(registry.environments()).into_response(),
    })
}

pub async fn list_environment(
    State(state): State<AppState>,
    Path(environment): Path<String>,
) -> Result<Response, AppError> {
    let registry = state.registry.current().await?;
    registry
        .databases_in(&environment)
        .map(|databases| database_list(databases).into_response())
        .ok_or(AppError::EnvironmentNotFound(environment))
}
