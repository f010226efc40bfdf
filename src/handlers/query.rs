//! Query and update handlers for the flat namespace, plus the shared statement path.

use crate::error::AppError;
use crate::extractors::SqlText;
use crate::gateway::{QueryMode, QueryResult};
use crate::resolver::CredentialResolver;
use crate::response::success_result;
use crate::state::AppState;
use axum::{
    extract::{ConnectInfo, Path, State},
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;

/// Where a statement is headed: an optional environment and a database label.
#[derive(Clone, Copy, Debug)]
pub struct Target<'a> {
    pub environment: Option<&'a str>,
    pub database: &'a str,
}

/// Resolve credentials, require SQL, run it, log the outcome.
///
/// Resolution happens first so an unknown database is reported even when SQL is missing.
pub async fn run_statement(
    state: &AppState,
    peer: Option<SocketAddr>,
    target: Target<'_>,
    sql: SqlText,
    mode: QueryMode,
) -> Result<QueryResult, AppError> {
    let registry = state.registry.current().await?;
    let resolver = CredentialResolver::new(&registry);
    let credentials = match resolver.resolve(target.environment, target.database) {
        Some(credentials) => credentials,
        None => {
            return Err(match target.environment {
                Some(env) if !resolver.has_environment(env) => AppError::EnvironmentNotFound(env.to_string()),
                _ => AppError::CredentialsNotFound(target.database.to_string()),
            })
        }
    };
    let sql = sql.0.ok_or(AppError::MissingSql)?;

    let peer = peer.map(|p| p.ip().to_string()).unwrap_or_else(|| "unknown".into());
    tracing::info!(
        peer = %peer,
        environment = target.environment,
        database = target.database,
        "{} attempting to run \"{}\" against {}",
        peer,
        sql,
        target.database
    );
    let result = state.gateway.execute(&credentials, &sql, mode).await?;
    tracing::info!(
        database = target.database,
        result = %serde_json::to_string(&result).unwrap_or_default(),
        "statement completed"
    );
    Ok(result)
}

pub async fn query(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    Path(database): Path<String>,
    sql: SqlText,
) -> Result<Response, AppError> {
    let target = Target {
        environment: None,
        database: &database,
    };
    let result = run_statement(&state, peer.map(|ConnectInfo(addr)| addr), target, sql, QueryMode::Read).await?;
    Ok(success_result(result).into_response())
}

pub async fn update(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    Path(database): Path<String>,
    sql: SqlText,
) -> Result<Response, AppError> {
    let target = Target {
        environment: None,
        database: &database,
    };
    let result = run_statement(&state, peer.map(|ConnectInfo(addr)| addr), target, sql, QueryMode::Write).await?;
    Ok(success_result(result).into_response())
}
