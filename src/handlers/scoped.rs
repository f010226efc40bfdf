//! Handlers for the scoped namespace: `/query/:environment/:database` and friends.

use super::query::{run_statement, Target};
use crate::error::{AppError, GatewayError};
use crate::extractors::SqlText;
use crate::gateway::{QueryMode, QueryResult};
use crate::response::success_result;
use crate::state::AppState;
use axum::{
    extract::{ConnectInfo, Path, State},
    response::{IntoResponse, Response},
    Json,
};
use std::net::SocketAddr;

pub async fn scoped_query(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    Path((environment, database)): Path<(String, String)>,
    sql: SqlText,
) -> Result<Response, AppError> {
    let target = Target {
        environment: Some(&environment),
        database: &database,
    };
    let result = run_statement(&state, peer.map(|ConnectInfo(addr)| addr), target, sql, QueryMode::Read).await?;
    Ok(success_result(result).into_response())
}

pub async fn scoped_update(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    Path((environment, database)): Path<(String, String)>,
    sql: SqlText,
) -> Result<Response, AppError> {
    let target = Target {
        environment: Some(&environment),
        database: &database,
    };
    let result = run_statement(&state, peer.map(|ConnectInfo(addr)| addr), target, sql, QueryMode::Write).await?;
    Ok(success_result(result).into_response())
}

/// `POST /:environment/:database`: rows without the `result` envelope.
/// Connection failures are reported as 400 on this route.
pub async fn scoped_raw_query(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    Path((environment, database)): Path<(String, String)>,
    sql: SqlText,
) -> Result<Response, AppError> {
    let target = Target {
        environment: Some(&environment),
        database: &database,
    };
    let result = run_statement(&state, peer.map(|ConnectInfo(addr)| addr), target, sql, QueryMode::Read)
        .await
        .map_err(|e| match e {
            AppError::Gateway(err @ GatewayError::Connection { .. }) => AppError::BadRequest(err.to_string()),
            other => other,
        })?;
    Ok(match result {
        QueryResult::Rows(rows) => Json(rows).into_response(),
        affected @ QueryResult::Affected(_) => Json(affected).into_response(),
    })
}
