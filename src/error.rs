//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::response::ErrorBody;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config source {path} is unreadable: {reason}")]
    Unreadable { path: String, reason: String },
    #[error("config source {path} is malformed: {reason}")]
    Malformed { path: String, reason: String },
    #[error("invalid setting {key}: {reason}")]
    InvalidSetting { key: &'static str, reason: String },
    #[error("config load: {0}")]
    Load(String),
}

/// Failure while talking to a configured database.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Unable to connect to {database} database: {message}")]
    Connection { database: String, message: String },
    /// Driver text of a rejected statement.
    #[error("{0}")]
    Execution(String),
}

impl GatewayError {
    /// Build an execution error from a sqlx error as `<code>: <message>`.
    /// MySQL reports its server error number, other databases their SQLSTATE.
    pub fn execution(err: &sqlx::Error) -> Self {
        let message = match err {
            sqlx::Error::Database(db) => {
                let code = match db.try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>() {
                    Some(mysql) => Some(mysql.number().to_string()),
                    None => db.code().map(|c| c.into_owned()),
                };
                coded_message(code.as_deref(), db.message())
            }
            other => other.to_string(),
        };
        GatewayError::Execution(message)
    }
}

fn coded_message(code: Option<&str>, message: &str) -> String {
    match code {
        Some(code) => format!("{}: {}", code, message),
        None => message.to_string(),
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Unable to find credentials matching {0}.")]
    CredentialsNotFound(String),
    #[error("Unable to find environment matching {0}.")]
    EnvironmentNotFound(String),
    #[error("SQL query missing from request.")]
    MissingSql,
    #[error("{0}")]
    BadRequest(String),
    /// The request body could not be read, e.g. it exceeded the size limit.
    #[error("Unable to read request body: {message}")]
    UnreadableBody { status: StatusCode, message: String },
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::CredentialsNotFound(_) | AppError::EnvironmentNotFound(_) => StatusCode::NOT_FOUND,
            AppError::MissingSql | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UnreadableBody { status, .. } => *status,
            AppError::Gateway(GatewayError::Execution(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Gateway(GatewayError::Connection { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "request failed");
        } else {
            tracing::warn!(status = %status, error = %self, "request rejected");
        }
        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn not_found_uses_credentials_message() {
        let (status, body) = body_of(AppError::CredentialsNotFound("unknown".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, serde_json::json!({"ERROR": "Unable to find credentials matching unknown."}));
    }

    #[tokio::test]
    async fn missing_sql_is_bad_request() {
        let (status, body) = body_of(AppError::MissingSql).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ERROR"], "SQL query missing from request.");
    }

    #[tokio::test]
    async fn execution_failure_is_unprocessable() {
        let err = AppError::from(GatewayError::Execution("1146: Table 'salesdb.nope' doesn't exist".into()));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["ERROR"], "1146: Table 'salesdb.nope' doesn't exist");
    }

    #[test]
    fn connection_and_config_failures_are_server_errors() {
        let conn = AppError::from(GatewayError::Connection {
            database: "sales".into(),
            message: "connection refused".into(),
        });
        assert_eq!(conn.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(conn.to_string(), "Unable to connect to sales database: connection refused");

        let cfg = AppError::from(ConfigError::Load("boom".into()));
        assert_eq!(cfg.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn unreadable_body_keeps_its_status() {
        let err = AppError::UnreadableBody {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: "length limit exceeded".into(),
        };
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["ERROR"], "Unable to read request body: length limit exceeded");
    }

    #[test]
    fn database_errors_lead_with_their_code() {
        assert_eq!(
            coded_message(Some("1146"), "Table 'salesdb.nope' doesn't exist"),
            "1146: Table 'salesdb.nope' doesn't exist"
        );
        assert_eq!(coded_message(None, "syntax error"), "syntax error");
    }

    #[test]
    fn non_database_sqlx_errors_keep_their_text() {
        let err = GatewayError::execution(&sqlx::Error::RowNotFound);
        assert!(matches!(err, GatewayError::Execution(ref m) if !m.is_empty()));
    }
}
