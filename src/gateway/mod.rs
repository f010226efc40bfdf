//! Query gateway: one connection, one statement, one result.

mod mysql;
mod postgres;

use crate::config::{ResolvedCredentials, Scheme};
use crate::error::GatewayError;
use crate::format::Row;
use async_trait::async_trait;
use serde::Serialize;
use std::borrow::Cow;
use std::sync::Arc;

/// Read statements return rows; write statements return the affected-row count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryMode {
    Read,
    Write,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    Rows(Vec<Row>),
    Affected(u64),
}

/// Rust type a column is decoded through, chosen from the driver's type name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Decode {
    Bool,
    Int16,
    Int32,
    Int,
    UInt,
    Float32,
    Float64,
    Decimal,
    Timestamp,
    TimestampTz,
    Text,
    Json,
    Null,
    Unsupported,
}

/// Runs SQL text verbatim against the database named by the credentials.
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    async fn execute(
        &self,
        credentials: &ResolvedCredentials,
        sql: &str,
        mode: QueryMode,
    ) -> Result<QueryResult, GatewayError>;
}

/// Opens a fresh sqlx connection per statement and closes it before returning.
#[derive(Clone, Copy, Debug, Default)]
pub struct SqlxExecutor;

#[async_trait]
impl StatementExecutor for SqlxExecutor {
    async fn execute(
        &self,
        credentials: &ResolvedCredentials,
        sql: &str,
        mode: QueryMode,
    ) -> Result<QueryResult, GatewayError> {
        match credentials.scheme {
            Scheme::MySql => mysql::execute(credentials, sql, mode).await,
            Scheme::Postgres => postgres::execute(credentials, sql, mode).await,
        }
    }
}

/// Escapes SQL text and hands it to an executor.
#[derive(Clone)]
pub struct QueryGateway {
    executor: Arc<dyn StatementExecutor>,
    escape_percent: bool,
}

impl QueryGateway {
    pub fn new(executor: Arc<dyn StatementExecutor>, escape_percent: bool) -> Self {
        QueryGateway {
            executor,
            escape_percent,
        }
    }

    pub async fn execute(
        &self,
        credentials: &ResolvedCredentials,
        sql: &str,
        mode: QueryMode,
    ) -> Result<QueryResult, GatewayError> {
        let sql = if self.escape_percent {
            escape_percent(sql)
        } else {
            Cow::Borrowed(sql)
        };
        self.executor.execute(credentials, &sql, mode).await
    }
}

/// Double every `%`. Text without `%` is returned unchanged and unallocated.
///
/// The result reaches the server as written, so `%` inside string literals is doubled too.
pub fn escape_percent(sql: &str) -> Cow<'_, str> {
    if sql.contains('%') {
        Cow::Owned(sql.replace('%', "%%"))
    } else {
        Cow::Borrowed(sql)
    }
}
