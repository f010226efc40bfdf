//! MySQL execution and row decoding.

use super::{Decode, QueryMode, QueryResult};
use crate::config::ResolvedCredentials;
use crate::error::GatewayError;
use crate::format::{row_from_cells, Cell, Row};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::{Column, Connection, Executor, Row as _, TypeInfo, ValueRef};

pub(super) async fn execute(
    credentials: &ResolvedCredentials,
    sql: &str,
    mode: QueryMode,
) -> Result<QueryResult, GatewayError> {
    let options = MySqlConnectOptions::new()
        .host(&credentials.host)
        .port(credentials.port_or_default())
        .username(&credentials.user)
        .password(&credentials.password)
        .database(&credentials.database);
    tracing::debug!(host = %credentials.host, database = %credentials.database, "opening mysql connection");
    let mut conn = MySqlConnection::connect_with(&options)
        .await
        .map_err(|e| GatewayError::Connection {
            database: credentials.database.clone(),
            message: e.to_string(),
        })?;

    let outcome = run(&mut conn, sql, mode).await;
    if let Err(e) = conn.close().await {
        tracing::debug!(error = %e, "mysql connection did not close cleanly");
    }
    outcome.map_err(|e| GatewayError::execution(&e))
}

async fn run(conn: &mut MySqlConnection, sql: &str, mode: QueryMode) -> Result<QueryResult, sqlx::Error> {
    match mode {
        QueryMode::Read => {
            let rows = Executor::fetch_all(&mut *conn, sqlx::raw_sql(sql)).await?;
            Ok(QueryResult::Rows(rows.iter().map(row_to_json).collect()))
        }
        QueryMode::Write => {
            let done = Executor::execute(&mut *conn, sqlx::raw_sql(sql)).await?;
            Ok(QueryResult::Affected(done.rows_affected()))
        }
    }
}

fn row_to_json(row: &MySqlRow) -> Row {
    row_from_cells(row.columns().iter().map(|col| {
        let cell = decode_cell(row, col.ordinal(), col.type_info().name());
        (col.name().to_string(), cell)
    }))
}

/// Pick the decoding for a MySQL type name as sqlx reports it.
fn decoder_for(type_name: &str) -> Decode {
    match type_name {
        "BOOLEAN" => Decode::Bool,
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => Decode::Int,
        name if name.ends_with("UNSIGNED") => Decode::UInt,
        "FLOAT" => Decode::Float32,
        "DOUBLE" => Decode::Float64,
        "DECIMAL" => Decode::Decimal,
        "DATETIME" => Decode::Timestamp,
        "TIMESTAMP" => Decode::TimestampTz,
        "CHAR" | "VARCHAR" | "TEXT" | "TINYTEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM" | "SET" => Decode::Text,
        "JSON" => Decode::Json,
        "NULL" => Decode::Null,
        _ => Decode::Unsupported,
    }
}

fn decode_cell(row: &MySqlRow, idx: usize, type_name: &str) -> Cell {
    match row.try_get_raw(idx) {
        Ok(value) if value.is_null() => return Cell::Null,
        Ok(_) => {}
        Err(_) => return Cell::Unsupported(type_name.to_string()),
    }
    let decoded = match decoder_for(type_name) {
        Decode::Bool => row.try_get_unchecked::<bool, _>(idx).map(Cell::Bool),
        Decode::Int16 | Decode::Int32 | Decode::Int => row.try_get_unchecked::<i64, _>(idx).map(Cell::Int),
        Decode::UInt => row.try_get_unchecked::<u64, _>(idx).map(Cell::UInt),
        Decode::Float32 => row.try_get_unchecked::<f32, _>(idx).map(|f| Cell::Float(f64::from(f))),
        Decode::Float64 => row.try_get_unchecked::<f64, _>(idx).map(Cell::Float),
        Decode::Decimal => row.try_get_unchecked::<rust_decimal::Decimal, _>(idx).map(Cell::Decimal),
        Decode::Timestamp => row
            .try_get_unchecked::<chrono::NaiveDateTime, _>(idx)
            .map(Cell::Timestamp),
        Decode::TimestampTz => row
            .try_get_unchecked::<chrono::DateTime<chrono::Utc>, _>(idx)
            .map(Cell::TimestampTz),
        Decode::Text => row.try_get_unchecked::<String, _>(idx).map(Cell::Text),
        Decode::Json => row.try_get_unchecked::<serde_json::Value, _>(idx).map(Cell::Json),
        Decode::Null => return Cell::Null,
        Decode::Unsupported => return Cell::Unsupported(type_name.to_string()),
    };
    decoded.unwrap_or_else(|e| {
        tracing::debug!(column = idx, type_name, error = %e, "column not decodable, rendering null");
        Cell::Unsupported(type_name.to_string())
    })
}
