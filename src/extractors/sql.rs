//! Pull SQL text from the request body or the query string.

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, Uri},
};
use serde::Deserialize;

use crate::error::AppError;

/// SQL text carried by a request. `None` when no source held a non-empty `sql`.
///
/// Sources in order: a JSON body `{"sql": ...}`, a form-encoded body `sql=...`,
/// then the query string `?sql=...`. A body that cannot be read is rejected
/// with the status of the failure (413 when over the size limit).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SqlText(pub Option<String>);

#[derive(Deserialize)]
struct SqlField {
    sql: Option<String>,
}

#[async_trait]
impl<S> FromRequest<S> for SqlText
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.trim_start().starts_with("application/json"))
            .unwrap_or(false);
        let from_query = sql_from_query(req.uri());

        let from_body = match Bytes::from_request(req, state).await {
            Ok(body) if !body.is_empty() => {
                if is_json {
                    sql_from_json(&body)
                } else {
                    sql_from_form(&body)
                }
            }
            Ok(_) => None,
            Err(e) => {
                return Err(AppError::UnreadableBody {
                    status: e.status(),
                    message: e.body_text(),
                })
            }
        };
        Ok(SqlText(from_body.or(from_query)))
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn sql_from_json(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<SqlField>(body)
        .ok()
        .and_then(|field| field.sql)
        .and_then(non_empty)
}

fn sql_from_form(body: &[u8]) -> Option<String> {
    url::form_urlencoded::parse(body)
        .find(|(key, _)| key == "sql")
        .and_then(|(_, value)| non_empty(value.into_owned()))
}

fn sql_from_query(uri: &Uri) -> Option<String> {
    uri.query().and_then(|q| sql_from_form(q.as_bytes()))
}
