//! Response envelopes: `{"result": ...}`, `{"databases": [...]}`, `{"ERROR": "..."}`.

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct ResultBody<T> {
    pub result: T,
}

#[derive(Serialize)]
pub struct DatabaseList {
    pub databases: Vec<String>,
}

#[derive(Serialize)]
pub struct EnvironmentList {
    pub environments: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    #[serde(rename = "ERROR")]
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        ErrorBody { error: message.into() }
    }
}

pub fn success_result<T: Serialize>(result: T) -> (StatusCode, Json<ResultBody<T>>) {
    (StatusCode::OK, Json(ResultBody { result }))
}

pub fn database_list(databases: Vec<String>) -> (StatusCode, Json<DatabaseList>) {
    (StatusCode::OK, Json(DatabaseList { databases }))
}

pub fn environment_list(environments: Vec<String>) -> (StatusCode, Json<EnvironmentList>) {
    (StatusCode::OK, Json(EnvironmentList { environments }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelopes_use_documented_keys() {
        let (_, Json(body)) = success_result(7u64);
        assert_eq!(serde_json::to_value(body).unwrap(), serde_json::json!({"result": 7}));

        let (_, Json(body)) = database_list(vec!["sales".into()]);
        assert_eq!(serde_json::to_value(body).unwrap(), serde_json::json!({"databases": ["sales"]}));

        let body = ErrorBody::new("nope");
        assert_eq!(serde_json::to_value(body).unwrap(), serde_json::json!({"ERROR": "nope"}));
    }
}
