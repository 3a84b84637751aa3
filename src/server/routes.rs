//! API route handlers

use crate::server::AppState;
use crate::{Error, Row, RunResult};
use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct SqlRequest {
    pub sql: String,
    #[serde(default)]
    pub params: Vec<Value>,
}

#[derive(Serialize)]
pub struct QueryResponse {
    pub success: bool,
    pub data: Vec<Row>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    pub success: bool,
    pub last_insert_id: Option<i64>,
    pub changes: u64,
}

#[derive(Serialize)]
pub struct TestResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

fn internal(err: Error) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            success: false,
            error: err.to_string(),
        }),
    )
}

pub async fn query(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SqlRequest>,
) -> Result<Json<QueryResponse>, (StatusCode, Json<ErrorResponse>)> {
    let data = state
        .db
        .query(&req.sql, &req.params)
        .await
        .map_err(internal)?;
    Ok(Json(QueryResponse {
        success: true,
        data,
    }))
}

pub async fn run(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SqlRequest>,
) -> Result<Json<RunResponse>, (StatusCode, Json<ErrorResponse>)> {
    let RunResult {
        last_insert_id,
        changes,
    } = state
        .db
        .run(&req.sql, &req.params)
        .await
        .map_err(internal)?;
    Ok(Json(RunResponse {
        success: true,
        last_insert_id,
        changes,
    }))
}

pub async fn execute(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SqlRequest>,
) -> Result<Json<QueryResponse>, (StatusCode, Json<ErrorResponse>)> {
    let data = state
        .db
        .execute(&req.sql, &req.params)
        .await
        .map_err(internal)?;
    Ok(Json(QueryResponse {
        success: true,
        data,
    }))
}

pub async fn test_connection(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TestResponse>, (StatusCode, Json<ErrorResponse>)> {
    let message = state.db.probe().await.map_err(internal)?;
    Ok(Json(TestResponse {
        success: true,
        message,
    }))
}
