//! Axum route handlers for the status RPC surface.

use crate::db::Db;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use birthday_types::{BirthdayRecord, DailyRunSummary, RpcResponse, StatusResponse};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

pub struct AppState {
    pub db: Arc<Db>,
    pub start_time: Instant,
    pub last_tick_at: Arc<Mutex<Option<String>>>,
    pub last_run: Arc<Mutex<Option<DailyRunSummary>>>,
    pub poll_interval_secs: u64,
}

// GET /rpc/status
pub async fn status(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<RpcResponse<StatusResponse>>) {
    let record_count = state.db.count_birthdays().unwrap_or(0);
    let last_tick_at = state.last_tick_at.lock().await.clone();
    let last_run = state.last_run.lock().await.clone();

    let resp = StatusResponse {
        service: "birthday-service".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        record_count,
        poll_interval_secs: state.poll_interval_secs,
        last_tick_at,
        last_run,
    };
    (StatusCode::OK, Json(RpcResponse::ok(resp)))
}

// GET /rpc/birthdays/list
pub async fn birthdays_list(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<RpcResponse<Vec<BirthdayRecord>>>) {
    match state.db.list_birthdays() {
        Ok(entries) => (StatusCode::OK, Json(RpcResponse::ok(entries))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(RpcResponse::err(format!("Failed to list: {}", e))),
        ),
    }
}
