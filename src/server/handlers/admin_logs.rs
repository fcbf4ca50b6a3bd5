use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::PaywallError;
use crate::server::AppState;
use crate::storage::time::to_iso8601_utc_string;

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    #[serde(default)]
    pub limit: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogOut {
    pub timestamp: String,
    pub method: String,
    pub path: String,
    pub operation: String,
    pub user_id: Option<String>,
    pub feature: Option<String>,
    pub plan: Option<String>,
    pub status_code: u16,
    pub response_time_ms: i64,
    pub error: Option<String>,
}

pub async fn list_logs(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<Vec<LogOut>>, PaywallError> {
    let limit = query.limit.unwrap_or(100).clamp(1, 1000);
    let logs = app_state
        .log_store
        .get_recent_logs(limit)
        .await?
        .into_iter()
        .map(|l| LogOut {
            timestamp: to_iso8601_utc_string(&l.timestamp),
            method: l.method,
            path: l.path,
            operation: l.operation,
            user_id: l.user_id,
            feature: l.feature,
            plan: l.plan,
            status_code: l.status_code,
            response_time_ms: l.response_time_ms,
            error: l.error,
        })
        .collect();
    Ok(Json(logs))
}
