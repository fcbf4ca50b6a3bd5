use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::PaywallError;
use crate::storage::database::Database;
use crate::storage::time::{parse_utc_string, to_utc_string};

#[derive(Debug, Clone)]
pub struct RequestLog {
    #[allow(dead_code)]
    pub id: Option<i64>,
    pub timestamp: DateTime<Utc>,
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

#[async_trait]
pub trait RequestLogStore: Send + Sync {
    async fn log_request(&self, log: RequestLog) -> Result<i64, PaywallError>;
    async fn get_recent_logs(&self, limit: i32) -> Result<Vec<RequestLog>, PaywallError>;
}

#[async_trait]
impl RequestLogStore for Database {
    async fn log_request(&self, log: RequestLog) -> Result<i64, PaywallError> {
        let conn = self.connection.lock().await;
        conn.execute(
            "INSERT INTO request_logs (
                timestamp, method, path, operation, user_id,
                feature, plan, status_code, response_time_ms, error
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                to_utc_string(&log.timestamp),
                &log.method,
                &log.path,
                &log.operation,
                &log.user_id,
                &log.feature,
                &log.plan,
                log.status_code,
                log.response_time_ms,
                &log.error,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    async fn get_recent_logs(&self, limit: i32) -> Result<Vec<RequestLog>, PaywallError> {
        let conn = self.connection.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, timestamp, method, path, operation, user_id,
                    feature, plan, status_code, response_time_ms, error
             FROM request_logs ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit], |row| {
            let ts_s: String = row.get(1)?;
            Ok((
                RequestLog {
                    id: Some(row.get(0)?),
                    timestamp: Utc::now(),
                    method: row.get(2)?,
                    path: row.get(3)?,
                    operation: row.get(4)?,
                    user_id: row.get(5)?,
                    feature: row.get(6)?,
                    plan: row.get(7)?,
                    status_code: row.get(8)?,
                    response_time_ms: row.get(9)?,
                    error: row.get(10)?,
                },
                ts_s,
            ))
        })?;

        let mut logs = Vec::new();
        for row in rows {
            let (mut log, ts_s) = row?;
            log.timestamp = parse_utc_string(&ts_s)?;
            logs.push(log);
        }
        Ok(logs)
    }
}
