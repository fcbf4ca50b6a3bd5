use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaywallError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Time parse error: {0}")]
    TimeParse(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("unknown feature: {0}")]
    UnknownFeature(String),

    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),
}

impl PaywallError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PaywallError::UserNotFound(_) => StatusCode::NOT_FOUND,
            PaywallError::UnknownFeature(_)
            | PaywallError::InvalidPlan(_)
            | PaywallError::Validation(_) => StatusCode::BAD_REQUEST,
            PaywallError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PaywallError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {}", self);
        }
        let body = Json(serde_json::json!({
            "success": false,
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, PaywallError>;
