use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::error::PaywallError;
use crate::server::AppState;
use crate::server::request_logging::log_simple_request;
use crate::storage::time::to_iso8601_utc_string;
use crate::users::{CreateUserPayload, Subscription, UserRecord};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOut {
    pub id: String,
    pub email: String,
    pub is_premium: bool,
    pub premium_since: Option<String>,
    pub subscription: Option<Subscription>,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<UserRecord> for UserOut {
    fn from(u: UserRecord) -> Self {
        Self {
            id: u.id,
            email: u.email,
            is_premium: u.is_premium,
            premium_since: u.premium_since.as_ref().map(to_iso8601_utc_string),
            subscription: u.subscription,
            version: u.version,
            created_at: to_iso8601_utc_string(&u.created_at),
            updated_at: to_iso8601_utc_string(&u.updated_at),
        }
    }
}

pub async fn create_user(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<(axum::http::StatusCode, Json<UserOut>), PaywallError> {
    let start_time = Utc::now();

    let result = app_state.user_store.create_user(payload).await;
    let (code, err, user_id) = match &result {
        Ok(u) => (201u16, None, Some(u.id.clone())),
        Err(e) => (e.status_code().as_u16(), Some(e.to_string()), None),
    };
    log_simple_request(
        &app_state,
        start_time,
        "POST",
        "/users",
        "users_create",
        user_id.as_deref(),
        None,
        None,
        code,
        err,
    )
    .await;

    let user = result?;
    Ok((axum::http::StatusCode::CREATED, Json(UserOut::from(user))))
}

pub async fn get_user(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<UserOut>, PaywallError> {
    let start_time = Utc::now();

    let result = match app_state.user_store.get_user(&id).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(PaywallError::UserNotFound(id.clone())),
        Err(e) => Err(e),
    };
    let (code, err) = match &result {
        Ok(_) => (200u16, None),
        Err(e) => (e.status_code().as_u16(), Some(e.to_string())),
    };
    let path = format!("/users/{}", id);
    log_simple_request(
        &app_state,
        start_time,
        "GET",
        &path,
        "users_get",
        Some(&id),
        None,
        None,
        code,
        err,
    )
    .await;

    Ok(Json(UserOut::from(result?)))
}
