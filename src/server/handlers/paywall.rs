use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use crate::entitlements::UpgradeOptions;
use crate::error::PaywallError;
use crate::server::AppState;
use crate::server::request_logging::log_simple_request;
use crate::users::UserRecord;

async fn load_user(app_state: &AppState, user_id: &str) -> Result<UserRecord, PaywallError> {
    app_state
        .user_store
        .get_user(user_id)
        .await?
        .ok_or_else(|| PaywallError::UserNotFound(user_id.to_string()))
}

/// Shared tail of every paywall handler: log the outcome, then wrap the
/// payload in the `{success, data}` envelope the frontend expects.
#[allow(clippy::too_many_arguments)]
async fn finish(
    app_state: &AppState,
    start_time: chrono::DateTime<Utc>,
    method: &str,
    path: &str,
    operation: &str,
    user_id: Option<&str>,
    feature: Option<&str>,
    plan: Option<&str>,
    result: Result<serde_json::Value, PaywallError>,
) -> Result<Json<serde_json::Value>, PaywallError> {
    let (code, err) = match &result {
        Ok(_) => (200u16, None),
        Err(e) => (e.status_code().as_u16(), Some(e.to_string())),
    };
    log_simple_request(
        app_state, start_time, method, path, operation, user_id, feature, plan, code, err,
    )
    .await;

    let data = result?;
    Ok(Json(serde_json::json!({
        "success": true,
        "data": data,
    })))
}

pub async fn check_access(
    State(app_state): State<Arc<AppState>>,
    Path((user_id, feature)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, PaywallError> {
    let start_time = Utc::now();

    let result = async {
        let user = load_user(&app_state, &user_id).await?;
        let access = app_state.evaluator.check_access(&user, &feature, Utc::now())?;
        Ok(serde_json::json!(access))
    }
    .await;

    let path = format!("/paywall/check/{}/{}", user_id, feature);
    finish(
        &app_state,
        start_time,
        "GET",
        &path,
        "paywall_check",
        Some(&user_id),
        Some(&feature),
        None,
        result,
    )
    .await
}

pub async fn upgrade_options(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<serde_json::Value>, PaywallError> {
    let start_time = Utc::now();

    let result = async {
        let user = load_user(&app_state, &user_id).await?;
        let options = app_state.evaluator.upgrade_options(&user, Utc::now());
        Ok(match options {
            UpgradeOptions::AlreadyPremium { subscription } => serde_json::json!({
                "alreadyPremium": true,
                "subscription": subscription,
            }),
            UpgradeOptions::Available {
                plans,
                features,
                usage,
            } => serde_json::json!({
                "alreadyPremium": false,
                "plans": plans,
                "features": features,
                "usage": usage,
            }),
        })
    }
    .await;

    let path = format!("/paywall/upgrade-options/{}", user_id);
    finish(
        &app_state,
        start_time,
        "GET",
        &path,
        "paywall_upgrade_options",
        Some(&user_id),
        None,
        None,
        result,
    )
    .await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeRequest {
    pub plan_id: String,
    pub payment_method: String,
}

pub async fn upgrade(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(payload): Json<UpgradeRequest>,
) -> Result<Json<serde_json::Value>, PaywallError> {
    let start_time = Utc::now();

    let result = async {
        let mut user = load_user(&app_state, &user_id).await?;
        let subscription = app_state.evaluator.apply_upgrade(
            &mut user,
            &payload.plan_id,
            &payload.payment_method,
            Utc::now(),
        )?;
        app_state.user_store.save_user(&user).await?;
        let features: Vec<_> = app_state
            .evaluator
            .catalogs()
            .features
            .iter()
            .cloned()
            .collect();
        Ok(serde_json::json!({
            "subscription": subscription,
            "features": features,
        }))
    }
    .await;

    let path = format!("/paywall/upgrade/{}", user_id);
    finish(
        &app_state,
        start_time,
        "POST",
        &path,
        "paywall_upgrade",
        Some(&user_id),
        None,
        Some(&payload.plan_id),
        result,
    )
    .await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemindLaterRequest {
    pub feature: String,
    #[serde(default)]
    pub remind_in_hours: Option<i64>,
}

pub async fn remind_later(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(payload): Json<RemindLaterRequest>,
) -> Result<Json<serde_json::Value>, PaywallError> {
    let start_time = Utc::now();

    let result = async {
        let mut user = load_user(&app_state, &user_id).await?;
        let entry = app_state.evaluator.schedule_reminder(
            &mut user,
            &payload.feature,
            payload.remind_in_hours,
            Utc::now(),
        )?;
        app_state.user_store.save_user(&user).await?;
        Ok(serde_json::json!(entry))
    }
    .await;

    let path = format!("/paywall/remind-later/{}", user_id);
    finish(
        &app_state,
        start_time,
        "POST",
        &path,
        "paywall_remind_later",
        Some(&user_id),
        Some(&payload.feature),
        None,
        result,
    )
    .await
}

pub async fn feature_limits(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<serde_json::Value>, PaywallError> {
    let start_time = Utc::now();

    let result = async {
        let user = load_user(&app_state, &user_id).await?;
        let rows = app_state.evaluator.feature_limits(&user, Utc::now());
        Ok(serde_json::json!(rows))
    }
    .await;

    let path = format!("/paywall/feature-limits/{}", user_id);
    finish(
        &app_state,
        start_time,
        "GET",
        &path,
        "paywall_feature_limits",
        Some(&user_id),
        None,
        None,
        result,
    )
    .await
}

#[derive(Debug, Deserialize)]
pub struct RecordUsageRequest {
    pub feature: String,
}

pub async fn record_usage(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(payload): Json<RecordUsageRequest>,
) -> Result<Json<serde_json::Value>, PaywallError> {
    let start_time = Utc::now();

    let result = async {
        let mut user = load_user(&app_state, &user_id).await?;
        let count = app_state
            .evaluator
            .record_usage(&mut user, &payload.feature, Utc::now())?;
        app_state.user_store.save_user(&user).await?;
        Ok(serde_json::json!({
            "feature": payload.feature,
            "currentUsage": count,
        }))
    }
    .await;

    let path = format!("/paywall/usage/{}", user_id);
    finish(
        &app_state,
        start_time,
        "POST",
        &path,
        "paywall_record_usage",
        Some(&user_id),
        Some(&payload.feature),
        None,
        result,
    )
    .await
}
