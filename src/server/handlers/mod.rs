use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::server::AppState;

mod admin_logs;
mod paywall;
mod users;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/paywall/check/{user_id}/{feature}", get(paywall::check_access))
        .route(
            "/paywall/upgrade-options/{user_id}",
            get(paywall::upgrade_options),
        )
        .route("/paywall/upgrade/{user_id}", post(paywall::upgrade))
        .route("/paywall/remind-later/{user_id}", post(paywall::remind_later))
        .route(
            "/paywall/feature-limits/{user_id}",
            get(paywall::feature_limits),
        )
        .route("/paywall/usage/{user_id}", post(paywall::record_usage))
        .route("/users", post(users::create_user))
        .route("/users/{id}", get(users::get_user))
        .route("/admin/logs", get(admin_logs::list_logs))
}
