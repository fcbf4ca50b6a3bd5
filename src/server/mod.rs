pub mod handlers;
pub(crate) mod request_logging;

use axum::Router;
use std::sync::Arc;

use crate::catalog::Catalogs;
use crate::config::Settings;
use crate::entitlements::{Evaluator, EvaluatorPolicy};
use crate::error::Result as AppResult;
use crate::storage::database::Database;
use crate::storage::database_logs::RequestLogStore;
use crate::users::UserStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Settings,
    pub evaluator: Evaluator,
    pub user_store: Arc<dyn UserStore + Send + Sync>,
    pub log_store: Arc<dyn RequestLogStore + Send + Sync>,
}

pub async fn create_app(config: Settings) -> AppResult<Router> {
    let db = Arc::new(Database::new(&config.logging.database_path).await?);

    let evaluator = Evaluator::new(
        Catalogs::builtin(),
        EvaluatorPolicy {
            usage_window_hours: config.paywall.usage_window_hours,
        },
    );

    let app_state = AppState {
        config,
        evaluator,
        user_store: db.clone(),
        log_store: db,
    };

    let routes = handlers::routes();
    let mut app = Router::new()
        .merge(routes.clone())
        .nest("/api", routes)
        .with_state(Arc::new(app_state));

    // CORS（开发环境便于前端联调；生产应收敛来源并仅 HTTPS）
    use axum::http::{Method, header};
    use tower_http::cors::{AllowOrigin, CorsLayer};
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(AllowOrigin::mirror_request());
    app = app.layer(cors);
    app = app.layer(tower_http::trace::TraceLayer::new_for_http());

    Ok(app)
}
