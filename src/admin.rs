use std::sync::Arc;

use axum::{Json, Router, debug_handler, extract::State, routing::get};
use tower_sessions::Session;
use tracing::warn;

use crate::{
    AppError, AppResult, AppState,
    backend::{SqliteBackend, StatsSource},
    config::Config,
    model::DashboardStats,
    session::current_user,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/admin", get(dashboard))
}

#[debug_handler(state = AppState)]
async fn dashboard(
    State(backend): State<SqliteBackend>,
    State(config): State<Arc<Config>>,
    session: Session,
) -> AppResult<Json<DashboardStats>> {
    let user_id = current_user(&session).await?;
    if !config.is_admin(&user_id) {
        warn!("{user_id} tried to open the admin dashboard");
        return Err(AppError::Forbidden);
    }
    Ok(Json(backend.dashboard_stats().await?))
}
