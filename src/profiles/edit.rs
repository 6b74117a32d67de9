use axum::{
    Json, debug_handler,
    extract::{Path, State},
};
use tower_sessions::Session;
use tracing::info;

use crate::{
    AppError, AppResult,
    backend::{ProfileStore, SqliteBackend},
    model::{Profile, ProfileUpdate},
    session::current_user,
};

/// Owners edit their own profile. The role cannot change.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn edit_profile(
    Path(profile_id): Path<String>,
    State(backend): State<SqliteBackend>,
    session: Session,
    Json(update): Json<ProfileUpdate>,
) -> AppResult<Json<Profile>> {
    if current_user(&session).await? != profile_id {
        return Err(AppError::Forbidden);
    }
    if update.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(AppError::Invalid("name is required".to_owned()));
    }

    let profile = backend.update_profile(&profile_id, update).await?;
    info!("{} updated their profile", profile.name);
    Ok(Json(profile))
}
