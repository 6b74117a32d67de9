use axum::{
    Json, debug_handler,
    extract::{Path, State},
};
use serde::Serialize;
use tower_sessions::Session;

use crate::{
    AppError, AppResult,
    backend::{ProfileStore, SavedProfiles, SqliteBackend},
    session::current_user,
};

#[derive(Serialize)]
pub(crate) struct SaveState {
    saved: bool,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn toggle_saved(
    Path(profile_id): Path<String>,
    State(backend): State<SqliteBackend>,
    session: Session,
) -> AppResult<Json<SaveState>> {
    let user_id = current_user(&session).await?;
    if backend.get_profile(&profile_id).await?.is_none() {
        return Err(AppError::NotFound("profile"));
    }

    let saved = backend.toggle_saved_profile(&user_id, &profile_id).await?;
    Ok(Json(SaveState { saved }))
}
