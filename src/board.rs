use std::sync::Arc;

use axum::{
    Json, Router, debug_handler,
    extract::{Path, State},
    routing::{get, post},
};
use serde::Serialize;
use tower_sessions::Session;

use crate::{
    AppError, AppResult, AppState,
    controllers::{BoardSnapshot, Boards, InspirationBoard, ProfileSaveMeta, Resolution},
    session::{current_user, signed_in},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/board", get(board))
        .route("/board/c/{id}/save", post(toggle_collaboration))
        .route("/board/profiles/{name}/save", post(toggle_profile))
}

#[derive(Serialize)]
struct SaveState {
    saved: bool,
}

/// The user's board once its first load has finished.
async fn loaded_board(boards: &Boards, user_id: &str) -> Arc<InspirationBoard> {
    let board = boards.for_user(user_id);
    board.ensure_loaded().await;
    board
}

async fn save_profile(board: &InspirationBoard, name: &str) -> AppResult<ProfileSaveMeta> {
    if board.toggle_save_profile(name).await.is_none() {
        return Err(match board.resolution(name) {
            Resolution::Absent => AppError::NotFound("profile"),
            _ => AppError::Invalid(
                board
                    .snapshot()
                    .error
                    .unwrap_or_else(|| "Failed to update saved profile".to_owned()),
            ),
        });
    }
    Ok(board.profile_save_meta(name))
}

#[debug_handler(state = AppState)]
async fn board(State(boards): State<Boards>, session: Session) -> AppResult<Json<BoardSnapshot>> {
    let board = match signed_in(&session).await? {
        Some(user_id) => boards.for_user(&user_id),
        None => boards.anonymous(),
    };
    board.refresh().await;
    Ok(Json(board.snapshot()))
}

#[debug_handler(state = AppState)]
async fn toggle_collaboration(
    State(boards): State<Boards>,
    session: Session,
    Path(collaboration_id): Path<String>,
) -> AppResult<Json<SaveState>> {
    let user_id = current_user(&session).await?;
    let saved = loaded_board(&boards, &user_id)
        .await
        .toggle_save_collaboration(&collaboration_id)
        .await
        .ok_or(AppError::NotFound("collaboration"))?;
    Ok(Json(SaveState { saved }))
}

#[debug_handler(state = AppState)]
async fn toggle_profile(
    State(boards): State<Boards>,
    session: Session,
    Path(name): Path<String>,
) -> AppResult<Json<ProfileSaveMeta>> {
    let user_id = current_user(&session).await?;
    let board = loaded_board(&boards, &user_id).await;
    save_profile(&board, &name).await.map(Json)
}
