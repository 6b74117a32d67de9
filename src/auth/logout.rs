use axum::{
    debug_handler,
    extract::{Query, State},
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::debug;

use crate::{AppResult, controllers::Boards, session::signed_in};

#[derive(Deserialize)]
pub struct LogoutQuery {
    pub return_url: Option<String>,
}

#[debug_handler(state = crate::AppState)]
pub async fn logout(
    Query(LogoutQuery { return_url }): Query<LogoutQuery>,
    State(boards): State<Boards>,
    session: Session,
) -> AppResult<Redirect> {
    if let Some(user_id) = signed_in(&session).await? {
        if boards.forget(&user_id) {
            debug!("dropped board for {user_id}");
        }
    }
    session.clear().await;
    Ok(Redirect::to(
        return_url
            .filter(|url| super::login::is_local(url))
            .unwrap_or("/".to_string())
            .as_str(),
    ))
}
