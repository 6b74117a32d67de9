use axum::{
    debug_handler,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::{
    AppResult,
    backend::{MessageStore, ProfileStore, SqliteBackend},
    include_res,
    res::escape,
    session::signed_in,
};

#[debug_handler(state = crate::AppState)]
pub async fn index(
    State(backend): State<SqliteBackend>,
    session: Session,
) -> AppResult<Response> {
    let Some(user_id) = signed_in(&session).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    let mut items = String::new();
    for conversation in backend.list_conversations(&user_id).await? {
        let other_id = crate::conversations::other_party(&conversation, &user_id);
        let Some(other) = backend.get_profile(other_id).await? else {
            continue;
        };

        items += &include_res!(str, "/pages/conversations/item.html")
            .replace("{id}", &escape(&conversation.id))
            .replace("{name}", &escape(&other.name))
            .replace("{role}", other.role.as_str());
    }

    Ok(Html(include_res!(str, "/pages/index.html").replace("{conversations}", &items)).into_response())
}
