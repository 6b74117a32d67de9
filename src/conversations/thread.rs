use axum::{
    debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::{
    AppResult,
    backend::{MessageStore, ProfileStore, SqliteBackend},
    include_res,
    res::{self, escape},
    session::{RETURN_URL, signed_in},
};

use super::{joined, msg, other_party};

#[debug_handler(state = crate::AppState)]
pub(crate) async fn thread(
    State(backend): State<SqliteBackend>,
    session: Session,
    Path(conversation_id): Path<String>,
) -> AppResult<Response> {
    let Some(user_id) = signed_in(&session).await? else {
        session.insert(RETURN_URL, format!("/c/{conversation_id}")).await?;
        return Ok(Redirect::to("/login").into_response());
    };
    let Some(conversation) = joined(&backend, &conversation_id, &user_id).await? else {
        return res::sorry("conversation");
    };

    let title = backend
        .get_profile(other_party(&conversation, &user_id))
        .await?
        .map(|profile| profile.name)
        .unwrap_or_else(|| "Conversation".to_owned());

    let mut messages = String::new();
    for message in backend.list_messages(&conversation.id).await? {
        messages += &msg::msg_to_html(&backend, &message).await?;
    }

    let body = include_res!(str, "/pages/conversations/thread.html")
        .replace("{conversation_id}", &escape(&conversation.id))
        .replace("{title}", &escape(&title))
        .replace("{messages}", &messages);

    Ok(Html(body).into_response())
}
