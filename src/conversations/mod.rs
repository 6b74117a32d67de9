mod msg;
mod new;
mod thread;
mod ws;

use axum::{
    Router,
    routing::{get, post},
};

use crate::{
    AppResult, AppState,
    backend::{MessageStore, SqliteBackend},
    model::Conversation,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/new", post(new::new_conversation))
        .route("/{id}", get(thread::thread))
        .route("/{id}/ws", get(ws::thread_ws))
}

/// A rendered message on its way to everyone watching `conversation_id`.
#[derive(Debug, Clone)]
pub struct ChatEvent {
    pub conversation_id: String,
    pub html: String,
}

/// The conversation, if it exists and `profile_id` takes part in it.
pub(crate) async fn joined(
    backend: &SqliteBackend,
    conversation_id: &str,
    profile_id: &str,
) -> AppResult<Option<Conversation>> {
    Ok(backend
        .get_conversation(conversation_id)
        .await?
        .filter(|conversation| conversation.includes(profile_id)))
}

/// The profile on the other side of `conversation`.
pub(crate) fn other_party<'a>(conversation: &'a Conversation, profile_id: &str) -> &'a str {
    if conversation.brand_id == profile_id {
        &conversation.organizer_id
    } else {
        &conversation.brand_id
    }
}
