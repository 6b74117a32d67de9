use serde::Deserialize;
use tokio::sync::broadcast;

use crate::{
    AppError, AppResult,
    backend::{MessageStore, ProfileStore, SqliteBackend},
    include_res,
    model::Message,
    render_markdown,
    res::escape,
};

use super::ChatEvent;

#[derive(Debug, Deserialize)]
pub(crate) struct SendMessage {
    reply_to_id: Option<String>,
    content: String,
}

pub(crate) async fn send_msg(
    backend: &SqliteBackend,
    tx: &broadcast::Sender<ChatEvent>,

    conversation_id: &str,
    profile_id: &str,

    SendMessage { reply_to_id, content }: SendMessage,
) -> AppResult<Message> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::Invalid("message is empty".to_owned()));
    }

    let message = backend
        .insert_message(conversation_id, profile_id, reply_to_id, content.to_owned())
        .await?;

    // no subscribers is fine
    let _ = tx.send(ChatEvent {
        conversation_id: conversation_id.to_owned(),
        html: msg_to_html(backend, &message).await?,
    });

    Ok(message)
}

pub(crate) async fn msg_to_html(backend: &SqliteBackend, message: &Message) -> AppResult<String> {
    let name = backend
        .get_profile(&message.profile_id)
        .await?
        .map(|profile| profile.name)
        .unwrap_or_else(|| "Someone".to_owned());

    let reply_to = match &message.reply_to_id {
        Some(reply_to_id) => backend
            .get_message(&message.conversation_id, reply_to_id)
            .await?
            .map(|reply| escape(&reply.content))
            .unwrap_or_default(),
        None => String::new(),
    };

    Ok(include_res!(str, "/pages/conversations/message.html")
        .replace("{id}", &escape(&message.id))
        .replace("{profile_id}", &escape(&message.profile_id))
        .replace("{reply_to_id}", &escape(message.reply_to_id.as_deref().unwrap_or_default()))
        .replace("{reply_to}", &reply_to)
        .replace("{name}", &escape(&name))
        .replace("{created_at}", &escape(&message.created_at))
        .replace("{content}", &render_markdown(&message.content)))
}
