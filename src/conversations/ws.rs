use axum::{
    debug_handler,
    extract::{Path, State, WebSocketUpgrade},
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tower_sessions::Session;
use tracing::{debug, warn};

use crate::{AppError, AppResult, backend::SqliteBackend, session::current_user};

use super::{ChatEvent, joined, msg};

#[debug_handler(state = crate::AppState)]
pub async fn thread_ws(
    Path(conversation_id): Path<String>,
    State(backend): State<SqliteBackend>,
    State(tx): State<broadcast::Sender<ChatEvent>>,
    session: Session,

    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let profile_id = current_user(&session).await?;
    if joined(&backend, &conversation_id, &profile_id).await?.is_none() {
        return Err(AppError::NotFound("conversation"));
    }

    Ok(ws.on_upgrade(async move |stream| {
        let mut rx = tx.subscribe();
        let (mut sender, mut receiver) = stream.split();

        let watching = conversation_id.clone();
        let mut broadcast_task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) if event.conversation_id == watching => {
                        if sender.send(event.html.into()).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "socket fell behind");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        loop {
            tokio::select! {
                _ = &mut broadcast_task => break,
                incoming = receiver.next() => {
                    let Some(Ok(incoming)) = incoming else {
                        break;
                    };
                    let Ok(message) = serde_json::from_slice(&incoming.into_data()) else {
                        continue;
                    };
                    if let Err(e) = msg::send_msg(&backend, &tx, &conversation_id, &profile_id, message).await {
                        warn!("message to {conversation_id} dropped: {e}");
                    }
                }
            }
        }

        broadcast_task.abort();
    }))
}
