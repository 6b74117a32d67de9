use axum::{
    Form, debug_handler,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;

use crate::{
    AppError, AppResult,
    backend::{MessageStore, ProfileStore, SqliteBackend},
    model::{Conversation, Role},
    session::{RETURN_URL, signed_in},
};

#[derive(Debug, Deserialize)]
pub(crate) struct NewConversation {
    with: String,
}

pub(crate) async fn open_conversation(
    backend: &SqliteBackend,
    user_id: &str,
    other_id: &str,
) -> AppResult<Conversation> {
    let me = backend
        .get_profile(user_id)
        .await?
        .ok_or(AppError::NotFound("profile"))?;
    let other = backend
        .get_profile(other_id)
        .await?
        .ok_or(AppError::NotFound("profile"))?;
    if other.role != me.role.counterpart() {
        return Err(AppError::Invalid(format!(
            "conversations pair a brand with an organizer, not two {}s",
            me.role
        )));
    }

    let (brand, organizer) = match me.role {
        Role::Brand => (&me, &other),
        Role::Organizer => (&other, &me),
    };
    let conversation = backend
        .find_or_create_conversation(&brand.id, &organizer.id)
        .await?;
    info!("{} and {} are talking", brand.name, organizer.name);
    Ok(conversation)
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn new_conversation(
    State(backend): State<SqliteBackend>,
    session: Session,

    Form(NewConversation { with }): Form<NewConversation>,
) -> AppResult<Response> {
    let Some(user_id) = signed_in(&session).await? else {
        session.insert(RETURN_URL, format!("/p/{with}")).await?;
        return Ok(Redirect::to("/login").into_response());
    };

    let conversation = open_conversation(&backend, &user_id, &with).await?;
    Ok(Redirect::to(&format!("/c/{}", conversation.id)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, store::community::seed_members};

    const ECO: &str = "0190a1b2-0001-7000-8000-000000000001";
    const GLOW: &str = "0190a1b2-0001-7000-8000-000000000002";
    const EXPO: &str = "0190a1b2-0001-7000-8000-000000000003";

    #[tokio::test]
    async fn either_side_opens_the_same_conversation() {
        let backend = SqliteBackend::new(db::memory_pool().await.unwrap());
        backend.seed_profiles(seed_members().unwrap()).await.unwrap();

        let from_brand = open_conversation(&backend, ECO, EXPO).await.unwrap();
        let from_organizer = open_conversation(&backend, EXPO, ECO).await.unwrap();
        assert_eq!(from_brand.id, from_organizer.id);
        assert_eq!(from_brand.brand_id, ECO);
        assert_eq!(from_brand.organizer_id, EXPO);

        let same_role = open_conversation(&backend, ECO, GLOW).await;
        assert!(matches!(same_role, Err(AppError::Invalid(_))));
    }
}
