//! Brands and organizers signalling interest in each other.

use axum::{
    Json, Router, debug_handler,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::info;

use crate::{
    AppError, AppResult, AppState,
    backend::{InterestStore, ProfileStore, SqliteBackend},
    model::{Interest, InterestStatus, Profile},
    notify::{Email, Notifier},
    session::current_user,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/interests", get(list))
        .route("/interests/{id}", post(respond))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InterestForm {
    pub message: Option<String>,
}

#[derive(Deserialize)]
pub struct Reply {
    pub status: InterestStatus,
}

#[derive(Serialize)]
struct Inbox {
    incoming: Vec<Interest>,
    outgoing: Vec<Interest>,
}

fn send_in_background(notifier: &Notifier, to: &Profile, subject: String, body: String) {
    let Some(to) = to.email.clone() else {
        return;
    };
    let notifier = notifier.clone();
    tokio::spawn(async move {
        notifier.send(Email { to, subject, body }).await;
    });
}

async fn record_interest(
    backend: &SqliteBackend,
    from_id: &str,
    to_id: &str,
    message: Option<String>,
) -> AppResult<(Interest, Profile, Profile)> {
    let from = backend
        .get_profile(from_id)
        .await?
        .ok_or(AppError::NotFound("profile"))?;
    let to = backend
        .get_profile(to_id)
        .await?
        .ok_or(AppError::NotFound("profile"))?;
    if to.role != from.role.counterpart() {
        return Err(AppError::Invalid(format!(
            "a {} can only express interest in a {}",
            from.role,
            from.role.counterpart()
        )));
    }

    let message = message.map(|m| m.trim().to_owned()).filter(|m| !m.is_empty());
    let interest = backend.insert_interest(&from.id, &to.id, message).await?;
    Ok((interest, from, to))
}

async fn answer_interest(
    backend: &SqliteBackend,
    user_id: &str,
    interest_id: &str,
    status: InterestStatus,
) -> AppResult<Interest> {
    let interest = backend
        .get_interest(interest_id)
        .await?
        .ok_or(AppError::NotFound("interest"))?;
    if interest.to_profile_id != user_id {
        return Err(AppError::Forbidden);
    }
    if status == InterestStatus::Pending {
        return Err(AppError::Invalid("reply must accept or decline".to_owned()));
    }
    Ok(backend.set_interest_status(interest_id, status).await?)
}

/// Mounted under `/p/{id}/interest`.
#[debug_handler(state = AppState)]
pub async fn express_interest(
    State(backend): State<SqliteBackend>,
    State(notifier): State<Notifier>,
    session: Session,
    Path(profile_id): Path<String>,
    Json(InterestForm { message }): Json<InterestForm>,
) -> AppResult<(StatusCode, Json<Interest>)> {
    let user_id = current_user(&session).await?;
    let (interest, from, to) = record_interest(&backend, &user_id, &profile_id, message).await?;
    info!("{} is interested in {}", from.name, to.name);

    let mut body = format!("{} would like to work with you.", from.name);
    if let Some(message) = &interest.message {
        body.push_str("\n\n");
        body.push_str(message);
    }
    send_in_background(&notifier, &to, format!("{} is interested in partnering", from.name), body);

    Ok((StatusCode::CREATED, Json(interest)))
}

#[debug_handler(state = AppState)]
async fn list(State(backend): State<SqliteBackend>, session: Session) -> AppResult<Json<Inbox>> {
    let user_id = current_user(&session).await?;
    let (incoming, outgoing): (Vec<Interest>, Vec<Interest>) = backend
        .list_interests(&user_id)
        .await?
        .into_iter()
        .partition(|interest| interest.to_profile_id == user_id);
    Ok(Json(Inbox { incoming, outgoing }))
}

#[debug_handler(state = AppState)]
async fn respond(
    State(backend): State<SqliteBackend>,
    State(notifier): State<Notifier>,
    session: Session,
    Path(interest_id): Path<String>,
    Json(Reply { status }): Json<Reply>,
) -> AppResult<Json<Interest>> {
    let user_id = current_user(&session).await?;
    let interest = answer_interest(&backend, &user_id, &interest_id, status).await?;

    if let (Some(sender), Some(recipient)) = (
        backend.get_profile(&interest.from_profile_id).await?,
        backend.get_profile(&interest.to_profile_id).await?,
    ) {
        send_in_background(
            &notifier,
            &sender,
            format!("{} replied to your interest", recipient.name),
            format!("{} has {} your interest.", recipient.name, status.as_str()),
        );
    }

    Ok(Json(interest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, store::community::seed_members};

    const ECO: &str = "0190a1b2-0001-7000-8000-000000000001";
    const GLOW: &str = "0190a1b2-0001-7000-8000-000000000002";
    const EXPO: &str = "0190a1b2-0001-7000-8000-000000000003";

    async fn backend() -> SqliteBackend {
        let backend = SqliteBackend::new(db::memory_pool().await.unwrap());
        backend.seed_profiles(seed_members().unwrap()).await.unwrap();
        backend
    }

    #[tokio::test]
    async fn brand_to_organizer_is_recorded() {
        let backend = backend().await;
        let (interest, from, to) =
            record_interest(&backend, ECO, EXPO, Some("  Let's talk  ".to_owned()))
                .await
                .unwrap();

        assert_eq!(from.name, "EcoRefresh");
        assert_eq!(to.name, "TechExpo");
        assert_eq!(interest.status, InterestStatus::Pending);
        assert_eq!(interest.message.as_deref(), Some("Let's talk"));
    }

    #[tokio::test]
    async fn same_role_is_rejected() {
        let backend = backend().await;
        let result = record_interest(&backend, ECO, GLOW, None).await;
        assert!(matches!(result, Err(AppError::Invalid(_))));
    }

    #[tokio::test]
    async fn only_recipient_may_answer() {
        let backend = backend().await;
        let (interest, _, _) = record_interest(&backend, ECO, EXPO, None).await.unwrap();

        let sender = answer_interest(&backend, ECO, &interest.id, InterestStatus::Accepted).await;
        assert!(matches!(sender, Err(AppError::Forbidden)));

        let pending = answer_interest(&backend, EXPO, &interest.id, InterestStatus::Pending).await;
        assert!(matches!(pending, Err(AppError::Invalid(_))));

        let accepted = answer_interest(&backend, EXPO, &interest.id, InterestStatus::Accepted)
            .await
            .unwrap();
        assert_eq!(accepted.status, InterestStatus::Accepted);
    }

    #[tokio::test]
    async fn unknown_interest_is_not_found() {
        let backend = backend().await;
        let result = answer_interest(&backend, EXPO, "nope", InterestStatus::Declined).await;
        assert!(matches!(result, Err(AppError::NotFound("interest"))));
    }
}
