use std::sync::Arc;

use axum::{
    Json, Router, debug_handler,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{
    AppError, AppResult, AppState,
    backend::{ProfileStore, SqliteBackend},
    controllers::{EventsSnapshot, OrganizerEvents},
    model::{EventDraft, Role},
    session::current_user,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events", get(list).post(create))
        .route("/events/draft", post(save_draft))
        .route("/events/{id}", put(update).delete(delete))
        .route("/events/{id}/publish", post(publish))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DraftRequest {
    id: Option<String>,
    #[serde(flatten)]
    draft: EventDraft,
}

type Outcome = (StatusCode, Json<EventsSnapshot>);

/// The signed-in organizer's event list, already loaded.
async fn organizer_events(backend: &SqliteBackend, session: &Session) -> AppResult<OrganizerEvents> {
    let user_id = current_user(session).await?;
    let profile = backend
        .get_profile(&user_id)
        .await?
        .ok_or(AppError::NotFound("profile"))?;
    if profile.role != Role::Organizer {
        return Err(AppError::Forbidden);
    }

    let events = OrganizerEvents::new(Arc::new(backend.clone()));
    events.load(Some(&profile.id)).await;
    Ok(events)
}

fn outcome(events: &OrganizerEvents, ok: bool, success: StatusCode) -> Outcome {
    let status = if ok { success } else { StatusCode::UNPROCESSABLE_ENTITY };
    (status, Json(events.snapshot()))
}

#[debug_handler(state = AppState)]
async fn list(State(backend): State<SqliteBackend>, session: Session) -> AppResult<Json<EventsSnapshot>> {
    let events = organizer_events(&backend, &session).await?;
    Ok(Json(events.snapshot()))
}

#[debug_handler(state = AppState)]
async fn create(
    State(backend): State<SqliteBackend>,
    session: Session,
    Json(draft): Json<EventDraft>,
) -> AppResult<Outcome> {
    let events = organizer_events(&backend, &session).await?;
    let ok = events.create(draft).await;
    Ok(outcome(&events, ok, StatusCode::CREATED))
}

#[debug_handler(state = AppState)]
async fn save_draft(
    State(backend): State<SqliteBackend>,
    session: Session,
    Json(DraftRequest { id, draft }): Json<DraftRequest>,
) -> AppResult<Outcome> {
    let events = organizer_events(&backend, &session).await?;
    let ok = events.save_draft(id.as_deref(), draft).await;
    let success = if id.is_some() { StatusCode::OK } else { StatusCode::CREATED };
    Ok(outcome(&events, ok, success))
}

#[debug_handler(state = AppState)]
async fn update(
    State(backend): State<SqliteBackend>,
    session: Session,
    Path(event_id): Path<String>,
    Json(draft): Json<EventDraft>,
) -> AppResult<Outcome> {
    let events = organizer_events(&backend, &session).await?;
    let ok = events.update(&event_id, draft).await;
    Ok(outcome(&events, ok, StatusCode::OK))
}

#[debug_handler(state = AppState)]
async fn delete(
    State(backend): State<SqliteBackend>,
    session: Session,
    Path(event_id): Path<String>,
) -> AppResult<Outcome> {
    let events = organizer_events(&backend, &session).await?;
    let ok = events.delete(&event_id).await;
    Ok(outcome(&events, ok, StatusCode::OK))
}

#[debug_handler(state = AppState)]
async fn publish(
    State(backend): State<SqliteBackend>,
    session: Session,
    Path(event_id): Path<String>,
) -> AppResult<Outcome> {
    let events = organizer_events(&backend, &session).await?;
    let ok = events.publish(&event_id).await;
    Ok(outcome(&events, ok, StatusCode::OK))
}
