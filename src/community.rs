use axum::{
    Json, Router, debug_handler,
    extract::{Path, Query, State},
    routing::{get, post},
};
use serde::Serialize;
use tower_sessions::Session;
use tracing::debug;

use crate::{
    AppError, AppResult, AppState,
    directory::filters::{self, DirectoryFilterParams, DirectoryQuery, Page},
    model::Profile,
    session::{current_user, signed_in},
    store::CommunityService,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/community", get(members))
        .route("/community/saved", get(saved_members))
        .route("/community/{id}/save", post(toggle_saved))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MembersPage {
    #[serde(flatten)]
    page: Page<Profile>,
    saved_ids: Vec<String>,
}

#[derive(Serialize)]
struct SaveState {
    saved: bool,
}

#[debug_handler(state = AppState)]
async fn members(
    State(community): State<CommunityService>,
    session: Session,
    Query(query): Query<DirectoryQuery>,
) -> AppResult<Json<MembersPage>> {
    let role = query.role;
    let filters = DirectoryFilterParams::try_from(query)?;

    let records = community.get_all_members().await?;
    let found: Vec<Profile> = filters::filter_members(&records, &filters, role)
        .into_iter()
        .cloned()
        .collect();
    debug!("{} of {} community members match", found.len(), records.len());

    let saved_ids = match signed_in(&session).await? {
        Some(user_id) => community.get_saved_member_ids(&user_id).await?,
        None => Vec::new(),
    };

    Ok(Json(MembersPage {
        page: filters::paginate(&found, filters.page(), filters.limit()),
        saved_ids,
    }))
}

#[debug_handler(state = AppState)]
async fn saved_members(
    State(community): State<CommunityService>,
    session: Session,
) -> AppResult<Json<Vec<Profile>>> {
    let user_id = current_user(&session).await?;
    Ok(Json(community.get_saved_members(&user_id).await?))
}

#[debug_handler(state = AppState)]
async fn toggle_saved(
    State(community): State<CommunityService>,
    session: Session,
    Path(member_id): Path<String>,
) -> AppResult<Json<SaveState>> {
    let user_id = current_user(&session).await?;
    if community.get_member(&member_id).await?.is_none() {
        return Err(AppError::NotFound("member"));
    }

    let saved = community.toggle_saved_member(&user_id, &member_id).await?;
    Ok(Json(SaveState { saved }))
}
