pub mod filters;

use axum::{
    Json, Router, debug_handler,
    extract::{Query, State},
    routing::get,
};
use tracing::debug;

use crate::{
    AppResult, AppState,
    backend::{ProfileStore, SqliteBackend},
    model::{Profile, Role},
};
use filters::{DirectoryFilterParams, DirectoryQuery, Page};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/brands", get(brands))
        .route("/organizers", get(organizers))
}

#[debug_handler(state = AppState)]
async fn brands(
    State(backend): State<SqliteBackend>,
    Query(query): Query<DirectoryQuery>,
) -> AppResult<Json<Page<Profile>>> {
    listing(&backend, query, Role::Brand).await.map(Json)
}

#[debug_handler(state = AppState)]
async fn organizers(
    State(backend): State<SqliteBackend>,
    Query(query): Query<DirectoryQuery>,
) -> AppResult<Json<Page<Profile>>> {
    listing(&backend, query, Role::Organizer).await.map(Json)
}

async fn listing(
    backend: &SqliteBackend,
    query: DirectoryQuery,
    role: Role,
) -> AppResult<Page<Profile>> {
    let filters = DirectoryFilterParams::try_from(query)?;
    let records = backend.list_profiles(Some(role)).await?;

    let found: Vec<Profile> = filters::filter_by_role(&records, &filters, role)
        .into_iter()
        .cloned()
        .collect();
    debug!("{} of {} {role} profiles match", found.len(), records.len());

    Ok(filters::paginate(&found, filters.page(), filters.limit()))
}
