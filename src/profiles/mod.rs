mod edit;
mod page;
mod save;

use axum::{Router, routing::{get, post}};

use crate::{AppState, interests};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(page::profile).post(edit::edit_profile))
        .route("/{id}/save", post(save::toggle_saved))
        .route("/{id}/interest", post(interests::express_interest))
}
