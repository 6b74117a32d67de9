use axum::{debug_handler, extract::State, response::{Html, IntoResponse, Redirect, Response}, Form};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;

use crate::{
    backend::{ProfileStore, SqliteBackend},
    include_res,
    session::{RETURN_URL, USER_ID},
    AppResult,
};

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub return_url: Option<String>,
}

#[debug_handler]
pub(crate) async fn login_page() -> impl IntoResponse {
    Html(include_res!(str, "/pages/login.html"))
}

/// Credentials are checked by the hosted auth service; here the verified
/// email is mapped onto the profile it belongs to.
#[debug_handler(state = crate::AppState)]
pub async fn login(
    State(backend): State<SqliteBackend>,
    session: Session,
    Form(LoginForm { email, return_url }): Form<LoginForm>,
) -> AppResult<Response> {
    let Some(profile) = backend.find_profile_by_email(&email).await? else {
        return Ok(Redirect::to("/login?unknown=1").into_response());
    };

    session.cycle_id().await?;
    session.insert(USER_ID, profile.id.clone()).await?;
    info!("welcome {} ({})", profile.name, profile.role);

    let stored: Option<String> = session.remove(RETURN_URL).await?;
    let return_url = return_url
        .filter(|url| !url.is_empty())
        .or(stored)
        .filter(|url| is_local(url))
        .unwrap_or("/".to_string());
    Ok(Redirect::to(&return_url).into_response())
}

/// Only same-site paths are followed after sign-in.
pub(crate) fn is_local(url: &str) -> bool {
    url.starts_with('/') && !url.starts_with("//")
}
