use axum::{
    debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
};
use tower_sessions::Session;

use crate::{
    AppResult,
    backend::{ProfileStore, SqliteBackend},
    include_res,
    model::Profile,
    res::{self, escape},
    session::signed_in,
};

fn tags(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("<li>{}</li>", escape(item)))
        .collect()
}

pub(crate) fn render(profile: &Profile, viewer: Option<&str>) -> String {
    let seek = &profile.what_they_seek;
    let optional = |value: &Option<String>| value.as_deref().map(escape).unwrap_or_default();
    let is_owner = viewer == Some(profile.id.as_str());

    include_res!(str, "/pages/profiles/profile.html")
        .replace("{id}", &escape(&profile.id))
        .replace("{name}", &escape(&profile.name))
        .replace("{role}", profile.role.as_str())
        .replace("{counterpart}", profile.role.counterpart().as_str())
        .replace("{description}", &escape(&profile.description))
        .replace("{category}", &optional(&profile.category))
        .replace("{location}", &optional(&profile.location))
        .replace("{audience_size}", &optional(&profile.audience_size))
        .replace("{budget_range}", &optional(&seek.budget_range))
        .replace("{sponsorship_types}", &tags(&seek.sponsorship_types))
        .replace("{event_types}", &tags(&seek.event_types))
        .replace("{audience_tags}", &tags(&seek.audience_tags))
        .replace("{notes}", &optional(&seek.notes))
        .replace("{featured}", if profile.featured { "featured" } else { "" })
        .replace("{owner}", if is_owner { "owner" } else { "" })
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn profile(
    Path(profile_id): Path<String>,
    State(backend): State<SqliteBackend>,
    session: Session,
) -> AppResult<Response> {
    let Some(profile) = backend.get_profile(&profile_id).await? else {
        return res::sorry("profile");
    };

    let viewer = signed_in(&session).await?;
    Ok(Html(render(&profile, viewer.as_deref())).into_response())
}
