//! Multi-step profile registration.
//!
//! Each step is checked on its own so the form can refuse to move forward.
//! Nothing here fails hard: problems come back as a list of field errors.

use axum::{
    Json, Router, debug_handler,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, warn};

use crate::{
    AppError, AppResult, AppState,
    backend::{ProfileStore, SqliteBackend},
    model::{Profile, Role, WhatTheySeek},
    session::USER_ID,
    store::CommunityService,
};

const NAME_MAX: usize = 80;
const DESCRIPTION_MIN: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Basics,
    Seeking,
    Review,
}

impl Step {
    pub const ALL: [Step; 3] = [Step::Basics, Step::Seeking, Step::Review];

    pub fn next(self) -> Option<Step> {
        match self {
            Step::Basics => Some(Step::Seeking),
            Step::Seeking => Some(Step::Review),
            Step::Review => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

fn field_error(field: &'static str, message: &'static str) -> FieldError {
    FieldError { field, message }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationForm {
    #[serde(alias = "type")]
    pub role: Option<Role>,
    pub name: String,
    pub email: String,
    pub description: String,
    pub short_description: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub audience_size: Option<String>,
    pub what_they_seek: WhatTheySeek,
    pub accept_terms: bool,
}

impl RegistrationForm {
    pub fn validate_step(&self, step: Step) -> Vec<FieldError> {
        let mut errors = Vec::new();
        match step {
            Step::Basics => {
                if self.role.is_none() {
                    errors.push(field_error("role", "choose brand or organizer"));
                }
                let name = self.name.trim();
                if name.is_empty() {
                    errors.push(field_error("name", "name is required"));
                } else if name.chars().count() > NAME_MAX {
                    errors.push(field_error("name", "name is too long"));
                }
                let email = self.email.trim();
                let valid_email = email
                    .split_once('@')
                    .is_some_and(|(user, domain)| !user.is_empty() && domain.contains('.'));
                if !valid_email {
                    errors.push(field_error("email", "enter a valid email address"));
                }
                if self.description.trim().chars().count() < DESCRIPTION_MIN {
                    errors.push(field_error("description", "tell partners a little more about you"));
                }
            }
            Step::Seeking => match self.role {
                Some(Role::Brand) if self.what_they_seek.sponsorship_types.is_empty() => {
                    errors.push(field_error(
                        "whatTheySeek.sponsorshipTypes",
                        "pick at least one sponsorship type",
                    ));
                }
                Some(Role::Organizer) if self.what_they_seek.event_types.is_empty() => {
                    errors.push(field_error(
                        "whatTheySeek.eventTypes",
                        "pick at least one event type",
                    ));
                }
                _ => {}
            },
            Step::Review => {
                if !self.accept_terms {
                    errors.push(field_error("acceptTerms", "accept the terms to finish"));
                }
            }
        }
        errors
    }

    pub fn can_advance(&self, step: Step) -> bool {
        self.validate_step(step).is_empty()
    }

    pub fn validate(&self) -> Vec<FieldError> {
        Step::ALL
            .into_iter()
            .flat_map(|step| self.validate_step(step))
            .collect()
    }

    pub fn into_profile(self) -> Result<Profile, Vec<FieldError>> {
        let errors = self.validate();
        let Some(role) = self.role.filter(|_| errors.is_empty()) else {
            return Err(errors);
        };

        Ok(Profile {
            id: String::new(),
            role,
            name: self.name.trim().to_owned(),
            email: Some(self.email.trim().to_lowercase()),
            description: self.description.trim().to_owned(),
            short_description: self.short_description,
            category: self.category,
            location: self.location,
            audience_size: self.audience_size,
            what_they_seek: self.what_they_seek,
            featured: false,
            created_at: String::new(),
        })
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/register/check", post(check_step))
}

#[derive(Deserialize)]
struct StepQuery {
    step: Step,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StepCheck {
    step: Step,
    errors: Vec<FieldError>,
    can_advance: bool,
    next: Option<Step>,
}

#[debug_handler]
async fn check_step(
    Query(StepQuery { step }): Query<StepQuery>,
    Json(form): Json<RegistrationForm>,
) -> Json<StepCheck> {
    let errors = form.validate_step(step);
    let can_advance = errors.is_empty();
    Json(StepCheck {
        step,
        can_advance,
        next: step.next().filter(|_| can_advance),
        errors,
    })
}

#[debug_handler(state = AppState)]
async fn register(
    State(backend): State<SqliteBackend>,
    State(community): State<CommunityService>,
    session: Session,
    Json(form): Json<RegistrationForm>,
) -> AppResult<Response> {
    let profile = match form.into_profile() {
        Ok(profile) => profile,
        Err(errors) => return Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(errors)).into_response()),
    };

    if let Some(email) = &profile.email {
        if backend.find_profile_by_email(email).await?.is_some() {
            return Err(AppError::Invalid("email already registered".to_owned()));
        }
    }

    let profile = backend.insert_profile(profile).await?;
    if let Err(e) = community.add_member(profile.clone()).await {
        warn!("registered {} but could not list them in the community: {e}", profile.id);
    }

    session.cycle_id().await?;
    session.insert(USER_ID, profile.id.clone()).await?;
    info!("registered {} as {}", profile.name, profile.role);

    Ok((StatusCode::CREATED, Json(profile)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> RegistrationForm {
        RegistrationForm {
            role: Some(Role::Organizer),
            name: " Harbor Lights Festival ".to_owned(),
            email: "Team@HarborLights.example".to_owned(),
            description: "Three nights of music and food on the waterfront.".to_owned(),
            what_they_seek: WhatTheySeek {
                event_types: vec!["Festival".to_owned()],
                ..Default::default()
            },
            accept_terms: true,
            ..Default::default()
        }
    }

    #[test]
    fn blank_basics_cannot_advance() {
        let form = RegistrationForm::default();
        let errors = form.validate_step(Step::Basics);
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["role", "name", "email", "description"]);
        assert!(!form.can_advance(Step::Basics));
    }

    #[test]
    fn seeking_depends_on_role() {
        let mut form = complete();
        form.what_they_seek.event_types.clear();
        assert!(!form.can_advance(Step::Seeking));

        form.role = Some(Role::Brand);
        form.what_they_seek.sponsorship_types = vec!["Booth".to_owned()];
        assert!(form.can_advance(Step::Seeking));
    }

    #[test]
    fn review_needs_terms() {
        let mut form = complete();
        form.accept_terms = false;
        assert_eq!(form.validate().len(), 1);
        assert!(form.into_profile().is_err());
    }

    #[test]
    fn complete_form_becomes_profile() {
        let profile = complete().into_profile().unwrap();
        assert_eq!(profile.role, Role::Organizer);
        assert_eq!(profile.name, "Harbor Lights Festival");
        assert_eq!(profile.email.as_deref(), Some("team@harborlights.example"));
        assert!(!profile.featured);
    }

    #[test]
    fn steps_run_in_order() {
        assert_eq!(Step::Basics.next(), Some(Step::Seeking));
        assert_eq!(Step::Review.next(), None);
    }
}
