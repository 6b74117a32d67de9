pub mod admin;
pub mod auth;
pub mod backend;
pub mod board;
pub mod community;
pub mod config;
pub mod controllers;
pub mod conversations;
pub mod db;
pub mod directory;
pub mod events;
pub mod index;
pub mod interests;
pub mod model;
pub mod notify;
pub mod onboarding;
pub mod profiles;
pub mod res;
pub mod session;
pub mod store;

use std::sync::Arc;

use axum::{extract::FromRef, http::StatusCode, response::{IntoResponse, Response}};
use sqlx::SqlitePool;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{error, info};

use backend::{BackendError, SqliteBackend};
use config::Config;
use controllers::Boards;
use conversations::ChatEvent;
use directory::filters::FilterError;
use notify::Notifier;
use store::{
    CollaborationService, CommunityService, KeyValueStore, Latency, SqliteKv, StoreError,
    collaborations::seed_collaborations, community::seed_members,
};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub backend: SqliteBackend,
    pub community: CommunityService,
    pub collaborations: CollaborationService,
    pub boards: Boards,
    pub notifier: Notifier,
    pub config: Arc<Config>,
    pub tx: broadcast::Sender<ChatEvent>,
}

impl AppState {
    /// Builds the services over `db_pool` and seeds empty stores.
    pub async fn new(config: Config, db_pool: SqlitePool) -> anyhow::Result<Self> {
        let latency = Latency::new(config.mock_latency_min_ms, config.mock_latency_max_ms);
        let kv: Arc<dyn KeyValueStore> = Arc::new(SqliteKv::new(db_pool.clone()));
        let backend = SqliteBackend::new(db_pool);

        let community = CommunityService::new(kv.clone(), latency.clone());
        let collaborations = CollaborationService::new(kv, latency);

        let members = seed_members()?;
        backend.seed_profiles(members.clone()).await?;
        if community.init(members).await? {
            info!("community members seeded");
        }
        if collaborations.init(seed_collaborations()?).await? {
            info!("collaborations seeded");
        }

        let shared = Arc::new(backend.clone());
        let boards = Boards::new(collaborations.clone(), shared.clone(), shared);

        Ok(Self {
            backend,
            community,
            collaborations,
            boards,
            notifier: Notifier::new(config.email_function_url.clone()),
            config: Arc::new(config),
            tx: broadcast::channel(64).0,
        })
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("sign in required")]
    Unauthorized,

    #[error("not allowed")]
    Forbidden,

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        match self {
            AppError::Internal(e) => {
                error!("{e:#}");
                if cfg!(debug_assertions) {
                    (status, format!("{}\n\n{}", e, e.backtrace())).into_response()
                } else {
                    (status, "internal error").into_response()
                }
            }
            other => (status, other.to_string()).into_response(),
        }
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotFound(what) => AppError::NotFound(what),
            BackendError::Rejected(message) => AppError::Invalid(message),
            other => AppError::Internal(anyhow::Error::from(other)),
        }
    }
}

impl From<FilterError> for AppError {
    fn from(err: FilterError) -> Self {
        AppError::Invalid(err.to_string())
    }
}

macro_rules! apperr_impl {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(err: $E) -> Self {
                Self::Internal(anyhow::Error::from(err))
            }
        }
    };
}

apperr_impl!(StoreError);
apperr_impl!(tower_sessions::session::Error);

/// Renders user-written Markdown. Raw HTML in the source is shown as text.
pub fn render_markdown(source: &str) -> String {
    use pulldown_cmark::{Event, Options, Parser};

    let parser = Parser::new_ext(source, Options::ENABLE_STRIKETHROUGH).map(|event| match event {
        Event::Html(html) | Event::InlineHtml(html) => Event::Text(html),
        _ => event,
    });

    let mut html_output = String::new();
    pulldown_cmark::html::push_html(&mut html_output, parser);
    html_output
}
