//! Typed ports onto the hosted backend.
//!
//! Handlers and controllers only see these traits. `SqliteBackend` is the
//! implementation the server runs with; tests substitute small fakes.

mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{
    Conversation, DashboardStats, EventDraft, EventStatus, Interest, InterestStatus, Message,
    OrganizerEvent, Profile, ProfileUpdate, Role,
};

pub use sqlite::SqliteBackend;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("malformed {field}: {message}")]
    Malformed { field: &'static str, message: String },

    #[error("{0}")]
    Rejected(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Maps a display name back to a profile id.
#[async_trait]
pub trait ProfileLookup: Send + Sync {
    async fn find_profile_id_by_name(&self, name: &str) -> BackendResult<Option<String>>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn list_profiles(&self, role: Option<Role>) -> BackendResult<Vec<Profile>>;
    async fn get_profile(&self, id: &str) -> BackendResult<Option<Profile>>;
    async fn find_profile_by_email(&self, email: &str) -> BackendResult<Option<Profile>>;
    async fn insert_profile(&self, profile: Profile) -> BackendResult<Profile>;
    async fn update_profile(&self, id: &str, update: ProfileUpdate) -> BackendResult<Profile>;
}

#[async_trait]
pub trait SavedProfiles: Send + Sync {
    async fn saved_profile_ids(&self, user_id: &str) -> BackendResult<Vec<String>>;

    /// Returns the stored state after the toggle.
    async fn toggle_saved_profile(&self, user_id: &str, profile_id: &str) -> BackendResult<bool>;
}

/// Event rows are always scoped to the organizer that owns them.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn list_events(&self, organizer_id: &str) -> BackendResult<Vec<OrganizerEvent>>;
    async fn insert_event(
        &self,
        organizer_id: &str,
        draft: EventDraft,
        status: EventStatus,
    ) -> BackendResult<OrganizerEvent>;
    async fn update_event(
        &self,
        organizer_id: &str,
        event_id: &str,
        draft: EventDraft,
        status: Option<EventStatus>,
    ) -> BackendResult<OrganizerEvent>;
    async fn set_event_status(
        &self,
        organizer_id: &str,
        event_id: &str,
        status: EventStatus,
    ) -> BackendResult<OrganizerEvent>;
    async fn delete_event(&self, organizer_id: &str, event_id: &str) -> BackendResult<()>;
}

#[async_trait]
pub trait InterestStore: Send + Sync {
    async fn insert_interest(
        &self,
        from_profile_id: &str,
        to_profile_id: &str,
        message: Option<String>,
    ) -> BackendResult<Interest>;
    async fn get_interest(&self, id: &str) -> BackendResult<Option<Interest>>;
    /// Interests sent by or to `profile_id`, newest first.
    async fn list_interests(&self, profile_id: &str) -> BackendResult<Vec<Interest>>;
    async fn set_interest_status(&self, id: &str, status: InterestStatus) -> BackendResult<Interest>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn find_or_create_conversation(
        &self,
        brand_id: &str,
        organizer_id: &str,
    ) -> BackendResult<Conversation>;
    async fn get_conversation(&self, id: &str) -> BackendResult<Option<Conversation>>;
    async fn list_conversations(&self, profile_id: &str) -> BackendResult<Vec<Conversation>>;
    async fn insert_message(
        &self,
        conversation_id: &str,
        profile_id: &str,
        reply_to_id: Option<String>,
        content: String,
    ) -> BackendResult<Message>;
    async fn get_message(&self, conversation_id: &str, id: &str) -> BackendResult<Option<Message>>;
    async fn list_messages(&self, conversation_id: &str) -> BackendResult<Vec<Message>>;
}

#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn dashboard_stats(&self) -> BackendResult<DashboardStats>;
}
