use async_trait::async_trait;
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::model::{
    Conversation, DashboardStats, EventDraft, EventStatus, Interest, InterestStatus, Message,
    OrganizerEvent, Profile, ProfileUpdate, Role, WhatTheySeek, now_rfc3339,
};

use super::{
    BackendError, BackendResult, EventStore, InterestStore, MessageStore, ProfileLookup,
    ProfileStore, SavedProfiles, StatsSource,
};

const PROFILE_COLUMNS: &str = "id,role,name,email,description,short_description,category,location,audience_size,what_they_seek,featured,created_at";
const PROFILE_ORDER: &str = "ORDER BY featured DESC, created_at DESC";
const EVENT_COLUMNS: &str = "id,organizer_id,title,description,event_type,location,starts_at,expected_audience,status,created_at,updated_at";
const INTEREST_COLUMNS: &str = "id,from_profile_id,to_profile_id,message,status,created_at";
const MESSAGE_COLUMNS: &str = "id,conversation_id,profile_id,reply_to_id,content,created_at";

#[derive(FromRow)]
struct ProfileRow {
    id: String,
    role: String,
    name: String,
    email: Option<String>,
    description: String,
    short_description: Option<String>,
    category: Option<String>,
    location: Option<String>,
    audience_size: Option<String>,
    what_they_seek: String,
    featured: bool,
    created_at: String,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = BackendError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let role = row.role.parse::<Role>().map_err(|message| BackendError::Malformed {
            field: "profiles.role",
            message,
        })?;
        let what_they_seek: WhatTheySeek =
            serde_json::from_str(&row.what_they_seek).map_err(|e| BackendError::Malformed {
                field: "profiles.what_they_seek",
                message: e.to_string(),
            })?;

        Ok(Profile {
            id: row.id,
            role,
            name: row.name,
            email: row.email,
            description: row.description,
            short_description: row.short_description,
            category: row.category,
            location: row.location,
            audience_size: row.audience_size,
            what_they_seek,
            featured: row.featured,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct EventRow {
    id: String,
    organizer_id: String,
    title: String,
    description: String,
    event_type: Option<String>,
    location: Option<String>,
    starts_at: Option<String>,
    expected_audience: Option<i64>,
    status: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<EventRow> for OrganizerEvent {
    type Error = BackendError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let status = row.status.parse().map_err(|message| BackendError::Malformed {
            field: "organizer_events.status",
            message,
        })?;
        Ok(OrganizerEvent {
            id: row.id,
            organizer_id: row.organizer_id,
            title: row.title,
            description: row.description,
            event_type: row.event_type,
            location: row.location,
            starts_at: row.starts_at,
            expected_audience: row.expected_audience,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct InterestRow {
    id: String,
    from_profile_id: String,
    to_profile_id: String,
    message: Option<String>,
    status: String,
    created_at: String,
}

impl TryFrom<InterestRow> for Interest {
    type Error = BackendError;

    fn try_from(row: InterestRow) -> Result<Self, Self::Error> {
        let status = row.status.parse().map_err(|message| BackendError::Malformed {
            field: "interests.status",
            message,
        })?;
        Ok(Interest {
            id: row.id,
            from_profile_id: row.from_profile_id,
            to_profile_id: row.to_profile_id,
            message: row.message,
            status,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct MessageRow {
    id: String,
    conversation_id: String,
    profile_id: String,
    reply_to_id: Option<String>,
    content: String,
    created_at: String,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            id: row.id,
            conversation_id: row.conversation_id,
            profile_id: row.profile_id,
            reply_to_id: row.reply_to_id,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

fn conversation((id, brand_id, organizer_id, created_at): (String, String, String, String)) -> Conversation {
    Conversation {
        id,
        brand_id,
        organizer_id,
        created_at,
    }
}

fn encode_seek(what_they_seek: &WhatTheySeek) -> BackendResult<String> {
    serde_json::to_string(what_they_seek).map_err(|e| BackendError::Malformed {
        field: "profiles.what_they_seek",
        message: e.to_string(),
    })
}

#[derive(Clone)]
pub struct SqliteBackend {
    db_pool: SqlitePool,
}

impl SqliteBackend {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self { db_pool }
    }

    /// Inserts `profiles` only into an empty table.
    pub async fn seed_profiles(&self, profiles: Vec<Profile>) -> BackendResult<bool> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM profiles")
            .fetch_one(&self.db_pool)
            .await?;
        if count > 0 {
            return Ok(false);
        }

        info!(count = profiles.len(), "seeding profiles");
        for profile in profiles {
            self.insert_profile(profile).await?;
        }
        Ok(true)
    }

    async fn fetch_event(&self, organizer_id: &str, event_id: &str) -> BackendResult<OrganizerEvent> {
        let row: Option<EventRow> = sqlx::query_as(&format!(
            "SELECT {EVENT_COLUMNS} FROM organizer_events WHERE id=? AND organizer_id=?"
        ))
        .bind(event_id)
        .bind(organizer_id)
        .fetch_optional(&self.db_pool)
        .await?;
        row.ok_or(BackendError::NotFound("event"))?.try_into()
    }

    async fn count(&self, sql: &str) -> BackendResult<i64> {
        let (count,): (i64,) = sqlx::query_as(sql).fetch_one(&self.db_pool).await?;
        Ok(count)
    }
}

#[async_trait]
impl ProfileLookup for SqliteBackend {
    async fn find_profile_id_by_name(&self, name: &str) -> BackendResult<Option<String>> {
        debug!(name, "looking up profile id");
        let id: Option<(String,)> =
            sqlx::query_as("SELECT id FROM profile_overview WHERE lower(name)=lower(?) LIMIT 1")
                .bind(name.trim())
                .fetch_optional(&self.db_pool)
                .await?;
        Ok(id.map(|(id,)| id))
    }
}

#[async_trait]
impl ProfileStore for SqliteBackend {
    async fn list_profiles(&self, role: Option<Role>) -> BackendResult<Vec<Profile>> {
        let rows: Vec<ProfileRow> = match role {
            Some(role) => {
                sqlx::query_as(&format!("SELECT {PROFILE_COLUMNS} FROM profile_overview WHERE role=? {PROFILE_ORDER}"))
                    .bind(role.as_str())
                    .fetch_all(&self.db_pool)
                    .await?
            }
            None => {
                sqlx::query_as(&format!("SELECT {PROFILE_COLUMNS} FROM profile_overview {PROFILE_ORDER}"))
                    .fetch_all(&self.db_pool)
                    .await?
            }
        };
        rows.into_iter().map(Profile::try_from).collect()
    }

    async fn get_profile(&self, id: &str) -> BackendResult<Option<Profile>> {
        let row: Option<ProfileRow> =
            sqlx::query_as(&format!("SELECT {PROFILE_COLUMNS} FROM profile_overview WHERE id=?"))
                .bind(id)
                .fetch_optional(&self.db_pool)
                .await?;
        row.map(Profile::try_from).transpose()
    }

    async fn find_profile_by_email(&self, email: &str) -> BackendResult<Option<Profile>> {
        let row: Option<ProfileRow> = sqlx::query_as(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profile_overview WHERE lower(email)=lower(?)"
        ))
        .bind(email.trim())
        .fetch_optional(&self.db_pool)
        .await?;
        row.map(Profile::try_from).transpose()
    }

    async fn insert_profile(&self, mut profile: Profile) -> BackendResult<Profile> {
        if profile.id.is_empty() {
            profile.id = Uuid::now_v7().to_string();
        }
        if profile.created_at.is_empty() {
            profile.created_at = now_rfc3339();
        }

        sqlx::query(&format!(
            "INSERT INTO profiles ({PROFILE_COLUMNS}) VALUES (?,?,?,?,?,?,?,?,?,?,?,?)"
        ))
        .bind(&profile.id)
        .bind(profile.role.as_str())
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.description)
        .bind(&profile.short_description)
        .bind(&profile.category)
        .bind(&profile.location)
        .bind(&profile.audience_size)
        .bind(encode_seek(&profile.what_they_seek)?)
        .bind(profile.featured)
        .bind(&profile.created_at)
        .execute(&self.db_pool)
        .await?;

        Ok(profile)
    }

    async fn update_profile(&self, id: &str, update: ProfileUpdate) -> BackendResult<Profile> {
        let mut profile = self
            .get_profile(id)
            .await?
            .ok_or(BackendError::NotFound("profile"))?;
        update.apply(&mut profile);

        sqlx::query(
            "UPDATE profiles SET name=?,description=?,short_description=?,category=?,location=?,audience_size=?,what_they_seek=? WHERE id=?",
        )
        .bind(&profile.name)
        .bind(&profile.description)
        .bind(&profile.short_description)
        .bind(&profile.category)
        .bind(&profile.location)
        .bind(&profile.audience_size)
        .bind(encode_seek(&profile.what_they_seek)?)
        .bind(id)
        .execute(&self.db_pool)
        .await?;

        Ok(profile)
    }
}

#[async_trait]
impl SavedProfiles for SqliteBackend {
    async fn saved_profile_ids(&self, user_id: &str) -> BackendResult<Vec<String>> {
        let ids: Vec<(String,)> =
            sqlx::query_as("SELECT profile_id FROM saved_profiles WHERE user_id=? ORDER BY created_at")
                .bind(user_id)
                .fetch_all(&self.db_pool)
                .await?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    async fn toggle_saved_profile(&self, user_id: &str, profile_id: &str) -> BackendResult<bool> {
        let removed = sqlx::query("DELETE FROM saved_profiles WHERE user_id=? AND profile_id=?")
            .bind(user_id)
            .bind(profile_id)
            .execute(&self.db_pool)
            .await?
            .rows_affected();
        if removed > 0 {
            return Ok(false);
        }

        sqlx::query("INSERT INTO saved_profiles (user_id,profile_id,created_at) VALUES (?,?,?)")
            .bind(user_id)
            .bind(profile_id)
            .bind(now_rfc3339())
            .execute(&self.db_pool)
            .await?;
        Ok(true)
    }
}

#[async_trait]
impl EventStore for SqliteBackend {
    async fn list_events(&self, organizer_id: &str) -> BackendResult<Vec<OrganizerEvent>> {
        let rows: Vec<EventRow> = sqlx::query_as(&format!(
            "SELECT {EVENT_COLUMNS} FROM organizer_events WHERE organizer_id=? ORDER BY rowid DESC"
        ))
        .bind(organizer_id)
        .fetch_all(&self.db_pool)
        .await?;
        rows.into_iter().map(OrganizerEvent::try_from).collect()
    }

    async fn insert_event(
        &self,
        organizer_id: &str,
        draft: EventDraft,
        status: EventStatus,
    ) -> BackendResult<OrganizerEvent> {
        let id = Uuid::now_v7().to_string();
        let now = now_rfc3339();
        sqlx::query(&format!(
            "INSERT INTO organizer_events ({EVENT_COLUMNS}) VALUES (?,?,?,?,?,?,?,?,?,?,?)"
        ))
        .bind(&id)
        .bind(organizer_id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(&draft.event_type)
        .bind(&draft.location)
        .bind(&draft.starts_at)
        .bind(draft.expected_audience)
        .bind(status.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&self.db_pool)
        .await?;

        self.fetch_event(organizer_id, &id).await
    }

    async fn update_event(
        &self,
        organizer_id: &str,
        event_id: &str,
        draft: EventDraft,
        status: Option<EventStatus>,
    ) -> BackendResult<OrganizerEvent> {
        let updated = sqlx::query(
            "UPDATE organizer_events SET title=?,description=?,event_type=?,location=?,starts_at=?,expected_audience=?,status=COALESCE(?,status),updated_at=? WHERE id=? AND organizer_id=?",
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(&draft.event_type)
        .bind(&draft.location)
        .bind(&draft.starts_at)
        .bind(draft.expected_audience)
        .bind(status.map(|s| s.as_str()))
        .bind(now_rfc3339())
        .bind(event_id)
        .bind(organizer_id)
        .execute(&self.db_pool)
        .await?
        .rows_affected();
        if updated == 0 {
            return Err(BackendError::NotFound("event"));
        }

        self.fetch_event(organizer_id, event_id).await
    }

    async fn set_event_status(
        &self,
        organizer_id: &str,
        event_id: &str,
        status: EventStatus,
    ) -> BackendResult<OrganizerEvent> {
        let updated = sqlx::query(
            "UPDATE organizer_events SET status=?,updated_at=? WHERE id=? AND organizer_id=?",
        )
        .bind(status.as_str())
        .bind(now_rfc3339())
        .bind(event_id)
        .bind(organizer_id)
        .execute(&self.db_pool)
        .await?
        .rows_affected();
        if updated == 0 {
            return Err(BackendError::NotFound("event"));
        }

        self.fetch_event(organizer_id, event_id).await
    }

    async fn delete_event(&self, organizer_id: &str, event_id: &str) -> BackendResult<()> {
        let deleted = sqlx::query("DELETE FROM organizer_events WHERE id=? AND organizer_id=?")
            .bind(event_id)
            .bind(organizer_id)
            .execute(&self.db_pool)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(BackendError::NotFound("event"));
        }
        Ok(())
    }
}

#[async_trait]
impl InterestStore for SqliteBackend {
    async fn insert_interest(
        &self,
        from_profile_id: &str,
        to_profile_id: &str,
        message: Option<String>,
    ) -> BackendResult<Interest> {
        let exists: Option<(String,)> =
            sqlx::query_as("SELECT id FROM interests WHERE from_profile_id=? AND to_profile_id=?")
                .bind(from_profile_id)
                .bind(to_profile_id)
                .fetch_optional(&self.db_pool)
                .await?;
        if exists.is_some() {
            return Err(BackendError::Rejected("interest already sent".to_owned()));
        }

        let interest = Interest {
            id: Uuid::now_v7().to_string(),
            from_profile_id: from_profile_id.to_owned(),
            to_profile_id: to_profile_id.to_owned(),
            message,
            status: InterestStatus::Pending,
            created_at: now_rfc3339(),
        };
        sqlx::query(&format!("INSERT INTO interests ({INTEREST_COLUMNS}) VALUES (?,?,?,?,?,?)"))
            .bind(&interest.id)
            .bind(&interest.from_profile_id)
            .bind(&interest.to_profile_id)
            .bind(&interest.message)
            .bind(interest.status.as_str())
            .bind(&interest.created_at)
            .execute(&self.db_pool)
            .await?;
        Ok(interest)
    }

    async fn get_interest(&self, id: &str) -> BackendResult<Option<Interest>> {
        let row: Option<InterestRow> =
            sqlx::query_as(&format!("SELECT {INTEREST_COLUMNS} FROM interests WHERE id=?"))
                .bind(id)
                .fetch_optional(&self.db_pool)
                .await?;
        row.map(Interest::try_from).transpose()
    }

    async fn list_interests(&self, profile_id: &str) -> BackendResult<Vec<Interest>> {
        let rows: Vec<InterestRow> = sqlx::query_as(&format!(
            "SELECT {INTEREST_COLUMNS} FROM interests WHERE from_profile_id=?1 OR to_profile_id=?1 ORDER BY rowid DESC"
        ))
        .bind(profile_id)
        .fetch_all(&self.db_pool)
        .await?;
        rows.into_iter().map(Interest::try_from).collect()
    }

    async fn set_interest_status(&self, id: &str, status: InterestStatus) -> BackendResult<Interest> {
        let updated = sqlx::query("UPDATE interests SET status=? WHERE id=?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.db_pool)
            .await?
            .rows_affected();
        if updated == 0 {
            return Err(BackendError::NotFound("interest"));
        }
        self.get_interest(id)
            .await?
            .ok_or(BackendError::NotFound("interest"))
    }
}

#[async_trait]
impl MessageStore for SqliteBackend {
    async fn find_or_create_conversation(
        &self,
        brand_id: &str,
        organizer_id: &str,
    ) -> BackendResult<Conversation> {
        sqlx::query(
            "INSERT INTO conversations (id,brand_id,organizer_id,created_at) VALUES (?,?,?,?) \
             ON CONFLICT(brand_id,organizer_id) DO NOTHING",
        )
        .bind(Uuid::now_v7().to_string())
        .bind(brand_id)
        .bind(organizer_id)
        .bind(now_rfc3339())
        .execute(&self.db_pool)
        .await?;

        let row: (String, String, String, String) = sqlx::query_as(
            "SELECT id,brand_id,organizer_id,created_at FROM conversations WHERE brand_id=? AND organizer_id=?",
        )
        .bind(brand_id)
        .bind(organizer_id)
        .fetch_one(&self.db_pool)
        .await?;
        Ok(conversation(row))
    }

    async fn get_conversation(&self, id: &str) -> BackendResult<Option<Conversation>> {
        let row: Option<(String, String, String, String)> =
            sqlx::query_as("SELECT id,brand_id,organizer_id,created_at FROM conversations WHERE id=?")
                .bind(id)
                .fetch_optional(&self.db_pool)
                .await?;
        Ok(row.map(conversation))
    }

    async fn list_conversations(&self, profile_id: &str) -> BackendResult<Vec<Conversation>> {
        let rows: Vec<(String, String, String, String)> = sqlx::query_as(
            "SELECT id,brand_id,organizer_id,created_at FROM conversations WHERE brand_id=?1 OR organizer_id=?1 ORDER BY created_at DESC",
        )
        .bind(profile_id)
        .fetch_all(&self.db_pool)
        .await?;
        Ok(rows.into_iter().map(conversation).collect())
    }

    async fn insert_message(
        &self,
        conversation_id: &str,
        profile_id: &str,
        reply_to_id: Option<String>,
        content: String,
    ) -> BackendResult<Message> {
        if let Some(reply_to_id) = &reply_to_id {
            if self.get_message(conversation_id, reply_to_id).await?.is_none() {
                return Err(BackendError::NotFound("reply target"));
            }
        }

        let message = Message {
            id: Uuid::now_v7().to_string(),
            conversation_id: conversation_id.to_owned(),
            profile_id: profile_id.to_owned(),
            reply_to_id,
            content,
            created_at: now_rfc3339(),
        };
        sqlx::query(&format!("INSERT INTO messages ({MESSAGE_COLUMNS}) VALUES (?,?,?,?,?,?)"))
            .bind(&message.id)
            .bind(&message.conversation_id)
            .bind(&message.profile_id)
            .bind(&message.reply_to_id)
            .bind(&message.content)
            .bind(&message.created_at)
            .execute(&self.db_pool)
            .await?;
        Ok(message)
    }

    async fn get_message(&self, conversation_id: &str, id: &str) -> BackendResult<Option<Message>> {
        let row: Option<MessageRow> = sqlx::query_as(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id=? AND conversation_id=?"
        ))
        .bind(id)
        .bind(conversation_id)
        .fetch_optional(&self.db_pool)
        .await?;
        Ok(row.map(Message::from))
    }

    async fn list_messages(&self, conversation_id: &str) -> BackendResult<Vec<Message>> {
        let rows: Vec<MessageRow> = sqlx::query_as(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE conversation_id=? ORDER BY rowid"
        ))
        .bind(conversation_id)
        .fetch_all(&self.db_pool)
        .await?;
        Ok(rows.into_iter().map(Message::from).collect())
    }
}

#[async_trait]
impl StatsSource for SqliteBackend {
    async fn dashboard_stats(&self) -> BackendResult<DashboardStats> {
        Ok(DashboardStats {
            brands: self.count("SELECT COUNT(*) FROM profiles WHERE role='brand'").await?,
            organizers: self.count("SELECT COUNT(*) FROM profiles WHERE role='organizer'").await?,
            featured: self.count("SELECT COUNT(*) FROM profiles WHERE featured=1").await?,
            events: self.count("SELECT COUNT(*) FROM organizer_events").await?,
            published_events: self
                .count("SELECT COUNT(*) FROM organizer_events WHERE status='published'")
                .await?,
            interests: self.count("SELECT COUNT(*) FROM interests").await?,
            conversations: self.count("SELECT COUNT(*) FROM conversations").await?,
            messages: self.count("SELECT COUNT(*) FROM messages").await?,
        })
    }
}
