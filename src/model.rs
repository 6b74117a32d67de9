use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Role {
    Brand,
    Organizer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        use Role::*;
        match self {
            Brand => "brand",
            Organizer => "organizer",
        }
    }

    pub fn counterpart(&self) -> Role {
        use Role::*;
        match self {
            Brand => Organizer,
            Organizer => Brand,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "brand" => Ok(Role::Brand),
            "organizer" => Ok(Role::Organizer),
            other => Err(format!("unknown role {other:?}")),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// What a profile is looking for in a partner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WhatTheySeek {
    pub sponsorship_types: Vec<String>,
    pub budget_range: Option<String>,
    pub audience_tags: Vec<String>,
    pub event_types: Vec<String>,
    pub notes: Option<String>,
}

/// A brand or organizer listing. Community members share this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    #[serde(alias = "type")]
    pub role: Role,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub audience_size: Option<String>,
    #[serde(default)]
    pub what_they_seek: WhatTheySeek,
    #[serde(default)]
    pub featured: bool,
    #[serde(alias = "dateRegistered", default)]
    pub created_at: String,
}

/// Everything a user may change on their own profile. The role is fixed at registration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub audience_size: Option<String>,
    pub what_they_seek: Option<WhatTheySeek>,
}

impl ProfileUpdate {
    pub fn apply(self, profile: &mut Profile) {
        if let Some(name) = self.name {
            profile.name = name;
        }
        if let Some(description) = self.description {
            profile.description = description;
        }
        if self.short_description.is_some() {
            profile.short_description = self.short_description;
        }
        if self.category.is_some() {
            profile.category = self.category;
        }
        if self.location.is_some() {
            profile.location = self.location;
        }
        if self.audience_size.is_some() {
            profile.audience_size = self.audience_size;
        }
        if let Some(what_they_seek) = self.what_they_seek {
            profile.what_they_seek = what_they_seek;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CollaborationType {
    Sponsorship,
    ProductSampling,
    CoBrandedExperience,
    Activation,
}

/// A past brand/organizer partnership shown on the inspiration board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collaboration {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: CollaborationType,
    pub brand_name: String,
    pub organizer_name: String,
    pub description: String,
    #[serde(default)]
    pub metrics: BTreeMap<String, String>,
    // per viewer, never stored in the shared collection
    #[serde(default, skip_deserializing)]
    pub saved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    Published,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "draft",
            EventStatus::Published => "published",
        }
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(EventStatus::Draft),
            "published" => Ok(EventStatus::Published),
            other => Err(format!("unknown event status {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizerEvent {
    pub id: String,
    pub organizer_id: String,
    pub title: String,
    pub description: String,
    pub event_type: Option<String>,
    pub location: Option<String>,
    pub starts_at: Option<String>,
    pub expected_audience: Option<i64>,
    pub status: EventStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// The editable part of an organizer event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub event_type: Option<String>,
    pub location: Option<String>,
    pub starts_at: Option<String>,
    pub expected_audience: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterestStatus {
    Pending,
    Accepted,
    Declined,
}

impl InterestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterestStatus::Pending => "pending",
            InterestStatus::Accepted => "accepted",
            InterestStatus::Declined => "declined",
        }
    }
}

impl FromStr for InterestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InterestStatus::Pending),
            "accepted" => Ok(InterestStatus::Accepted),
            "declined" => Ok(InterestStatus::Declined),
            other => Err(format!("unknown interest status {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interest {
    pub id: String,
    pub from_profile_id: String,
    pub to_profile_id: String,
    pub message: Option<String>,
    pub status: InterestStatus,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub brand_id: String,
    pub organizer_id: String,
    pub created_at: String,
}

impl Conversation {
    pub fn includes(&self, profile_id: &str) -> bool {
        self.brand_id == profile_id || self.organizer_id == profile_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub profile_id: String,
    pub reply_to_id: Option<String>,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub brands: i64,
    pub organizers: i64,
    pub featured: i64,
    pub events: i64,
    pub published_events: i64,
    pub interests: i64,
    pub conversations: i64,
    pub messages: i64,
}

pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_json_accepts_type_alias() {
        let member: Profile = serde_json::from_str(
            r#"{"id":"m1","type":"brand","name":"EcoRefresh","featured":true,"dateRegistered":"2024-01-01"}"#,
        )
        .unwrap();

        assert_eq!(member.role, Role::Brand);
        assert_eq!(member.created_at, "2024-01-01");
        assert!(member.what_they_seek.audience_tags.is_empty());
        assert!(member.what_they_seek.notes.is_none());
    }

    #[test]
    fn update_never_touches_role() {
        let mut profile: Profile =
            serde_json::from_str(r#"{"id":"p1","role":"organizer","name":"TechExpo"}"#).unwrap();
        let update: ProfileUpdate =
            serde_json::from_str(r#"{"name":"TechExpo 2025","role":"brand"}"#).unwrap();

        update.apply(&mut profile);

        assert_eq!(profile.name, "TechExpo 2025");
        assert_eq!(profile.role, Role::Organizer);
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("Brand".parse::<Role>(), Ok(Role::Brand));
        assert_eq!(" organizer ".parse::<Role>(), Ok(Role::Organizer));
        assert!("sponsor".parse::<Role>().is_err());
    }

    #[test]
    fn role_json_is_case_insensitive() {
        let member: Profile =
            serde_json::from_str(r#"{"id":"m1","type":"Brand","name":"X"}"#).unwrap();
        assert_eq!(member.role, Role::Brand);

        let role: Role = serde_json::from_str(r#""ORGANIZER""#).unwrap();
        assert_eq!(role, Role::Organizer);
        assert_eq!(serde_json::to_string(&Role::Brand).unwrap(), r#""brand""#);
        assert!(serde_json::from_str::<Role>(r#""sponsor""#).is_err());
    }
}
