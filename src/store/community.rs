use std::sync::Arc;

use tracing::debug;

use crate::{include_res, model::Profile};

use super::{KeyValueStore, Latency, StoreError, read_json, toggle_in_list, write_json};

pub const MEMBERS_KEY: &str = "community_members";

pub fn saved_members_key(user_id: &str) -> String {
    format!("user_{user_id}_savedMembers")
}

pub fn seed_members() -> Result<Vec<Profile>, serde_json::Error> {
    serde_json::from_str(include_res!(str, "/seed/members.json"))
}

#[derive(Clone)]
pub struct CommunityService {
    kv: Arc<dyn KeyValueStore>,
    latency: Latency,
}

impl CommunityService {
    pub fn new(kv: Arc<dyn KeyValueStore>, latency: Latency) -> Self {
        Self { kv, latency }
    }

    /// Writes `seed` only when no member list exists yet.
    pub async fn init(&self, seed: Vec<Profile>) -> Result<bool, StoreError> {
        if self.kv.get(MEMBERS_KEY).await?.is_some() {
            return Ok(false);
        }
        debug!(count = seed.len(), "seeding community members");
        write_json(self.kv.as_ref(), MEMBERS_KEY, &seed).await?;
        Ok(true)
    }

    pub async fn get_all_members(&self) -> Result<Vec<Profile>, StoreError> {
        self.latency.simulate().await;
        Ok(read_json(self.kv.as_ref(), MEMBERS_KEY).await?.unwrap_or_default())
    }

    pub async fn get_member(&self, id: &str) -> Result<Option<Profile>, StoreError> {
        let members = self.get_all_members().await?;
        Ok(members.into_iter().find(|member| member.id == id))
    }

    pub async fn add_member(&self, member: Profile) -> Result<Profile, StoreError> {
        self.latency.simulate().await;
        let mut members: Vec<Profile> = read_json(self.kv.as_ref(), MEMBERS_KEY)
            .await?
            .unwrap_or_default();
        members.push(member.clone());
        write_json(self.kv.as_ref(), MEMBERS_KEY, &members).await?;
        Ok(member)
    }

    pub async fn get_saved_member_ids(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        self.latency.simulate().await;
        Ok(read_json(self.kv.as_ref(), &saved_members_key(user_id))
            .await?
            .unwrap_or_default())
    }

    /// Returns whether the member is saved after the toggle.
    pub async fn toggle_saved_member(&self, user_id: &str, member_id: &str) -> Result<bool, StoreError> {
        self.latency.simulate().await;
        toggle_in_list(self.kv.as_ref(), &saved_members_key(user_id), member_id).await
    }

    pub async fn get_saved_members(&self, user_id: &str) -> Result<Vec<Profile>, StoreError> {
        let saved = self.get_saved_member_ids(user_id).await?;
        let members = self.get_all_members().await?;
        Ok(members
            .into_iter()
            .filter(|member| saved.contains(&member.id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{model::Role, store::MemoryKv};

    fn service() -> CommunityService {
        CommunityService::new(Arc::new(MemoryKv::new()), Latency::none())
    }

    #[tokio::test]
    async fn seed_is_written_once() {
        let community = service();
        let seed = seed_members().unwrap();
        let count = seed.len();

        assert!(community.init(seed.clone()).await.unwrap());
        community.add_member(seed[0].clone()).await.unwrap();
        assert!(!community.init(seed).await.unwrap());

        assert_eq!(community.get_all_members().await.unwrap().len(), count + 1);
    }

    #[tokio::test]
    async fn empty_store_reads_as_empty() {
        let community = service();
        assert!(community.get_all_members().await.unwrap().is_empty());
        assert!(community.get_saved_members("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn saved_members_are_per_user() {
        let community = service();
        community.init(seed_members().unwrap()).await.unwrap();
        let first = community.get_all_members().await.unwrap()[0].clone();

        assert!(community.toggle_saved_member("u1", &first.id).await.unwrap());

        let saved = community.get_saved_members("u1").await.unwrap();
        assert_eq!(saved, vec![first.clone()]);
        assert!(community.get_saved_members("u2").await.unwrap().is_empty());

        assert!(!community.toggle_saved_member("u1", &first.id).await.unwrap());
        assert!(community.get_saved_members("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn seed_has_both_roles() {
        let seed = seed_members().unwrap();
        assert!(seed.iter().any(|m| m.role == Role::Brand));
        assert!(seed.iter().any(|m| m.role == Role::Organizer));
    }

    #[test]
    fn saved_key_is_templated() {
        assert_eq!(saved_members_key("42"), "user_42_savedMembers");
    }
}
