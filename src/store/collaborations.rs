use std::sync::Arc;

use tracing::debug;

use crate::{include_res, model::Collaboration};

use super::{KeyValueStore, Latency, StoreError, read_json, toggle_in_list, write_json};

pub const COLLABORATIONS_KEY: &str = "collaborations";

pub fn saved_collabs_key(user_id: &str) -> String {
    format!("user_{user_id}_savedCollabs")
}

pub fn seed_collaborations() -> Result<Vec<Collaboration>, serde_json::Error> {
    serde_json::from_str(include_res!(str, "/seed/collaborations.json"))
}

#[derive(Clone)]
pub struct CollaborationService {
    kv: Arc<dyn KeyValueStore>,
    latency: Latency,
}

impl CollaborationService {
    pub fn new(kv: Arc<dyn KeyValueStore>, latency: Latency) -> Self {
        Self { kv, latency }
    }

    pub async fn init(&self, seed: Vec<Collaboration>) -> Result<bool, StoreError> {
        if self.kv.get(COLLABORATIONS_KEY).await?.is_some() {
            return Ok(false);
        }
        debug!(count = seed.len(), "seeding collaborations");
        write_json(self.kv.as_ref(), COLLABORATIONS_KEY, &seed).await?;
        Ok(true)
    }

    async fn saved_ids(&self, user_id: Option<&str>) -> Result<Vec<String>, StoreError> {
        match user_id {
            Some(user_id) => Ok(read_json(self.kv.as_ref(), &saved_collabs_key(user_id))
                .await?
                .unwrap_or_default()),
            None => Ok(Vec::new()),
        }
    }

    /// All collaborations, with `saved` filled in for `user_id`.
    pub async fn get_all_collaborations(&self, user_id: Option<&str>) -> Result<Vec<Collaboration>, StoreError> {
        self.latency.simulate().await;
        let saved = self.saved_ids(user_id).await?;
        let mut collaborations: Vec<Collaboration> = read_json(self.kv.as_ref(), COLLABORATIONS_KEY)
            .await?
            .unwrap_or_default();
        for collaboration in &mut collaborations {
            collaboration.saved = saved.contains(&collaboration.id);
        }
        Ok(collaborations)
    }

    pub async fn toggle_saved_collaboration(&self, user_id: &str, collaboration_id: &str) -> Result<bool, StoreError> {
        self.latency.simulate().await;
        toggle_in_list(self.kv.as_ref(), &saved_collabs_key(user_id), collaboration_id).await
    }

    pub async fn get_saved_collaborations(&self, user_id: &str) -> Result<Vec<Collaboration>, StoreError> {
        Ok(self
            .get_all_collaborations(Some(user_id))
            .await?
            .into_iter()
            .filter(|collaboration| collaboration.saved)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryKv;

    async fn seeded() -> CollaborationService {
        let service = CollaborationService::new(Arc::new(MemoryKv::new()), Latency::none());
        service.init(seed_collaborations().unwrap()).await.unwrap();
        service
    }

    #[tokio::test]
    async fn anonymous_viewer_sees_nothing_saved() {
        let service = seeded().await;
        let all = service.get_all_collaborations(None).await.unwrap();
        assert!(!all.is_empty());
        assert!(all.iter().all(|c| !c.saved));
    }

    #[tokio::test]
    async fn toggling_twice_restores_state() {
        let service = seeded().await;
        let id = service.get_all_collaborations(None).await.unwrap()[0].id.clone();

        assert!(service.toggle_saved_collaboration("u1", &id).await.unwrap());
        let saved = service.get_saved_collaborations("u1").await.unwrap();
        assert_eq!(saved.len(), 1);
        assert!(saved[0].saved);

        assert!(!service.toggle_saved_collaboration("u1", &id).await.unwrap());
        assert!(service.get_saved_collaborations("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn saved_flag_is_not_written_into_the_shared_list() {
        let kv = Arc::new(MemoryKv::new());
        let service = CollaborationService::new(kv.clone(), Latency::none());
        service.init(seed_collaborations().unwrap()).await.unwrap();
        let id = service.get_all_collaborations(None).await.unwrap()[0].id.clone();
        service.toggle_saved_collaboration("u1", &id).await.unwrap();

        let other = service.get_all_collaborations(Some("u2")).await.unwrap();
        assert!(other.iter().all(|c| !c.saved));
    }
}
