pub mod inspiration_board;
pub mod organizer_events;

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{
    backend::{ProfileLookup, SavedProfiles},
    store::CollaborationService,
};

pub use inspiration_board::{BoardSnapshot, InspirationBoard, ProfileSaveMeta, Resolution};
pub use organizer_events::{EventsSnapshot, Feedback, OrganizerEvents};

/// One inspiration board per signed-in user, plus one shared by visitors.
/// A user's board is dropped when they sign out.
#[derive(Clone)]
pub struct Boards {
    boards: Arc<Mutex<HashMap<String, Arc<InspirationBoard>>>>,
    anonymous: Arc<InspirationBoard>,
    collaborations: CollaborationService,
    lookup: Arc<dyn ProfileLookup>,
    saved: Arc<dyn SavedProfiles>,
}

impl Boards {
    pub fn new(
        collaborations: CollaborationService,
        lookup: Arc<dyn ProfileLookup>,
        saved: Arc<dyn SavedProfiles>,
    ) -> Self {
        Self {
            boards: Arc::default(),
            anonymous: Arc::new(InspirationBoard::new(
                None,
                collaborations.clone(),
                lookup.clone(),
                saved.clone(),
            )),
            collaborations,
            lookup,
            saved,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<InspirationBoard>>> {
        self.boards.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the user's board, creating an unloaded one on first use.
    pub fn for_user(&self, user_id: &str) -> Arc<InspirationBoard> {
        self.lock()
            .entry(user_id.to_owned())
            .or_insert_with(|| {
                Arc::new(InspirationBoard::new(
                    Some(user_id.to_owned()),
                    self.collaborations.clone(),
                    self.lookup.clone(),
                    self.saved.clone(),
                ))
            })
            .clone()
    }

    /// The board shown to visitors who are not signed in.
    pub fn anonymous(&self) -> Arc<InspirationBoard> {
        self.anonymous.clone()
    }

    /// Drops the user's board. Returns whether one existed.
    pub fn forget(&self, user_id: &str) -> bool {
        self.lock().remove(user_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        backend::SqliteBackend,
        db,
        store::{Latency, MemoryKv},
    };

    #[tokio::test]
    async fn boards_are_kept_per_user() {
        let backend = Arc::new(SqliteBackend::new(db::memory_pool().await.unwrap()));
        let collaborations = CollaborationService::new(Arc::new(MemoryKv::new()), Latency::none());
        let boards = Boards::new(collaborations, backend.clone(), backend);

        let first = boards.for_user("u1");
        assert!(Arc::ptr_eq(&first, &boards.for_user("u1")));
        assert!(!Arc::ptr_eq(&first, &boards.for_user("u2")));

        assert!(boards.forget("u1"));
        assert!(!boards.forget("u1"));
        assert!(!Arc::ptr_eq(&first, &boards.for_user("u1")));
    }

    #[tokio::test]
    async fn visitors_share_one_board() {
        let backend = Arc::new(SqliteBackend::new(db::memory_pool().await.unwrap()));
        let collaborations = CollaborationService::new(Arc::new(MemoryKv::new()), Latency::none());
        let boards = Boards::new(collaborations, backend.clone(), backend);

        let board = boards.anonymous();
        assert_eq!(board.user_id(), None);
        assert!(Arc::ptr_eq(&board, &boards.anonymous()));
    }
}
