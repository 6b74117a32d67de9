//! Inspiration board state: collaborations plus save status for the profiles they mention.
//!
//! Collaborations name their brand and organizer by display name. Names are
//! resolved to profile ids once and the answer, including "no such profile",
//! is kept for the life of the board.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use futures_util::future::{self, BoxFuture, FutureExt, Shared};
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{debug, error, warn};

use crate::{
    backend::{ProfileLookup, SavedProfiles},
    model::Collaboration,
    store::CollaborationService,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Unresolved,
    Absent,
    Resolved(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProfileSaveMeta {
    pub saved: bool,
    pub available: bool,
    pub resolving: bool,
    pub loading: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub collaborations: Vec<Collaboration>,
    pub profiles: BTreeMap<String, ProfileSaveMeta>,
    pub loading: bool,
    pub error: Option<String>,
}

type Lookup = Shared<BoxFuture<'static, Resolution>>;

#[derive(Default)]
struct BoardState {
    collaborations: Vec<Collaboration>,
    lookup: HashMap<String, Resolution>,
    in_flight: HashMap<String, Lookup>,
    saved_profiles: HashMap<String, bool>,
    saving: HashMap<String, bool>,
    loading: bool,
    error: Option<String>,
}

impl BoardState {
    fn resolution(&self, name: &str) -> Resolution {
        self.lookup.get(name).cloned().unwrap_or(Resolution::Unresolved)
    }

    fn meta(&self, name: &str) -> ProfileSaveMeta {
        let resolution = self.resolution(name);
        ProfileSaveMeta {
            saved: match &resolution {
                Resolution::Resolved(id) => self.saved_profiles.get(id).copied().unwrap_or(false),
                _ => false,
            },
            available: resolution != Resolution::Absent,
            resolving: resolution == Resolution::Unresolved,
            loading: self.saving.get(name).copied().unwrap_or(false),
        }
    }

    fn referenced_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for collaboration in &self.collaborations {
            for name in [&collaboration.brand_name, &collaboration.organizer_name] {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        names
    }
}

pub struct InspirationBoard {
    user_id: Option<String>,
    collaborations: CollaborationService,
    lookup: Arc<dyn ProfileLookup>,
    saved: Arc<dyn SavedProfiles>,
    state: Mutex<BoardState>,
    loaded: OnceCell<()>,
}

impl InspirationBoard {
    pub fn new(
        user_id: Option<String>,
        collaborations: CollaborationService,
        lookup: Arc<dyn ProfileLookup>,
        saved: Arc<dyn SavedProfiles>,
    ) -> Self {
        Self {
            user_id,
            collaborations,
            lookup,
            saved,
            state: Mutex::new(BoardState::default()),
            loaded: OnceCell::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Runs the first [`refresh`](Self::refresh) once. Callers arriving while it
    /// is in progress wait for it instead of seeing an empty board.
    pub async fn ensure_loaded(&self) {
        self.loaded.get_or_init(|| self.refresh()).await;
    }

    /// Reloads collaborations and the viewer's saved profiles, then resolves new names.
    pub async fn refresh(&self) {
        self.lock().loading = true;

        let collaborations = self
            .collaborations
            .get_all_collaborations(self.user_id.as_deref())
            .await;
        let saved_ids = match &self.user_id {
            Some(user_id) => self.saved.saved_profile_ids(user_id).await.map(Some),
            None => Ok(None),
        };

        {
            let mut state = self.lock();
            match collaborations {
                Ok(collaborations) => {
                    state.collaborations = collaborations;
                    state.error = None;
                }
                Err(e) => {
                    error!("failed to load collaborations: {e}");
                    state.error = Some(format!("Failed to load collaborations: {e}"));
                }
            }
            match saved_ids {
                Ok(Some(ids)) => {
                    state.saved_profiles = ids.into_iter().map(|id| (id, true)).collect();
                }
                Ok(None) => state.saved_profiles.clear(),
                Err(e) => error!("failed to load saved profiles: {e}"),
            }
            state.loading = false;
        }

        self.preload_profiles().await;
    }

    /// Resolves every name on the board that has not been resolved yet, in parallel.
    pub async fn preload_profiles(&self) {
        let pending: Vec<String> = {
            let state = self.lock();
            state
                .referenced_names()
                .into_iter()
                .filter(|name| state.resolution(name) == Resolution::Unresolved)
                .collect()
        };
        if pending.is_empty() {
            return;
        }

        debug!(count = pending.len(), "preloading profile ids");
        future::join_all(pending.iter().map(|name| self.resolve_profile_id(name))).await;
    }

    /// Maps a display name to a profile id. Concurrent calls for one name share
    /// a single lookup, and the answer is never looked up again.
    pub async fn resolve_profile_id(&self, name: &str) -> Resolution {
        let lookup = {
            let mut state = self.lock();
            match state.resolution(name) {
                Resolution::Unresolved => {}
                known => return known,
            }
            match state.in_flight.get(name) {
                Some(lookup) => lookup.clone(),
                None => {
                    let lookup = self.start_lookup(name);
                    state.in_flight.insert(name.to_owned(), lookup.clone());
                    lookup
                }
            }
        };

        let resolution = lookup.await;

        let mut state = self.lock();
        state.in_flight.remove(name);
        state.lookup.insert(name.to_owned(), resolution.clone());
        resolution
    }

    fn start_lookup(&self, name: &str) -> Lookup {
        let lookup = self.lookup.clone();
        let name = name.to_owned();
        async move {
            match lookup.find_profile_id_by_name(&name).await {
                Ok(Some(id)) => Resolution::Resolved(id),
                Ok(None) => Resolution::Absent,
                Err(e) => {
                    warn!("profile lookup for {name:?} failed, treating as absent: {e}");
                    Resolution::Absent
                }
            }
        }
        .boxed()
        .shared()
    }

    pub fn resolution(&self, name: &str) -> Resolution {
        self.lock().resolution(name)
    }

    pub fn profile_save_meta(&self, name: &str) -> ProfileSaveMeta {
        self.lock().meta(name)
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        let state = self.lock();
        let profiles = state
            .referenced_names()
            .into_iter()
            .map(|name| {
                let meta = state.meta(&name);
                (name, meta)
            })
            .collect();
        BoardSnapshot {
            collaborations: state.collaborations.clone(),
            profiles,
            loading: state.loading,
            error: state.error.clone(),
        }
    }

    /// Flips the collaboration on the board first, then persists the toggle.
    /// Returns the flag now shown, or `None` when there is no viewer or no such item.
    pub async fn toggle_save_collaboration(&self, collaboration_id: &str) -> Option<bool> {
        let user_id = self.user_id.as_deref()?;
        let saved = {
            let mut state = self.lock();
            let collaboration = state
                .collaborations
                .iter_mut()
                .find(|c| c.id == collaboration_id)?;
            collaboration.saved = !collaboration.saved;
            collaboration.saved
        };

        if let Err(e) = self
            .collaborations
            .toggle_saved_collaboration(user_id, collaboration_id)
            .await
        {
            error!("failed to persist saved collaboration {collaboration_id}: {e}");
        }
        Some(saved)
    }

    /// Persists the toggle first and only then records the stored answer.
    pub async fn toggle_save_profile(&self, name: &str) -> Option<bool> {
        let user_id = self.user_id.as_deref()?;
        let Resolution::Resolved(profile_id) = self.resolve_profile_id(name).await else {
            return None;
        };

        self.lock().saving.insert(name.to_owned(), true);
        let result = self.saved.toggle_saved_profile(user_id, &profile_id).await;

        let mut state = self.lock();
        state.saving.remove(name);
        match result {
            Ok(saved) => {
                state.saved_profiles.insert(profile_id, saved);
                Some(saved)
            }
            Err(e) => {
                error!("failed to toggle saved profile {profile_id}: {e}");
                state.error = Some(format!("Failed to update saved profile: {e}"));
                None
            }
        }
    }
}
