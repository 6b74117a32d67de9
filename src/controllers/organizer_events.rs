//! Event list state for the organizer dashboard.
//!
//! Every clone of an [`OrganizerEvents`] shares one state, so requests may
//! overlap. Results are reconciled by the event `id` the server returns.
//! Loads that finish after a newer load started, or after [`OrganizerEvents::detach`],
//! are dropped without touching the state.

use std::{
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use serde::Serialize;
use tracing::{debug, error};

use crate::{
    backend::{BackendResult, EventStore},
    model::{EventDraft, EventStatus, OrganizerEvent},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "message", rename_all = "lowercase")]
pub enum Feedback {
    Success(String),
    Error(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsSnapshot {
    pub events: Vec<OrganizerEvent>,
    pub loading: bool,
    pub is_submitting: bool,
    pub feedback: Option<Feedback>,
}

struct EventsState {
    view: EventsSnapshot,
    organizer_id: Option<String>,
    generation: u64,
    mounted: bool,
}

#[derive(Clone)]
pub struct OrganizerEvents {
    store: Arc<dyn EventStore>,
    state: Arc<Mutex<EventsState>>,
}

fn replace(events: &mut [OrganizerEvent], updated: OrganizerEvent) {
    if let Some(slot) = events.iter_mut().find(|event| event.id == updated.id) {
        *slot = updated;
    }
}

impl OrganizerEvents {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            store,
            state: Arc::new(Mutex::new(EventsState {
                view: EventsSnapshot::default(),
                organizer_id: None,
                generation: 0,
                mounted: true,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EventsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> EventsSnapshot {
        self.lock().view.clone()
    }

    /// Stops applying results. Requests already in flight still run to completion.
    pub fn detach(&self) {
        self.lock().mounted = false;
    }

    /// Replaces the list with the events of `organizer_id`. Without an id the
    /// list is emptied and nothing is fetched.
    pub async fn load(&self, organizer_id: Option<&str>) {
        let generation = {
            let mut state = self.lock();
            state.generation += 1;
            state.organizer_id = organizer_id.map(str::to_owned);
            state.view.loading = organizer_id.is_some();
            if organizer_id.is_none() {
                state.view.events.clear();
            }
            state.generation
        };

        let Some(organizer_id) = organizer_id else {
            return;
        };

        let result = self.store.list_events(organizer_id).await;

        let mut state = self.lock();
        if !state.mounted || state.generation != generation {
            debug!(organizer_id, "discarding stale event list");
            return;
        }
        match result {
            Ok(events) => state.view.events = events,
            Err(e) => {
                error!("failed to load events for {organizer_id}: {e}");
                state.view.feedback = Some(Feedback::Error(format!("Failed to load events: {e}")));
            }
        }
        state.view.loading = false;
    }

    fn organizer_id(&self) -> Option<String> {
        self.lock().organizer_id.clone()
    }

    fn reject(&self) -> bool {
        self.lock().view.feedback = Some(Feedback::Error("No organizer selected".to_owned()));
        false
    }

    async fn submit<T, Fut>(
        &self,
        request: Fut,
        reconcile: impl FnOnce(&mut Vec<OrganizerEvent>, T),
        success: &str,
        failure: &str,
    ) -> bool
    where
        Fut: Future<Output = BackendResult<T>>,
    {
        {
            let mut state = self.lock();
            state.view.is_submitting = true;
            state.view.feedback = None;
        }

        let result = request.await;

        let mut state = self.lock();
        let ok = match result {
            Ok(value) => {
                if state.mounted {
                    reconcile(&mut state.view.events, value);
                }
                state.view.feedback = Some(Feedback::Success(success.to_owned()));
                true
            }
            Err(e) => {
                error!("{failure}: {e}");
                state.view.feedback = Some(Feedback::Error(format!("{failure}: {e}")));
                false
            }
        };
        state.view.is_submitting = false;
        ok
    }

    pub async fn create(&self, draft: EventDraft) -> bool {
        let Some(organizer_id) = self.organizer_id() else {
            return self.reject();
        };
        self.submit(
            self.store.insert_event(&organizer_id, draft, EventStatus::Published),
            |events, created| events.insert(0, created),
            "Event created",
            "Failed to create event",
        )
        .await
    }

    pub async fn update(&self, event_id: &str, draft: EventDraft) -> bool {
        let Some(organizer_id) = self.organizer_id() else {
            return self.reject();
        };
        self.submit(
            self.store.update_event(&organizer_id, event_id, draft, None),
            |events, updated| replace(events, updated),
            "Event updated",
            "Failed to update event",
        )
        .await
    }

    pub async fn delete(&self, event_id: &str) -> bool {
        let Some(organizer_id) = self.organizer_id() else {
            return self.reject();
        };
        self.submit(
            self.store.delete_event(&organizer_id, event_id),
            |events, ()| events.retain(|event| event.id != event_id),
            "Event deleted",
            "Failed to delete event",
        )
        .await
    }

    pub async fn publish(&self, event_id: &str) -> bool {
        let Some(organizer_id) = self.organizer_id() else {
            return self.reject();
        };
        self.submit(
            self.store
                .set_event_status(&organizer_id, event_id, EventStatus::Published),
            |events, published| replace(events, published),
            "Event published",
            "Failed to publish event",
        )
        .await
    }

    /// Stores the form as a draft, creating it when `event_id` is `None`.
    pub async fn save_draft(&self, event_id: Option<&str>, draft: EventDraft) -> bool {
        let Some(organizer_id) = self.organizer_id() else {
            return self.reject();
        };
        match event_id {
            None => {
                self.submit(
                    self.store
                        .insert_event(&organizer_id, draft, EventStatus::Draft),
                    |events, created| events.insert(0, created),
                    "Draft saved",
                    "Failed to save draft",
                )
                .await
            }
            Some(event_id) => {
                self.submit(
                    self.store.update_event(
                        &organizer_id,
                        event_id,
                        draft,
                        Some(EventStatus::Draft),
                    ),
                    |events, saved| replace(events, saved),
                    "Draft saved",
                    "Failed to save draft",
                )
                .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::backend::BackendError;

    #[derive(Default)]
    struct FakeEvents {
        events: Mutex<Vec<OrganizerEvent>>,
        list_calls: AtomicUsize,
        fail: AtomicBool,
        gate: Option<Arc<Notify>>,
    }

    impl FakeEvents {
        fn with(events: Vec<OrganizerEvent>) -> Self {
            Self {
                events: Mutex::new(events),
                ..Default::default()
            }
        }

        fn check(&self) -> BackendResult<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(BackendError::Rejected("backend offline".to_owned()));
            }
            Ok(())
        }

        fn stored(&self, id: &str) -> BackendResult<OrganizerEvent> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .find(|e| e.id == id)
                .cloned()
                .ok_or(BackendError::NotFound("event"))
        }
    }

    fn event(id: &str, title: &str, status: EventStatus) -> OrganizerEvent {
        OrganizerEvent {
            id: id.to_owned(),
            organizer_id: "org".to_owned(),
            title: title.to_owned(),
            description: String::new(),
            event_type: None,
            location: None,
            starts_at: None,
            expected_audience: None,
            status,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[async_trait]
    impl EventStore for FakeEvents {
        async fn list_events(&self, _organizer_id: &str) -> BackendResult<Vec<OrganizerEvent>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.check()?;
            Ok(self.events.lock().unwrap().clone())
        }

        async fn insert_event(
            &self,
            _organizer_id: &str,
            draft: EventDraft,
            status: EventStatus,
        ) -> BackendResult<OrganizerEvent> {
            self.check()?;
            let mut events = self.events.lock().unwrap();
            let created = event(&format!("e{}", events.len() + 1), &draft.title, status);
            events.insert(0, created.clone());
            Ok(created)
        }

        async fn update_event(
            &self,
            _organizer_id: &str,
            event_id: &str,
            draft: EventDraft,
            status: Option<EventStatus>,
        ) -> BackendResult<OrganizerEvent> {
            self.check()?;
            let mut updated = self.stored(event_id)?;
            updated.title = draft.title;
            if let Some(status) = status {
                updated.status = status;
            }
            Ok(updated)
        }

        async fn set_event_status(
            &self,
            _organizer_id: &str,
            event_id: &str,
            status: EventStatus,
        ) -> BackendResult<OrganizerEvent> {
            self.check()?;
            let mut updated = self.stored(event_id)?;
            updated.status = status;
            Ok(updated)
        }

        async fn delete_event(&self, _organizer_id: &str, event_id: &str) -> BackendResult<()> {
            self.check()?;
            self.stored(event_id).map(|_| ())
        }
    }

    fn draft(title: &str) -> EventDraft {
        EventDraft {
            title: title.to_owned(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn no_organizer_means_no_fetch() {
        let store = Arc::new(FakeEvents::with(vec![event("e1", "Expo", EventStatus::Draft)]));
        let events = OrganizerEvents::new(store.clone());

        events.load(None).await;

        let view = events.snapshot();
        assert!(view.events.is_empty());
        assert!(!view.loading);
        assert_eq!(store.list_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn load_replaces_list() {
        let store = Arc::new(FakeEvents::with(vec![
            event("e2", "Expo", EventStatus::Published),
            event("e1", "Meetup", EventStatus::Draft),
        ]));
        let events = OrganizerEvents::new(store.clone());

        events.load(Some("org")).await;

        let view = events.snapshot();
        assert_eq!(view.events.len(), 2);
        assert!(!view.loading);
        assert_eq!(view.feedback, None);
    }

    #[tokio::test]
    async fn create_prepends_and_reports_success() {
        let store = Arc::new(FakeEvents::with(vec![event("e1", "Meetup", EventStatus::Draft)]));
        let events = OrganizerEvents::new(store.clone());
        events.load(Some("org")).await;

        assert!(events.create(draft("Summer Fest")).await);

        let view = events.snapshot();
        assert_eq!(view.events[0].title, "Summer Fest");
        assert_eq!(view.events[0].status, EventStatus::Published);
        assert_eq!(view.events.len(), 2);
        assert!(!view.is_submitting);
        assert_eq!(view.feedback, Some(Feedback::Success("Event created".to_owned())));
    }

    #[tokio::test]
    async fn failed_mutation_keeps_list() {
        let store = Arc::new(FakeEvents::with(vec![event("e1", "Meetup", EventStatus::Draft)]));
        let events = OrganizerEvents::new(store.clone());
        events.load(Some("org")).await;
        store.fail.store(true, Ordering::SeqCst);

        assert!(!events.delete("e1").await);

        let view = events.snapshot();
        assert_eq!(view.events.len(), 1);
        assert!(!view.is_submitting);
        assert!(matches!(view.feedback, Some(Feedback::Error(ref m)) if m.contains("backend offline")));
    }

    #[tokio::test]
    async fn update_publish_delete_reconcile_by_id() {
        let store = Arc::new(FakeEvents::with(vec![
            event("e2", "Expo", EventStatus::Draft),
            event("e1", "Meetup", EventStatus::Draft),
        ]));
        let events = OrganizerEvents::new(store.clone());
        events.load(Some("org")).await;

        assert!(events.update("e1", draft("Meetup v2")).await);
        assert!(events.publish("e2").await);
        let view = events.snapshot();
        assert_eq!(view.events[1].title, "Meetup v2");
        assert_eq!(view.events[0].status, EventStatus::Published);

        assert!(events.delete("e2").await);
        let view = events.snapshot();
        assert_eq!(view.events.len(), 1);
        assert_eq!(view.events[0].id, "e1");
        assert_eq!(view.feedback, Some(Feedback::Success("Event deleted".to_owned())));
    }

    #[tokio::test]
    async fn save_draft_inserts_or_updates() {
        let store = Arc::new(FakeEvents::with(vec![event("e1", "Meetup", EventStatus::Published)]));
        let events = OrganizerEvents::new(store.clone());
        events.load(Some("org")).await;

        assert!(events.save_draft(None, draft("Idea")).await);
        assert!(events.save_draft(Some("e1"), draft("Meetup (paused)")).await);

        let view = events.snapshot();
        assert_eq!(view.events.len(), 2);
        assert_eq!(view.events[0].title, "Idea");
        assert_eq!(view.events[0].status, EventStatus::Draft);
        assert_eq!(view.events[1].status, EventStatus::Draft);
    }

    #[tokio::test]
    async fn mutation_without_organizer_is_refused() {
        let events = OrganizerEvents::new(Arc::new(FakeEvents::default()));
        assert!(!events.create(draft("x")).await);
        assert!(matches!(events.snapshot().feedback, Some(Feedback::Error(_))));
    }

    #[tokio::test]
    async fn results_after_detach_are_dropped() {
        let gate = Arc::new(Notify::new());
        let store = Arc::new(FakeEvents {
            events: Mutex::new(vec![event("e1", "Meetup", EventStatus::Draft)]),
            gate: Some(gate.clone()),
            ..Default::default()
        });
        let events = OrganizerEvents::new(store.clone());

        let unmount = async {
            events.detach();
            gate.notify_one();
        };
        tokio::join!(events.load(Some("org")), unmount);

        assert!(events.snapshot().events.is_empty());
        assert_eq!(store.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn newer_load_wins() {
        let gate = Arc::new(Notify::new());
        let store = Arc::new(FakeEvents {
            events: Mutex::new(vec![event("e1", "Meetup", EventStatus::Draft)]),
            gate: Some(gate.clone()),
            ..Default::default()
        });
        let events = OrganizerEvents::new(store.clone());

        let switch_away = async {
            events.load(None).await;
            gate.notify_one();
        };
        tokio::join!(events.load(Some("org")), switch_away);

        let view = events.snapshot();
        assert!(view.events.is_empty());
        assert!(!view.loading);
    }
}
