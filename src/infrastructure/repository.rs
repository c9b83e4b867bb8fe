// Entity Repository - the single in-memory store behind every portal read and write

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::core::{AlumniId, Clock, EventId};
use crate::data_seeder::SeedDataset;
use crate::error::{AppError, AppResult};
use crate::infrastructure::id_generator::IdGenerator;
use crate::models::{Alumni, AnalyticsSnapshot, Event, EventPatch, Industry, NewEvent, Skill};

/// (event, alumni) pairs with a live registration. Only the strict policy writes here.
pub type RegistrationLedger = HashSet<(EventId, AlumniId)>;

#[derive(Debug, Default)]
struct StoreState {
    industries: Vec<Industry>,
    skills: Vec<Skill>,
    alumni: Vec<Alumni>,
    events: Vec<Event>,
    registrations: RegistrationLedger,
    baseline_analytics: Option<AnalyticsSnapshot>,
}

/// Cloneable handle to one store. Clones share state; separate `new` calls don't.
#[derive(Debug, Clone)]
pub struct EntityRepository {
    state: Arc<RwLock<StoreState>>,
    ids: Arc<IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl EntityRepository {
    pub fn new(seed: SeedDataset, clock: Arc<dyn Clock>) -> Self {
        let ids = IdGenerator::from_existing(seed.events.iter().map(|e| &e.id));
        info!(
            "Repository seeded with {} alumni and {} events",
            seed.alumni.len(),
            seed.events.len()
        );

        Self {
            state: Arc::new(RwLock::new(StoreState {
                industries: seed.industries,
                skills: seed.skills,
                alumni: seed.alumni,
                events: seed.events,
                registrations: RegistrationLedger::new(),
                baseline_analytics: seed.baseline_analytics,
            })),
            ids: Arc::new(ids),
            clock,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub async fn get_all_alumni(&self) -> Vec<Alumni> {
        self.state.read().await.alumni.clone()
    }

    pub async fn get_alumni(&self, id: &AlumniId) -> AppResult<Alumni> {
        self.state
            .read()
            .await
            .alumni
            .iter()
            .find(|a| &a.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("alumni {}", id)))
    }

    pub async fn industries(&self) -> Vec<Industry> {
        self.state.read().await.industries.clone()
    }

    pub async fn skills(&self) -> Vec<Skill> {
        self.state.read().await.skills.clone()
    }

    pub async fn baseline_analytics(&self) -> Option<AnalyticsSnapshot> {
        self.state.read().await.baseline_analytics.clone()
    }

    pub async fn get_all_events(&self) -> Vec<Event> {
        self.state.read().await.events.clone()
    }

    pub async fn get_event(&self, id: &EventId) -> AppResult<Event> {
        self.state
            .read()
            .await
            .events
            .iter()
            .find(|e| &e.id == id)
            .cloned()
            .ok_or_else(|| event_not_found(id))
    }

    pub async fn event_count(&self) -> usize {
        self.state.read().await.events.len()
    }

    #[instrument(skip(self, new_event), fields(title = ?new_event.title))]
    pub async fn create_event(&self, new_event: NewEvent) -> AppResult<Event> {
        let mut state = self.state.write().await;
        let event = new_event.into_event(self.ids.next_event_id(), self.clock.now())?;
        state.events.push(event.clone());
        info!("Created event {} ({})", event.id, event.title);
        Ok(event)
    }

    #[instrument(skip(self, patch))]
    pub async fn update_event(&self, id: &EventId, patch: EventPatch) -> AppResult<Event> {
        let now = self.clock.now();
        let mut state = self.state.write().await;
        let slot = state
            .events
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or_else(|| event_not_found(id))?;

        if patch.is_empty() {
            debug!("Empty patch for event {}, nothing to change", id);
            return Ok(slot.clone());
        }

        let updated = patch.merged_into(slot, now)?;
        *slot = updated.clone();
        debug!("Updated event {}", id);
        Ok(updated)
    }

    /// Returns whether an event was removed; unknown ids are not an error
    #[instrument(skip(self))]
    pub async fn delete_event(&self, id: &EventId) -> bool {
        let mut state = self.state.write().await;
        let before = state.events.len();
        state.events.retain(|e| &e.id != id);
        let removed = state.events.len() != before;
        if removed {
            state.registrations.retain(|(event_id, _)| event_id != id);
            info!("Deleted event {}", id);
        } else {
            debug!("Delete of unknown event {} ignored", id);
        }
        removed
    }

    /// Run `mutation` against one event and the registration ledger under a single
    /// write lock. `mutation` must leave both untouched when it returns an error.
    pub(crate) async fn modify_event<R, F>(&self, id: &EventId, mutation: F) -> AppResult<R>
    where
        F: FnOnce(&mut Event, &mut RegistrationLedger) -> AppResult<R>,
    {
        let mut state = self.state.write().await;
        let StoreState {
            events,
            registrations,
            ..
        } = &mut *state;
        let event = events
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or_else(|| event_not_found(id))?;
        mutation(event, registrations)
    }

    pub async fn is_registered(&self, event_id: &EventId, alumni_id: &AlumniId) -> bool {
        self.state
            .read()
            .await
            .registrations
            .contains(&(event_id.clone(), alumni_id.clone()))
    }
}

fn event_not_found(id: &EventId) -> AppError {
    AppError::NotFound(format!("event {}", id))
}
