// Event Lifecycle Manager - status changes, registration and attendee bookkeeping

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::core::{AlumniId, EventId, RegistrationId};
use crate::error::{AppError, AppResult};
use crate::infrastructure::repository::EntityRepository;
use crate::models::{
    Event, EventPatch, EventStatus, NewEvent, Registration, RegistrationStatus,
};

/// How registration requests are checked against the event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationPolicy {
    /// Every call counts: no capacity or duplicate checks, attendee count only
    #[default]
    Permissive,
    /// One registration per (event, alumni), refused once the event is full
    Strict,
}

impl FromStr for RegistrationPolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permissive" => Ok(RegistrationPolicy::Permissive),
            "strict" => Ok(RegistrationPolicy::Strict),
            other => Err(AppError::ConfigurationError(format!(
                "unknown registration policy '{}'",
                other
            ))),
        }
    }
}

/// Event catalog views, as offered by the event management tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventFilter {
    All,
    Published,
    Draft,
    Cancelled,
    /// Published and starting after the moment of the query
    Upcoming,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub total: usize,
    pub published: usize,
    pub draft: usize,
    pub cancelled: usize,
    pub upcoming: usize,
}

#[derive(Debug, Clone)]
pub struct EventLifecycleManager {
    repository: EntityRepository,
    policy: RegistrationPolicy,
}

impl EventLifecycleManager {
    pub fn new(repository: EntityRepository, policy: RegistrationPolicy) -> Self {
        Self { repository, policy }
    }

    pub async fn create_event(&self, fields: NewEvent) -> AppResult<Event> {
        self.repository.create_event(fields).await
    }

    pub async fn update_event(&self, id: &EventId, patch: EventPatch) -> AppResult<Event> {
        self.repository.update_event(id, patch).await
    }

    pub async fn delete_event(&self, id: &EventId) -> bool {
        self.repository.delete_event(id).await
    }

    pub async fn publish(&self, id: &EventId) -> AppResult<Event> {
        self.set_status(id, EventStatus::Published).await
    }

    pub async fn unpublish(&self, id: &EventId) -> AppResult<Event> {
        self.set_status(id, EventStatus::Draft).await
    }

    pub async fn cancel(&self, id: &EventId) -> AppResult<Event> {
        self.set_status(id, EventStatus::Cancelled).await
    }

    async fn set_status(&self, id: &EventId, status: EventStatus) -> AppResult<Event> {
        let event = self
            .repository
            .update_event(id, EventPatch::status(status))
            .await?;
        info!("Event {} is now {}", id, status);
        Ok(event)
    }

    #[instrument(skip(self))]
    pub async fn register_for_event(
        &self,
        event_id: &EventId,
        alumni_id: &AlumniId,
    ) -> AppResult<Registration> {
        let policy = self.policy;
        let now = self.repository.clock().now();

        let attendees = self
            .repository
            .modify_event(event_id, |event, ledger| {
                if policy == RegistrationPolicy::Strict {
                    let key = (event.id.clone(), alumni_id.clone());
                    if ledger.contains(&key) {
                        return Err(AppError::State(format!(
                            "alumni {} is already registered for event {}",
                            alumni_id, event.id
                        )));
                    }
                    if event.is_at_capacity() {
                        return Err(AppError::State(format!(
                            "event {} is at capacity",
                            event.id
                        )));
                    }
                    ledger.insert(key);
                }
                event.attendees_count = event.attendees_count.saturating_add(1);
                Ok(event.attendees_count)
            })
            .await?;

        debug!("Event {} now has {} attendees", event_id, attendees);
        Ok(Registration {
            id: RegistrationId::new(Uuid::new_v4().to_string()),
            event_id: event_id.clone(),
            alumni_id: alumni_id.clone(),
            status: RegistrationStatus::Registered,
            registered_at: now,
        })
    }

    /// Decrement the attendee count, never below zero
    #[instrument(skip(self))]
    pub async fn unregister_from_event(
        &self,
        event_id: &EventId,
        alumni_id: &AlumniId,
    ) -> AppResult<Event> {
        let policy = self.policy;

        self.repository
            .modify_event(event_id, |event, ledger| {
                if policy == RegistrationPolicy::Strict
                    && !ledger.remove(&(event.id.clone(), alumni_id.clone()))
                {
                    return Err(AppError::State(format!(
                        "alumni {} is not registered for event {}",
                        alumni_id, event.id
                    )));
                }
                if event.attendees_count == 0 {
                    warn!("Unregister on event {} with no attendees", event.id);
                }
                event.attendees_count = event.attendees_count.saturating_sub(1);
                Ok(event.clone())
            })
            .await
    }

    /// Classify against the clock at call time
    pub async fn events_by(&self, filter: EventFilter) -> Vec<Event> {
        let now = self.repository.clock().now();
        self.repository
            .get_all_events()
            .await
            .into_iter()
            .filter(|event| match filter {
                EventFilter::All => true,
                EventFilter::Published => event.status == EventStatus::Published,
                EventFilter::Draft => event.status == EventStatus::Draft,
                EventFilter::Cancelled => event.status == EventStatus::Cancelled,
                EventFilter::Upcoming => event.is_upcoming(now),
            })
            .collect()
    }

    pub async fn status_counts(&self) -> StatusCounts {
        let now = self.repository.clock().now();
        let events = self.repository.get_all_events().await;
        let mut counts = StatusCounts {
            total: events.len(),
            ..Default::default()
        };
        for event in &events {
            match event.status {
                EventStatus::Published => counts.published += 1,
                EventStatus::Draft => counts.draft += 1,
                EventStatus::Cancelled => counts.cancelled += 1,
            }
            if event.is_upcoming(now) {
                counts.upcoming += 1;
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ManualClock;
    use crate::data_seeder::SeedDataset;
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Arc;

    fn manager(policy: RegistrationPolicy) -> (EventLifecycleManager, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap(),
        ));
        let repo = EntityRepository::new(SeedDataset::builtin().unwrap(), clock.clone());
        (EventLifecycleManager::new(repo, policy), clock)
    }

    async fn small_event(manager: &EventLifecycleManager) -> Event {
        let fields = NewEvent::new("Book Club", "2024-12-01", "18:00", "Library", "Social", "1")
            .with_capacity(2)
            .with_status(EventStatus::Published);
        manager.create_event(fields).await.unwrap()
    }

    async fn attendees(manager: &EventLifecycleManager, id: &EventId) -> u32 {
        manager.repository.get_event(id).await.unwrap().attendees_count
    }

    #[tokio::test]
    async fn test_register_then_unregister_restores_count() {
        let (manager, _) = manager(RegistrationPolicy::Permissive);
        let id = EventId::from("2");
        let before = attendees(&manager, &id).await;
        let alumni = AlumniId::from("3");

        let registration = manager.register_for_event(&id, &alumni).await.unwrap();
        assert_eq!(registration.status, RegistrationStatus::Registered);
        assert_eq!(registration.event_id, id);
        assert_eq!(attendees(&manager, &id).await, before + 1);

        manager.unregister_from_event(&id, &alumni).await.unwrap();
        assert_eq!(attendees(&manager, &id).await, before);
    }

    #[tokio::test]
    async fn test_unregister_clamps_at_zero() {
        let (manager, _) = manager(RegistrationPolicy::Permissive);
        let event = small_event(&manager).await;
        let alumni = AlumniId::from("1");

        for _ in 0..3 {
            manager.unregister_from_event(&event.id, &alumni).await.unwrap();
        }
        assert_eq!(attendees(&manager, &event.id).await, 0);
    }

    #[tokio::test]
    async fn test_permissive_policy_exceeds_capacity() {
        let (manager, _) = manager(RegistrationPolicy::Permissive);
        let event = small_event(&manager).await;
        let alumni = AlumniId::from("1");

        for _ in 0..3 {
            manager.register_for_event(&event.id, &alumni).await.unwrap();
        }
        assert_eq!(attendees(&manager, &event.id).await, 3);
    }

    #[tokio::test]
    async fn test_strict_policy_rejects_duplicates_and_full_events() {
        let (manager, _) = manager(RegistrationPolicy::Strict);
        let event = small_event(&manager).await;

        manager
            .register_for_event(&event.id, &AlumniId::from("1"))
            .await
            .unwrap();
        let dup = manager
            .register_for_event(&event.id, &AlumniId::from("1"))
            .await;
        assert!(matches!(dup, Err(AppError::State(_))));
        assert!(
            manager
                .repository
                .is_registered(&event.id, &AlumniId::from("1"))
                .await
        );

        manager
            .register_for_event(&event.id, &AlumniId::from("2"))
            .await
            .unwrap();
        let full = manager
            .register_for_event(&event.id, &AlumniId::from("3"))
            .await;
        assert!(matches!(full, Err(AppError::State(_))));
        assert_eq!(attendees(&manager, &event.id).await, 2);

        let stranger = manager
            .unregister_from_event(&event.id, &AlumniId::from("4"))
            .await;
        assert!(matches!(stranger, Err(AppError::State(_))));
        assert_eq!(attendees(&manager, &event.id).await, 2);

        manager
            .unregister_from_event(&event.id, &AlumniId::from("2"))
            .await
            .unwrap();
        assert!(
            !manager
                .repository
                .is_registered(&event.id, &AlumniId::from("2"))
                .await
        );
        assert_eq!(attendees(&manager, &event.id).await, 1);
    }

    #[tokio::test]
    async fn test_unknown_event_is_not_found() {
        let (manager, _) = manager(RegistrationPolicy::Permissive);
        let missing = EventId::from("missing");
        let alumni = AlumniId::from("1");

        assert!(matches!(
            manager.register_for_event(&missing, &alumni).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            manager.unregister_from_event(&missing, &alumni).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_status_filters_and_counts() {
        let (manager, _) = manager(RegistrationPolicy::Permissive);
        manager
            .create_event(NewEvent::new("Draft", "2025-01-10", "09:00", "Online", "Workshop", "2"))
            .await
            .unwrap();
        manager.cancel(&EventId::from("1")).await.unwrap();

        assert_eq!(manager.events_by(EventFilter::All).await.len(), 4);
        assert_eq!(manager.events_by(EventFilter::Published).await.len(), 2);
        assert_eq!(manager.events_by(EventFilter::Draft).await.len(), 1);
        assert_eq!(manager.events_by(EventFilter::Cancelled).await.len(), 1);

        let counts = manager.status_counts().await;
        assert_eq!(
            (counts.total, counts.published, counts.draft, counts.cancelled),
            (4, 2, 1, 1)
        );
    }

    #[tokio::test]
    async fn test_upcoming_is_evaluated_at_query_time() {
        let (manager, clock) = manager(RegistrationPolicy::Permissive);
        // seeded published events: 2024-09-25, 2024-10-15 and 2024-11-08
        assert_eq!(manager.events_by(EventFilter::Upcoming).await.len(), 3);

        clock.set(Utc.with_ymd_and_hms(2024, 10, 1, 0, 0, 0).unwrap());
        assert_eq!(manager.events_by(EventFilter::Upcoming).await.len(), 2);

        clock.advance(Duration::days(60));
        assert!(manager.events_by(EventFilter::Upcoming).await.is_empty());
        assert_eq!(manager.status_counts().await.upcoming, 0);
    }

    #[tokio::test]
    async fn test_unpublish_returns_event_to_draft() {
        let (manager, _) = manager(RegistrationPolicy::Permissive);
        let draft = manager
            .create_event(NewEvent::new("Alumni Panel", "2024-12-05", "17:00", "Hall B", "Career", "4"))
            .await
            .unwrap();
        assert_eq!(draft.status, EventStatus::Draft);

        let published = manager.publish(&draft.id).await.unwrap();
        assert_eq!(published.status, EventStatus::Published);
        assert!(manager
            .events_by(EventFilter::Upcoming)
            .await
            .iter()
            .any(|e| e.id == draft.id));

        let unpublished = manager.unpublish(&draft.id).await.unwrap();
        assert_eq!(unpublished.status, EventStatus::Draft);
        assert!(!manager
            .events_by(EventFilter::Upcoming)
            .await
            .iter()
            .any(|e| e.id == draft.id));
        assert_eq!(manager.status_counts().await.draft, 1);

        assert!(matches!(
            manager.unpublish(&EventId::from("missing")).await,
            Err(AppError::NotFound(_))
        ));
    }
}
