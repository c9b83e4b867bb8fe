// Portal Service - the read/write interface handed to the presentation layer.
// Every call goes through the request simulator.

use std::sync::Arc;
use tracing::{info, instrument};

use crate::core::{AlumniId, EventId};
use crate::error::AppResult;
use crate::infrastructure::latency::RequestClass;
use crate::infrastructure::repository::EntityRepository;
use crate::infrastructure::request_simulator::{RequestSimulator, SimulatorStats};
use crate::infrastructure::viewer::{IdentityProvider, ViewerContext};
use crate::models::{
    Alumni, AnalyticsSnapshot, Event, EventPatch, Industry, NewEvent, Registration, Skill,
};
use crate::services::{
    AlumniQuery, AnalyticsAggregator, AnalyticsSource, EventFilter, EventLifecycleManager,
    QueryEngine, RegistrationPolicy, SearchSurface, StatusCounts,
};

/// Values offered by the directory's filter controls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryFilters {
    pub graduation_years: Vec<i32>,
    pub industries: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PortalService {
    repository: EntityRepository,
    query_engine: QueryEngine,
    lifecycle: EventLifecycleManager,
    analytics: AnalyticsAggregator,
    simulator: RequestSimulator,
    identity: Arc<dyn IdentityProvider>,
}

impl PortalService {
    pub fn new(
        repository: EntityRepository,
        simulator: RequestSimulator,
        identity: Arc<dyn IdentityProvider>,
        policy: RegistrationPolicy,
        analytics: AnalyticsSource,
    ) -> Self {
        Self {
            query_engine: QueryEngine::new(repository.clone()),
            lifecycle: EventLifecycleManager::new(repository.clone(), policy),
            analytics: AnalyticsAggregator::new(repository.clone(), analytics),
            repository,
            simulator,
            identity,
        }
    }

    pub fn viewer(&self) -> ViewerContext {
        self.identity.viewer()
    }

    pub fn simulator_stats(&self) -> SimulatorStats {
        self.simulator.stats()
    }

    /// Tear down: outstanding and later requests resolve as cancelled
    pub fn shutdown(&self) {
        self.simulator.shutdown();
    }

    // =========================================================================
    // Read interface
    // =========================================================================

    pub async fn list_alumni(&self) -> AppResult<Vec<Alumni>> {
        self.simulator
            .run(RequestClass::FetchAll, || async {
                Ok(self.repository.get_all_alumni().await)
            })
            .await
    }

    pub async fn get_alumni(&self, id: &AlumniId) -> AppResult<Alumni> {
        self.simulator
            .run(RequestClass::FetchAll, || self.repository.get_alumni(id))
            .await
    }

    /// One-shot search. Use [`PortalService::search_surface`] when searches may overlap.
    #[instrument(skip(self))]
    pub async fn search_alumni(&self, query: &AlumniQuery) -> AppResult<Vec<Alumni>> {
        self.simulator
            .run(RequestClass::Search, || async {
                Ok(self.query_engine.search_alumni(query).await)
            })
            .await
    }

    /// A fresh search surface with last-request-wins sequencing
    pub fn search_surface(&self) -> SearchSurface {
        SearchSurface::new(self.simulator.clone(), self.query_engine.clone())
    }

    pub async fn directory_filters(&self) -> AppResult<DirectoryFilters> {
        self.simulator
            .run(RequestClass::FetchAll, || async {
                Ok(DirectoryFilters {
                    graduation_years: self.query_engine.year_options().await,
                    industries: self.query_engine.industry_options().await,
                })
            })
            .await
    }

    pub async fn industries(&self) -> AppResult<Vec<Industry>> {
        self.simulator
            .run(RequestClass::FetchAll, || async {
                Ok(self.repository.industries().await)
            })
            .await
    }

    pub async fn skills(&self) -> AppResult<Vec<Skill>> {
        self.simulator
            .run(RequestClass::FetchAll, || async {
                Ok(self.repository.skills().await)
            })
            .await
    }

    pub async fn list_events(&self) -> AppResult<Vec<Event>> {
        self.list_events_by(EventFilter::All).await
    }

    pub async fn list_events_by(&self, filter: EventFilter) -> AppResult<Vec<Event>> {
        self.simulator
            .run(RequestClass::FetchAll, || async {
                Ok(self.lifecycle.events_by(filter).await)
            })
            .await
    }

    pub async fn event_status_counts(&self) -> AppResult<StatusCounts> {
        self.simulator
            .run(RequestClass::FetchAll, || async {
                Ok(self.lifecycle.status_counts().await)
            })
            .await
    }

    pub async fn get_analytics(&self) -> AppResult<AnalyticsSnapshot> {
        self.simulator
            .run(RequestClass::Analytics, || self.analytics.snapshot())
            .await
    }

    // =========================================================================
    // Write interface
    // =========================================================================

    #[instrument(skip(self, fields))]
    pub async fn create_event(&self, fields: NewEvent) -> AppResult<Event> {
        let event = self
            .simulator
            .run(RequestClass::Mutation, || self.lifecycle.create_event(fields))
            .await?;
        info!("Event {} created by portal", event.id);
        Ok(event)
    }

    #[instrument(skip(self, patch))]
    pub async fn update_event(&self, id: &EventId, patch: EventPatch) -> AppResult<Event> {
        self.simulator
            .run(RequestClass::Mutation, || self.lifecycle.update_event(id, patch))
            .await
    }

    /// `Ok(false)` when there was nothing to delete
    pub async fn delete_event(&self, id: &EventId) -> AppResult<bool> {
        self.simulator
            .run(RequestClass::Mutation, || async {
                Ok(self.lifecycle.delete_event(id).await)
            })
            .await
    }

    pub async fn publish_event(&self, id: &EventId) -> AppResult<Event> {
        self.simulator
            .run(RequestClass::Mutation, || self.lifecycle.publish(id))
            .await
    }

    pub async fn unpublish_event(&self, id: &EventId) -> AppResult<Event> {
        self.simulator
            .run(RequestClass::Mutation, || self.lifecycle.unpublish(id))
            .await
    }

    pub async fn cancel_event(&self, id: &EventId) -> AppResult<Event> {
        self.simulator
            .run(RequestClass::Mutation, || self.lifecycle.cancel(id))
            .await
    }

    pub async fn register_for_event(
        &self,
        event_id: &EventId,
        alumni_id: &AlumniId,
    ) -> AppResult<Registration> {
        self.simulator
            .run(RequestClass::Mutation, || {
                self.lifecycle.register_for_event(event_id, alumni_id)
            })
            .await
    }

    pub async fn unregister_from_event(
        &self,
        event_id: &EventId,
        alumni_id: &AlumniId,
    ) -> AppResult<Event> {
        self.simulator
            .run(RequestClass::Mutation, || {
                self.lifecycle.unregister_from_event(event_id, alumni_id)
            })
            .await
    }

    /// Register whoever the identity provider says is viewing
    pub async fn register_current_viewer(&self, event_id: &EventId) -> AppResult<Registration> {
        let viewer = self.viewer();
        self.register_for_event(event_id, &viewer.user_id).await
    }

    pub async fn unregister_current_viewer(&self, event_id: &EventId) -> AppResult<Event> {
        let viewer = self.viewer();
        self.unregister_from_event(event_id, &viewer.user_id).await
    }
}
