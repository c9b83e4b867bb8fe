// Portal services built on the entity repository
pub mod analytics;
pub mod event_lifecycle;
pub mod query_engine;
pub mod search_surface;

pub use analytics::{compute_analytics, AnalyticsAggregator, AnalyticsSource};
pub use event_lifecycle::{EventFilter, EventLifecycleManager, RegistrationPolicy, StatusCounts};
pub use query_engine::{AlumniQuery, QueryEngine};
pub use search_surface::{SearchState, SearchSurface};
