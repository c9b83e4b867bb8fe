// Portal records - alumni directory, event catalog and analytics

pub mod alumni;
pub mod analytics;
pub mod event;

pub use alumni::{Alumni, Industry, Skill};
pub use analytics::{AnalyticsSnapshot, AttendanceRate, DistributionEntry, MonthlyEngagement};
pub use event::{Event, EventPatch, EventStatus, NewEvent, Registration, RegistrationStatus};
