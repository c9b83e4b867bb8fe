use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::core::{AlumniId, EventId, RegistrationId};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    Published,
    Cancelled,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventStatus::Draft => "draft",
            EventStatus::Published => "published",
            EventStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: Option<String>,
    pub event_date: NaiveDate,
    pub event_time: NaiveTime,
    pub location: String,
    pub category: String,
    pub status: EventStatus,
    /// `None` means unlimited
    pub max_capacity: Option<u32>,
    pub registration_fee: f64,
    pub attendees_count: u32,
    pub organizer_id: AlumniId,
    pub created_by: AlumniId,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Start of the event, reading date and time as UTC
    pub fn starts_at(&self) -> DateTime<Utc> {
        self.event_date.and_time(self.event_time).and_utc()
    }

    /// Published and starting strictly after `now`
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.status == EventStatus::Published && self.starts_at() > now
    }

    pub fn is_free(&self) -> bool {
        self.registration_fee == 0.0
    }

    pub fn is_at_capacity(&self) -> bool {
        match self.max_capacity {
            Some(cap) => self.attendees_count >= cap,
            None => false,
        }
    }
}

/// Fields supplied when creating an event. Required fields are optional here so
/// that their absence can be reported as a validation failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewEvent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_date: Option<String>,
    pub event_time: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub status: Option<EventStatus>,
    pub max_capacity: Option<u32>,
    pub registration_fee: Option<f64>,
    pub organizer_id: Option<AlumniId>,
    pub created_by: Option<AlumniId>,
    pub image_url: Option<String>,
}

impl NewEvent {
    pub fn new(
        title: impl Into<String>,
        event_date: impl Into<String>,
        event_time: impl Into<String>,
        location: impl Into<String>,
        category: impl Into<String>,
        organizer_id: impl Into<AlumniId>,
    ) -> Self {
        Self {
            title: Some(title.into()),
            event_date: Some(event_date.into()),
            event_time: Some(event_time.into()),
            location: Some(location.into()),
            category: Some(category.into()),
            organizer_id: Some(organizer_id.into()),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.max_capacity = Some(capacity);
        self
    }

    pub fn with_fee(mut self, fee: f64) -> Self {
        self.registration_fee = Some(fee);
        self
    }

    /// Check every required field and build the record. Nothing is stored here.
    pub(crate) fn into_event(
        self,
        id: EventId,
        now: DateTime<Utc>,
    ) -> AppResult<Event> {
        let title = required_text("title", self.title)?;
        let event_date = parse_date(&required_text("event_date", self.event_date)?)?;
        let event_time = parse_time(&required_text("event_time", self.event_time)?)?;
        let location = required_text("location", self.location)?;
        let category = required_text("category", self.category)?;
        let organizer_id = match self.organizer_id {
            Some(id) if !id.as_str().trim().is_empty() => id,
            _ => return Err(missing("organizer_id")),
        };
        let registration_fee = check_fee(self.registration_fee.unwrap_or(0.0))?;

        Ok(Event {
            id,
            title,
            description: self.description,
            event_date,
            event_time,
            location,
            category,
            status: self.status.unwrap_or(EventStatus::Draft),
            max_capacity: self.max_capacity,
            registration_fee,
            attendees_count: 0,
            created_by: self.created_by.unwrap_or_else(|| organizer_id.clone()),
            organizer_id,
            image_url: self.image_url,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update merged into an existing event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventPatch {
    pub title: Option<String>,
    #[serde(deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub event_date: Option<String>,
    pub event_time: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub status: Option<EventStatus>,
    #[serde(deserialize_with = "double_option")]
    pub max_capacity: Option<Option<u32>>,
    pub registration_fee: Option<f64>,
    pub organizer_id: Option<AlumniId>,
    #[serde(deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
}

impl EventPatch {
    pub fn status(status: EventStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Produce the merged record without touching `current`
    pub(crate) fn merged_into(&self, current: &Event, now: DateTime<Utc>) -> AppResult<Event> {
        let mut next = current.clone();

        if let Some(title) = &self.title {
            next.title = required_text("title", Some(title.clone()))?;
        }
        if let Some(description) = &self.description {
            next.description = description.clone();
        }
        if let Some(date) = &self.event_date {
            next.event_date = parse_date(date)?;
        }
        if let Some(time) = &self.event_time {
            next.event_time = parse_time(time)?;
        }
        if let Some(location) = &self.location {
            next.location = required_text("location", Some(location.clone()))?;
        }
        if let Some(category) = &self.category {
            next.category = required_text("category", Some(category.clone()))?;
        }
        if let Some(status) = self.status {
            next.status = status;
        }
        if let Some(capacity) = self.max_capacity {
            next.max_capacity = capacity;
        }
        if let Some(fee) = self.registration_fee {
            next.registration_fee = check_fee(fee)?;
        }
        if let Some(organizer) = &self.organizer_id {
            if organizer.as_str().trim().is_empty() {
                return Err(missing("organizer_id"));
            }
            next.organizer_id = organizer.clone();
        }
        if let Some(image_url) = &self.image_url {
            next.image_url = image_url.clone();
        }

        next.updated_at = now;
        Ok(next)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Registered,
    Cancelled,
    Attended,
}

/// Returned from a successful registration call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub id: RegistrationId,
    pub event_id: EventId,
    pub alumni_id: AlumniId,
    pub status: RegistrationStatus,
    pub registered_at: DateTime<Utc>,
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn missing(field: &str) -> AppError {
    AppError::Validation(format!("{} is required", field))
}

fn required_text(field: &str, value: Option<String>) -> AppResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(missing(field)),
    }
}

fn parse_date(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| AppError::Validation(format!("event_date '{}' is not YYYY-MM-DD: {}", raw, e)))
}

fn parse_time(raw: &str) -> AppResult<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|e| AppError::Validation(format!("event_time '{}' is not HH:MM: {}", raw, e)))
}

fn check_fee(fee: f64) -> AppResult<f64> {
    if !fee.is_finite() || fee < 0.0 {
        return Err(AppError::Validation(format!(
            "registration_fee must be a non-negative number, got {}",
            fee
        )));
    }
    Ok(fee)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_new_event_defaults() {
        let event = NewEvent::new("Mixer", "2024-11-08", "19:00", "Delhi", "Social", "2")
            .into_event(EventId::from("9"), now())
            .unwrap();

        assert_eq!(event.status, EventStatus::Draft);
        assert_eq!(event.attendees_count, 0);
        assert_eq!(event.created_by, AlumniId::from("2"));
        assert_eq!(event.created_at, event.updated_at);
        assert!(event.is_free());
    }

    #[test]
    fn test_missing_fields_are_reported() {
        let mut draft = NewEvent::new("Mixer", "2024-11-08", "19:00", "Delhi", "Social", "2");
        draft.category = None;
        let err = draft.into_event(EventId::from("9"), now()).unwrap_err();
        assert_eq!(err, AppError::Validation("category is required".into()));

        let blank = NewEvent::new("   ", "2024-11-08", "19:00", "Delhi", "Social", "2");
        assert!(matches!(
            blank.into_event(EventId::from("9"), now()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_malformed_values_are_rejected() {
        let bad_date = NewEvent::new("Mixer", "08/11/2024", "19:00", "Delhi", "Social", "2");
        assert!(bad_date.into_event(EventId::from("9"), now()).is_err());

        let bad_fee =
            NewEvent::new("Mixer", "2024-11-08", "19:00", "Delhi", "Social", "2").with_fee(-5.0);
        assert!(bad_fee.into_event(EventId::from("9"), now()).is_err());
    }

    #[test]
    fn test_patch_merges_and_clears() {
        let event = NewEvent::new("Mixer", "2024-11-08", "19:00", "Delhi", "Social", "2")
            .with_capacity(50)
            .into_event(EventId::from("9"), now())
            .unwrap();

        let patch: EventPatch =
            serde_json::from_str(r#"{"title":"Winter Mixer","max_capacity":null}"#).unwrap();
        let later = now() + chrono::Duration::minutes(5);
        let merged = patch.merged_into(&event, later).unwrap();

        assert_eq!(merged.title, "Winter Mixer");
        assert_eq!(merged.max_capacity, None);
        assert_eq!(merged.location, "Delhi");
        assert_eq!(merged.updated_at, later);
        assert_eq!(merged.created_at, event.created_at);
    }

    #[test]
    fn test_upcoming_requires_published_future_start() {
        let mut event = NewEvent::new("Reunion", "2024-10-15", "18:00", "Campus", "Reunion", "1")
            .with_status(EventStatus::Published)
            .into_event(EventId::from("3"), now())
            .unwrap();

        assert!(event.is_upcoming(now()));
        assert!(!event.is_upcoming(event.starts_at()));

        event.status = EventStatus::Draft;
        assert!(!event.is_upcoming(now()));
    }
}
