use serde::{Deserialize, Serialize};

/// Derived, read-only summary of the directory and event catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    pub total_alumni: usize,
    pub active_alumni: usize,
    pub total_events: usize,
    pub avg_attendance_rate: f64,
    pub monthly_engagement: Vec<MonthlyEngagement>,
    pub industry_distribution: Vec<DistributionEntry>,
    pub graduation_year_distribution: Vec<DistributionEntry>,
    pub geographic_distribution: Vec<DistributionEntry>,
    pub event_attendance_rates: Vec<AttendanceRate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyEngagement {
    pub month: String,
    pub events: usize,
    pub registrations: u64,
    /// Only present in supplied baseline data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connections: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionEntry {
    pub label: String,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRate {
    pub event: String,
    pub attendees: u32,
    pub capacity: Option<u32>,
    /// 0-100 integer percentage; `None` when the event has no usable capacity
    pub rate: Option<u32>,
}

impl AnalyticsSnapshot {
    pub fn percentage_total(entries: &[DistributionEntry]) -> f64 {
        entries.iter().map(|e| e.percentage).sum()
    }
}
