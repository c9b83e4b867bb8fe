// Analytics Aggregator - summary metrics derived from the current store snapshot

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::infrastructure::repository::EntityRepository;
use crate::models::{
    Alumni, AnalyticsSnapshot, AttendanceRate, DistributionEntry, Event, MonthlyEngagement,
};

pub const UNASSIGNED_INDUSTRY: &str = "Unassigned";
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// Where analytics snapshots come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyticsSource {
    /// Derived from the live collections on every request
    #[default]
    Computed,
    /// The fixed snapshot shipped with the seed data
    Baseline,
}

impl FromStr for AnalyticsSource {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "computed" => Ok(AnalyticsSource::Computed),
            "baseline" => Ok(AnalyticsSource::Baseline),
            other => Err(AppError::ConfigurationError(format!(
                "unknown analytics source '{}'",
                other
            ))),
        }
    }
}

/// `round(count / total * 100, 1)`, or 0 when there is nothing to divide by
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round1(count as f64 / total as f64 * 100.0)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Integer attendance percentage; `None` when capacity is absent or zero
pub fn attendance_rate(attendees: u32, capacity: Option<u32>) -> Option<u32> {
    match capacity {
        Some(cap) if cap > 0 => Some((attendees as f64 / cap as f64 * 100.0).round() as u32),
        _ => None,
    }
}

/// Count labels, keeping first-seen order for ties
fn tally<I>(labels: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = String>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();
    for label in labels {
        match index.get(&label) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(label.clone(), counts.len());
                counts.push((label, 1));
            }
        }
    }
    counts
}

/// One-decimal shares of `total` that add up to exactly 100.0. Each share is
/// floored in tenths, then the missing tenths go to the largest remainders
/// (earlier entries win ties), so no share is more than 0.1 off its exact value.
fn apportion(counts: &[usize], total: usize) -> Vec<f64> {
    if total == 0 {
        return vec![0.0; counts.len()];
    }
    let total = total as u64;
    let scaled: Vec<u64> = counts.iter().map(|&c| c as u64 * 1000).collect();
    let mut tenths: Vec<u64> = scaled.iter().map(|s| s / total).collect();

    let counted: u64 = counts.iter().map(|&c| c as u64).sum();
    let target = (counted * 1000 + total / 2) / total;
    let missing = target.saturating_sub(tenths.iter().sum());

    let mut by_remainder: Vec<usize> = (0..counts.len()).collect();
    by_remainder.sort_by(|&a, &b| (scaled[b] % total).cmp(&(scaled[a] % total)));
    for &i in by_remainder.iter().take(missing as usize) {
        tenths[i] += 1;
    }

    tenths.into_iter().map(|t| t as f64 / 10.0).collect()
}

fn to_entries(counts: Vec<(String, usize)>, total: usize) -> Vec<DistributionEntry> {
    let shares = apportion(&counts.iter().map(|(_, c)| *c).collect::<Vec<_>>(), total);
    counts
        .into_iter()
        .zip(shares)
        .map(|((label, count), percentage)| DistributionEntry {
            label,
            count,
            percentage,
        })
        .collect()
}

fn by_count_desc<I>(labels: I, total: usize) -> Vec<DistributionEntry>
where
    I: IntoIterator<Item = String>,
{
    let mut counts = tally(labels);
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    to_entries(counts, total)
}

/// Pure aggregation over one snapshot of the collections
pub fn compute_analytics(alumni: &[Alumni], events: &[Event]) -> AnalyticsSnapshot {
    let total_alumni = alumni.len();

    let industry_distribution = by_count_desc(
        alumni.iter().map(|a| {
            a.industry_name()
                .unwrap_or(UNASSIGNED_INDUSTRY)
                .to_string()
        }),
        total_alumni,
    );

    let geographic_distribution = by_count_desc(
        alumni
            .iter()
            .map(|a| a.location.clone().unwrap_or_else(|| UNKNOWN_LOCATION.to_string())),
        total_alumni,
    );

    let mut years: BTreeMap<i32, usize> = BTreeMap::new();
    for a in alumni {
        *years.entry(a.graduation_year).or_default() += 1;
    }
    let graduation_year_distribution = to_entries(
        years
            .into_iter()
            .rev()
            .map(|(year, count)| (year.to_string(), count))
            .collect(),
        total_alumni,
    );

    let mut months: BTreeMap<String, (usize, u64)> = BTreeMap::new();
    for event in events {
        let slot = months
            .entry(event.event_date.format("%Y-%m").to_string())
            .or_default();
        slot.0 += 1;
        slot.1 += u64::from(event.attendees_count);
    }
    let monthly_engagement = months
        .into_iter()
        .map(|(month, (events, registrations))| MonthlyEngagement {
            month,
            events,
            registrations,
            connections: None,
        })
        .collect();

    let event_attendance_rates: Vec<AttendanceRate> = events
        .iter()
        .map(|e| AttendanceRate {
            event: e.title.clone(),
            attendees: e.attendees_count,
            capacity: e.max_capacity,
            rate: attendance_rate(e.attendees_count, e.max_capacity),
        })
        .collect();

    let exact_rates: Vec<f64> = events
        .iter()
        .filter_map(|e| match e.max_capacity {
            Some(cap) if cap > 0 => Some(e.attendees_count as f64 / cap as f64 * 100.0),
            _ => None,
        })
        .collect();
    let avg_attendance_rate = if exact_rates.is_empty() {
        0.0
    } else {
        round1(exact_rates.iter().sum::<f64>() / exact_rates.len() as f64)
    };

    AnalyticsSnapshot {
        total_alumni,
        active_alumni: alumni.iter().filter(|a| a.is_active).count(),
        total_events: events.len(),
        avg_attendance_rate,
        monthly_engagement,
        industry_distribution,
        graduation_year_distribution,
        geographic_distribution,
        event_attendance_rates,
    }
}

#[derive(Debug, Clone)]
pub struct AnalyticsAggregator {
    repository: EntityRepository,
    source: AnalyticsSource,
}

impl AnalyticsAggregator {
    pub fn new(repository: EntityRepository, source: AnalyticsSource) -> Self {
        Self { repository, source }
    }

    pub async fn snapshot(&self) -> AppResult<AnalyticsSnapshot> {
        if self.source == AnalyticsSource::Baseline {
            match self.repository.baseline_analytics().await {
                Some(baseline) => return Ok(baseline),
                None => warn!("No baseline analytics in seed data, computing instead"),
            }
        }

        let alumni = self.repository.get_all_alumni().await;
        let events = self.repository.get_all_events().await;
        let snapshot = compute_analytics(&alumni, &events);
        debug!(
            "Computed analytics over {} alumni and {} events",
            snapshot.total_alumni, snapshot.total_events
        );
        Ok(snapshot)
    }
}
