// Simulated network latency

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;

/// Kinds of simulated requests; each may carry a different delay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestClass {
    /// Initial or refetch load of a whole collection
    FetchAll,
    Search,
    Mutation,
    Analytics,
}

pub trait LatencyModel: Send + Sync + Debug {
    fn delay_for(&self, class: RequestClass) -> Duration;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoLatency;

impl LatencyModel for NoLatency {
    fn delay_for(&self, _class: RequestClass) -> Duration {
        Duration::ZERO
    }
}

/// Same delay every time: one for full loads, one for everything else
#[derive(Debug, Clone, Copy)]
pub struct FixedLatency {
    pub fetch_all: Duration,
    pub request: Duration,
}

impl Default for FixedLatency {
    fn default() -> Self {
        Self {
            fetch_all: Duration::from_millis(500),
            request: Duration::from_millis(300),
        }
    }
}

impl LatencyModel for FixedLatency {
    fn delay_for(&self, class: RequestClass) -> Duration {
        match class {
            RequestClass::FetchAll => self.fetch_all,
            _ => self.request,
        }
    }
}

/// Uniformly random delay within `[min, max]`
#[derive(Debug, Clone, Copy)]
pub struct JitterLatency {
    pub min: Duration,
    pub max: Duration,
}

impl JitterLatency {
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }
}

impl LatencyModel for JitterLatency {
    fn delay_for(&self, _class: RequestClass) -> Duration {
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        Duration::from_millis(rand::rng().random_range(min..=max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_latency_by_class() {
        let latency = FixedLatency::default();
        assert_eq!(latency.delay_for(RequestClass::FetchAll), Duration::from_millis(500));
        assert_eq!(latency.delay_for(RequestClass::Search), Duration::from_millis(300));
        assert_eq!(latency.delay_for(RequestClass::Mutation), Duration::from_millis(300));
    }

    #[test]
    fn test_jitter_stays_in_bounds() {
        let latency = JitterLatency::new(Duration::from_millis(400), Duration::from_millis(200));
        for _ in 0..100 {
            let d = latency.delay_for(RequestClass::Search);
            assert!(d >= Duration::from_millis(200) && d <= Duration::from_millis(400));
        }
    }
}
