use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::infrastructure::latency::{FixedLatency, JitterLatency, LatencyModel, NoLatency};
use crate::services::{AnalyticsSource, RegistrationPolicy};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub seed: SeedConfig,
    pub latency: LatencyConfig,
    pub analytics: AnalyticsSource,
    pub registration_policy: RegistrationPolicy,
    pub log_filter: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedConfig {
    /// JSON seed file; the built-in dataset is used when unset
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LatencyMode {
    None,
    Fixed,
    Jitter,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatencyConfig {
    pub mode: LatencyMode,
    pub fetch_all_ms: u64,
    pub request_ms: u64,
    pub jitter_min_ms: u64,
    pub jitter_max_ms: u64,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            mode: LatencyMode::Fixed,
            fetch_all_ms: 500,
            request_ms: 300,
            jitter_min_ms: 200,
            jitter_max_ms: 600,
        }
    }
}

impl LatencyConfig {
    pub fn build(&self) -> Arc<dyn LatencyModel> {
        match self.mode {
            LatencyMode::None => Arc::new(NoLatency),
            LatencyMode::Fixed => Arc::new(FixedLatency {
                fetch_all: Duration::from_millis(self.fetch_all_ms),
                request: Duration::from_millis(self.request_ms),
            }),
            LatencyMode::Jitter => Arc::new(JitterLatency::new(
                Duration::from_millis(self.jitter_min_ms),
                Duration::from_millis(self.jitter_max_ms),
            )),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: SeedConfig::default(),
            latency: LatencyConfig::default(),
            analytics: AnalyticsSource::default(),
            registration_policy: RegistrationPolicy::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key/value source; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let latency_defaults = defaults.latency.clone();

        let mode = match lookup("PORTAL_LATENCY_MODE").as_deref().map(str::trim) {
            None => latency_defaults.mode,
            Some("none") => LatencyMode::None,
            Some("fixed") => LatencyMode::Fixed,
            Some("jitter") => LatencyMode::Jitter,
            Some(other) => {
                return Err(AppError::ConfigurationError(format!(
                    "PORTAL_LATENCY_MODE must be none, fixed or jitter, got '{}'",
                    other
                )))
            }
        };

        Ok(Self {
            seed: SeedConfig {
                path: lookup("PORTAL_SEED_PATH").map(PathBuf::from),
            },
            latency: LatencyConfig {
                mode,
                fetch_all_ms: millis(&lookup, "PORTAL_FETCH_LATENCY_MS", latency_defaults.fetch_all_ms)?,
                request_ms: millis(&lookup, "PORTAL_REQUEST_LATENCY_MS", latency_defaults.request_ms)?,
                jitter_min_ms: millis(&lookup, "PORTAL_JITTER_MIN_MS", latency_defaults.jitter_min_ms)?,
                jitter_max_ms: millis(&lookup, "PORTAL_JITTER_MAX_MS", latency_defaults.jitter_max_ms)?,
            },
            analytics: match lookup("PORTAL_ANALYTICS") {
                Some(v) => v.parse()?,
                None => defaults.analytics,
            },
            registration_policy: match lookup("PORTAL_REGISTRATION_POLICY") {
                Some(v) => v.parse()?,
                None => defaults.registration_policy,
            },
            log_filter: lookup("PORTAL_LOG").unwrap_or(defaults.log_filter),
        })
    }
}

fn millis<F>(lookup: &F, key: &str, default: u64) -> AppResult<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| {
            AppError::ConfigurationError(format!("{} must be a number of milliseconds, got '{}'", key, raw))
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::latency::RequestClass;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.latency.mode, LatencyMode::Fixed);
        assert_eq!(config.analytics, AnalyticsSource::Computed);
        assert_eq!(config.registration_policy, RegistrationPolicy::Permissive);
        assert!(config.seed.path.is_none());

        let latency = config.latency.build();
        assert_eq!(latency.delay_for(RequestClass::FetchAll), Duration::from_millis(500));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("PORTAL_LATENCY_MODE", "none"),
            ("PORTAL_ANALYTICS", "baseline"),
            ("PORTAL_REGISTRATION_POLICY", "strict"),
            ("PORTAL_SEED_PATH", "/tmp/seed.json"),
        ]))
        .unwrap();

        assert_eq!(config.latency.mode, LatencyMode::None);
        assert_eq!(config.analytics, AnalyticsSource::Baseline);
        assert_eq!(config.registration_policy, RegistrationPolicy::Strict);
        assert_eq!(config.seed.path, Some(PathBuf::from("/tmp/seed.json")));
    }

    #[test]
    fn test_invalid_values() {
        assert!(Config::from_lookup(lookup(&[("PORTAL_LATENCY_MODE", "slow")])).is_err());
        assert!(Config::from_lookup(lookup(&[("PORTAL_REQUEST_LATENCY_MS", "soon")])).is_err());
        assert!(Config::from_lookup(lookup(&[("PORTAL_REGISTRATION_POLICY", "vip")])).is_err());
    }
}
