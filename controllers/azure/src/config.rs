//! Controller configuration read from environment variables.

use crate::error::ControllerError;
use std::time::Duration;

/// Controller settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Requeue interval for resources that are ready and in sync
    pub poll_interval: Duration,
    /// Requeue interval while Azure is creating, updating or deleting a resource
    pub short_wait: Duration,
    /// Concurrent reconciliations per resource kind
    pub reconcile_concurrency: u16,
    /// Delay between an event and its reconciliation
    pub debounce: Duration,
    /// Port of the metrics and probe server
    pub metrics_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            short_wait: Duration::from_secs(30),
            reconcile_concurrency: 3,
            debounce: Duration::from_secs(1),
            metrics_port: 8080,
        }
    }
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ControllerError> {
        let defaults = Self::default();
        Ok(Self {
            poll_interval: parse_interval(&lookup, "POLL_INTERVAL_SECONDS", defaults.poll_interval)?,
            short_wait: parse_interval(&lookup, "SHORT_WAIT_SECONDS", defaults.short_wait)?,
            reconcile_concurrency: parse_var(
                &lookup,
                "RECONCILE_CONCURRENCY",
                defaults.reconcile_concurrency,
            )?,
            debounce: Duration::from_secs(parse_var(
                &lookup,
                "DEBOUNCE_SECONDS",
                defaults.debounce.as_secs(),
            )?),
            metrics_port: parse_var(&lookup, "METRICS_PORT", defaults.metrics_port)?,
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ControllerError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            ControllerError::InvalidConfig(format!("{} must be a non-negative integer, got {:?}", key, raw))
        }),
    }
}

/// A requeue interval; zero would requeue without pause
fn parse_interval(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> Result<Duration, ControllerError> {
    match parse_var(lookup, key, default.as_secs())? {
        0 => Err(ControllerError::InvalidConfig(format!("{} must be at least 1 second", key))),
        seconds => Ok(Duration::from_secs(seconds)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.short_wait, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("POLL_INTERVAL_SECONDS", "300"),
            ("RECONCILE_CONCURRENCY", "8"),
            ("METRICS_PORT", "9090"),
        ]))
        .unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(300));
        assert_eq!(config.reconcile_concurrency, 8);
        assert_eq!(config.metrics_port, 9090);
        assert_eq!(config.short_wait, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_value() {
        let err = Config::from_lookup(lookup(&[("SHORT_WAIT_SECONDS", "soon")])).unwrap_err();
        assert!(matches!(err, ControllerError::InvalidConfig(_)));
        assert!(err.to_string().contains("SHORT_WAIT_SECONDS"));
    }

    #[test]
    fn test_zero_requeue_intervals_rejected() {
        for key in ["POLL_INTERVAL_SECONDS", "SHORT_WAIT_SECONDS"] {
            let err = Config::from_lookup(lookup(&[(key, "0")])).unwrap_err();
            assert!(matches!(err, ControllerError::InvalidConfig(_)));
            assert!(err.to_string().contains(key));
        }

        let config = Config::from_lookup(lookup(&[("DEBOUNCE_SECONDS", "0")])).unwrap();
        assert_eq!(config.debounce, Duration::ZERO);
    }
}
