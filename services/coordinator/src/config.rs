//! Configuration for the coordinator.

use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Coordinator configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the SQLite database.
    pub database_path: String,

    /// Seconds between display refreshes. Zero disables refreshing.
    pub refresh_interval_secs: u64,

    /// Seconds between checks for entries whose start time has passed.
    pub finish_interval_secs: u64,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "db/teamo.db".to_string(),
            refresh_interval_secs: 60,
            finish_interval_secs: 5,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let database_path = lookup("TEAMO_DATABASE").unwrap_or(defaults.database_path);

        let refresh_interval_secs = match lookup("TEAMO_REFRESH_INTERVAL") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("invalid TEAMO_REFRESH_INTERVAL: {raw}"))?,
            None => defaults.refresh_interval_secs,
        };

        let finish_interval_secs = match lookup("TEAMO_FINISH_INTERVAL") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("invalid TEAMO_FINISH_INTERVAL: {raw}"))?,
            None => defaults.finish_interval_secs,
        };
        if finish_interval_secs == 0 {
            bail!("TEAMO_FINISH_INTERVAL must be greater than zero");
        }

        let log_level = lookup("TEAMO_LOG_LEVEL").unwrap_or(defaults.log_level);

        Ok(Self {
            database_path,
            refresh_interval_secs,
            finish_interval_secs,
            log_level,
        })
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
    }

    pub fn finish_interval(&self) -> Duration {
        Duration::from_secs(self.finish_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.database_path, "db/teamo.db");
        assert_eq!(config.refresh_interval(), Some(Duration::from_secs(60)));
        assert_eq!(config.finish_interval(), Duration::from_secs(5));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("TEAMO_DATABASE", "/tmp/t.db"),
            ("TEAMO_REFRESH_INTERVAL", "0"),
            ("TEAMO_FINISH_INTERVAL", "2"),
            ("TEAMO_LOG_LEVEL", "debug"),
        ])
        .unwrap();
        assert_eq!(config.database_path, "/tmp/t.db");
        assert_eq!(config.refresh_interval(), None);
        assert_eq!(config.finish_interval(), Duration::from_secs(2));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_rejects_bad_intervals() {
        assert!(load(&[("TEAMO_REFRESH_INTERVAL", "soon")]).is_err());
        assert!(load(&[("TEAMO_FINISH_INTERVAL", "0")]).is_err());
    }
}
