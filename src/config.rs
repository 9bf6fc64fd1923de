use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_pin_store")]
    pub pin_store: PathBuf,
}

fn default_max_connections() -> u32 {
    5
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_pin_store() -> PathBuf {
    PathBuf::from(".taskflow").join("pins.json")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: default_max_connections(),
            poll_interval_secs: default_poll_interval_secs(),
            pin_store: default_pin_store(),
        }
    }
}

impl AppConfig {
    /// Reads `path` when given, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_path(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {:?}", path);
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("DATABASE_URL").or_else(|| lookup("TASKFLOW_DB_URL")) {
            self.database_url = Some(url);
        }
        if let Some(secs) = lookup("TASKFLOW_POLL_SECS") {
            self.poll_interval_secs = secs
                .parse()
                .with_context(|| format!("TASKFLOW_POLL_SECS must be a number of seconds, got {secs:?}"))?;
        }
        if let Some(path) = lookup("TASKFLOW_PIN_STORE") {
            self.pin_store = PathBuf::from(path);
        }
        Ok(())
    }

    pub fn database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL (or TASKFLOW_DB_URL) must be set to the sales Postgres instance")
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_dashboard_behaviour() {
        let config = AppConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.max_connections, 5);
        assert!(config.database_url().is_err());
    }

    #[test]
    fn legacy_database_variable_is_accepted() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[("TASKFLOW_DB_URL", "postgres://localhost/taskflow")]))
            .unwrap();
        assert_eq!(config.database_url().unwrap(), "postgres://localhost/taskflow");
    }

    #[test]
    fn bad_poll_interval_is_rejected() {
        let mut config = AppConfig::default();
        assert!(config.apply_env(env(&[("TASKFLOW_POLL_SECS", "soon")])).is_err());
    }

    #[test]
    fn file_values_fill_unset_fields_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taskflow.toml");
        fs::write(&path, "poll_interval_secs = 30\n").unwrap();

        let config = AppConfig::load_from_path(&path).unwrap();
        assert_eq!(config.poll_interval_secs, 30);
        assert_eq!(config.pin_store, default_pin_store());
    }
}
