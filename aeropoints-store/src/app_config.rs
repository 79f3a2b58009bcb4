use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    pub flight_history: HistoryConfig,
    pub airport_history: HistoryConfig,
    pub stats: StatsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding one JSON file per history key.
    pub dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    pub max_entries: usize,
    pub storage_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StatsConfig {
    pub top_limit: usize,
    pub recent_limit: usize,
    pub refresh_interval_secs: u64,
}

impl HistoryConfig {
    pub fn flight_default() -> Self {
        Self {
            max_entries: 20,
            storage_key: "flight_search_history".to_string(),
        }
    }

    pub fn airport_default() -> Self {
        Self {
            max_entries: 5,
            storage_key: "airport_search_history".to_string(),
        }
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            top_limit: 5,
            recent_limit: 3,
            refresh_interval_secs: 60,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                dir: PathBuf::from(".aeropoints"),
            },
            flight_history: HistoryConfig::flight_default(),
            airport_history: HistoryConfig::airport_default(),
            stats: StatsConfig::default(),
        }
    }
}

impl Config {
    /// Load from `./config`, honouring `RUN_MODE` and `AEROPOINTS__*` overrides.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    pub fn load_from(config_dir: &str) -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let defaults = Config::default();
        let flight = &defaults.flight_history;
        let airport = &defaults.airport_history;

        let s = config::Config::builder()
            .set_default("storage.dir", defaults.storage.dir.to_string_lossy().into_owned())?
            .set_default("flight_history.max_entries", flight.max_entries as i64)?
            .set_default("flight_history.storage_key", flight.storage_key.as_str())?
            .set_default("airport_history.max_entries", airport.max_entries as i64)?
            .set_default("airport_history.storage_key", airport.storage_key.as_str())?
            .set_default("stats.top_limit", defaults.stats.top_limit as i64)?
            .set_default("stats.recent_limit", defaults.stats.recent_limit as i64)?
            .set_default("stats.refresh_interval_secs", defaults.stats.refresh_interval_secs as i64)?
            // Shipped defaults, then the run mode file, then untracked local tweaks
            .add_source(config::File::with_name(&format!("{}/default", config_dir)).required(false))
            .add_source(config::File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
            .add_source(config::File::with_name(&format!("{}/local", config_dir)).required(false))
            // Eg. `AEROPOINTS__FLIGHT_HISTORY__MAX_ENTRIES=10`
            .add_source(config::Environment::with_prefix("AEROPOINTS").separator("__"))
            .build()?;

        let config: Config = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        for (section, history) in [("flight_history", &self.flight_history), ("airport_history", &self.airport_history)] {
            if history.max_entries == 0 {
                return Err(config::ConfigError::Message(format!("{}.max_entries must be at least 1", section)));
            }
            if history.storage_key.trim().is_empty() {
                return Err(config::ConfigError::Message(format!("{}.storage_key must not be empty", section)));
            }
        }
        if self.flight_history.storage_key == self.airport_history.storage_key {
            return Err(config::ConfigError::Message("history storage keys must differ".to_string()));
        }
        if self.stats.refresh_interval_secs == 0 {
            return Err(config::ConfigError::Message("stats.refresh_interval_secs must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults_without_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(config.flight_history.max_entries, 20);
        assert_eq!(config.airport_history.max_entries, 5);
        assert_eq!(config.airport_history.storage_key, "airport_search_history");
        assert_eq!(config.stats.refresh_interval_secs, 60);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            "[flight_history]\nmax_entries = 10\n\n[stats]\ntop_limit = 3\n",
        )
        .unwrap();
        let config = Config::load_from(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(config.flight_history.max_entries, 10);
        assert_eq!(config.flight_history.storage_key, "flight_search_history");
        assert_eq!(config.stats.top_limit, 3);
        assert_eq!(config.stats.recent_limit, 3);
    }

    #[test]
    fn test_zero_bound_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("local.toml"), "[airport_history]\nmax_entries = 0\n").unwrap();
        assert!(Config::load_from(dir.path().to_str().unwrap()).is_err());
    }
}
