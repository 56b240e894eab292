//! Configuration loading
//!
//! The data directory is resolved in this order:
//! 1. `TASKTIDE_HOME` environment variable.
//! 2. `~/.local/share/tasktide` (platform data dir, via `dirs`).
//! 3. `./.tasktide` (fallback).
//!
//! An optional `config.toml` inside the data directory sets the rest, and
//! `TASKTIDE_TICK_SECS` overrides the recurrence tick interval.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::recurrence::DEFAULT_TICK;

pub const HOME_ENV: &str = "TASKTIDE_HOME";
pub const TICK_ENV: &str = "TASKTIDE_TICK_SECS";
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Directory holding all durable state.
    #[serde(skip)]
    pub data_dir: PathBuf,

    /// Seconds between recurrence evaluations while a session is open.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
}

fn default_tick_interval_secs() -> u64 {
    DEFAULT_TICK.as_secs()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            tick_interval_secs: default_tick_interval_secs(),
        }
    }
}

impl Config {
    /// Loads configuration from the environment and the data directory.
    pub fn load() -> Result<Self> {
        let data_dir = std::env::var_os(HOME_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);
        let mut config = Self::load_from_dir(&data_dir)?;
        if let Ok(raw) = std::env::var(TICK_ENV) {
            config.tick_interval_secs = parse_tick_secs(&raw)?;
        }
        Ok(config)
    }

    /// Loads `config.toml` from `dir`, falling back to defaults if absent.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        let mut config: Config = match fs::read_to_string(&path) {
            Ok(raw) => toml::from_str(&raw)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Config::default(),
            Err(e) => return Err(Error::storage(path.display().to_string(), e)),
        };
        if config.tick_interval_secs == 0 {
            return Err(Error::Config("tick_interval_secs must be positive".into()));
        }
        config.data_dir = dir.to_path_buf();
        Ok(config)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|p| p.join("tasktide"))
        .unwrap_or_else(|| PathBuf::from(".tasktide"))
}

/// Parses a tick interval override in whole seconds.
pub fn parse_tick_secs(raw: &str) -> Result<u64> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(Error::validation(format!("{} must be positive", TICK_ENV))),
        Ok(secs) => Ok(secs),
        Err(e) => Err(Error::validation(format!("{} '{}': {}", TICK_ENV, raw, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap();
        assert_eq!(config.tick_interval_secs, 60);
        assert_eq!(config.data_dir, dir.path());
        assert_eq!(config.tick_interval(), Duration::from_secs(60));
    }

    #[test]
    fn reads_tick_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "tick_interval_secs = 5\n").unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap();
        assert_eq!(config.tick_interval_secs, 5);
    }

    #[test]
    fn rejects_bad_toml_and_zero_tick() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "tick_interval_secs = \"soon\"").unwrap();
        assert!(matches!(Config::load_from_dir(dir.path()), Err(Error::Config(_))));

        fs::write(dir.path().join(CONFIG_FILE), "tick_interval_secs = 0").unwrap();
        assert!(matches!(Config::load_from_dir(dir.path()), Err(Error::Config(_))));
    }

    #[test]
    fn tick_override_parsing() {
        assert_eq!(parse_tick_secs(" 30 ").unwrap(), 30);
        assert!(parse_tick_secs("0").is_err());
        assert!(parse_tick_secs("soon").is_err());
    }
}
