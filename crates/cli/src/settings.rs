//! CLI settings: built-in defaults, then an optional TOML file, then
//! `OFFLINE_QUEUE_*` environment variables.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use offline_queue_core::application::PersistRetryPolicy;
use offline_queue_core::config::{DEFAULT_STORAGE_KEY, MAX_QUEUE_SIZE};
use offline_queue_core::QueueConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "OFFLINE_QUEUE";
const FALLBACK_DB_PATH: &str = "~/.offline-queue/queue.db";
const MS_PER_HOUR: i64 = 60 * 60 * 1000;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// SQLite file holding the key-value table (`~` is expanded)
    pub db_path: String,
    pub storage_key: String,
    pub max_entries: usize,
    /// Default expiry age used by `expired`, `clean` and `sweep`
    pub max_age_hours: i64,
    pub sweep_interval_secs: u64,
    pub persist_max_attempts: u32,
    /// `pretty` or `json`
    pub log_format: String,
    /// When set, logs go to a daily rolling file here instead of stderr
    pub log_dir: Option<String>,
}

impl Settings {
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("db_path", default_db_path())?
            .set_default("storage_key", DEFAULT_STORAGE_KEY)?
            .set_default("max_entries", MAX_QUEUE_SIZE as i64)?
            .set_default("max_age_hours", 7_i64 * 24)?
            .set_default("sweep_interval_secs", 3600_i64)?
            .set_default("persist_max_attempts", 3_i64)?
            .set_default("log_format", "pretty")?;

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")
    }

    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.db_path).into_owned())
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        self.log_dir
            .as_deref()
            .map(|dir| PathBuf::from(shellexpand::tilde(dir).into_owned()))
    }

    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            storage_key: self.storage_key.clone(),
            max_entries: self.max_entries,
            default_max_age_ms: hours_to_ms(self.max_age_hours),
            persist_retry: PersistRetryPolicy {
                max_attempts: self.persist_max_attempts,
                ..PersistRetryPolicy::default()
            },
        }
    }
}

pub fn hours_to_ms(hours: i64) -> i64 {
    hours.saturating_mul(MS_PER_HOUR)
}

fn default_db_path() -> String {
    directories::ProjectDirs::from("com", "OfflineQueue", "offline-queue")
        .map(|dirs| dirs.data_dir().join("queue.db").to_string_lossy().into_owned())
        .unwrap_or_else(|| FALLBACK_DB_PATH.to_string())
}
