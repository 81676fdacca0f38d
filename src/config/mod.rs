//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

pub use cli::{
    AddCustomArgs, AddStandardArgs, CliArgs, Command, EditReviewArgs, FeedArgs, FoodArgs,
    LikeArgs, ResolveArgs, ReviewArgs, ReviewCreatedArgs, ReviewEditedArgs, ReviewFieldsArgs,
    ReviewsArgs, SettingsOverrides, UserArgs,
};

use std::{num::NonZeroU32, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::application::resolver::{
    DEFAULT_MAX_SUGGESTIONS, DEFAULT_SIMILARITY_THRESHOLD, ResolverConfig,
};
use crate::cache::LoadPolicy;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "bapddang";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_DB_ACQUIRE_TIMEOUT_SECS: u64 = 5;
const DEFAULT_LOAD_ATTEMPTS: u32 = 5;
const DEFAULT_LOAD_BACKOFF_MS: u64 = 200;
const DEFAULT_FEED_COUNT: u32 = 10;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub catalog: CatalogSettings,
    pub feed: FeedSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
    pub acquire_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub similarity_threshold: f64,
    pub max_suggestions: NonZeroU32,
    pub load_attempts: NonZeroU32,
    pub load_backoff: Duration,
}

impl CatalogSettings {
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            similarity_threshold: self.similarity_threshold,
            max_suggestions: self.max_suggestions.get() as usize,
        }
    }

    pub fn load_policy(&self) -> LoadPolicy {
        LoadPolicy {
            attempts: self.load_attempts.get(),
            initial_backoff: self.load_backoff,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub default_count: NonZeroU32,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("BAPDDANG").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

/// Resolve configuration using the process arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    catalog: RawCatalogSettings,
    feed: RawFeedSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &SettingsOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(threshold) = overrides.similarity_threshold {
            self.catalog.similarity_threshold = Some(threshold);
        }
        if let Some(max) = overrides.max_suggestions {
            self.catalog.max_suggestions = Some(max);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            database,
            catalog,
            feed,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            catalog: build_catalog_settings(catalog)?,
            feed: build_feed_settings(feed)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = database.url.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    let max_connections = non_zero_u32(
        database
            .max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .into(),
        "database.max_connections",
    )?;

    let acquire_secs = database
        .acquire_timeout_seconds
        .unwrap_or(DEFAULT_DB_ACQUIRE_TIMEOUT_SECS);
    if acquire_secs == 0 {
        return Err(LoadError::invalid(
            "database.acquire_timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(DatabaseSettings {
        url,
        max_connections,
        acquire_timeout: Duration::from_secs(acquire_secs),
    })
}

fn build_catalog_settings(catalog: RawCatalogSettings) -> Result<CatalogSettings, LoadError> {
    let similarity_threshold = catalog
        .similarity_threshold
        .unwrap_or(DEFAULT_SIMILARITY_THRESHOLD);
    if !(similarity_threshold > 0.0 && similarity_threshold <= 1.0) {
        return Err(LoadError::invalid(
            "catalog.similarity_threshold",
            "must be within (0, 1]",
        ));
    }

    let max_suggestions = non_zero_u32(
        catalog
            .max_suggestions
            .map(u64::from)
            .unwrap_or(DEFAULT_MAX_SUGGESTIONS as u64),
        "catalog.max_suggestions",
    )?;
    let load_attempts = non_zero_u32(
        catalog
            .load_attempts
            .unwrap_or(DEFAULT_LOAD_ATTEMPTS)
            .into(),
        "catalog.load_attempts",
    )?;
    let load_backoff =
        Duration::from_millis(catalog.load_backoff_ms.unwrap_or(DEFAULT_LOAD_BACKOFF_MS));

    Ok(CatalogSettings {
        similarity_threshold,
        max_suggestions,
        load_attempts,
        load_backoff,
    })
}

fn build_feed_settings(feed: RawFeedSettings) -> Result<FeedSettings, LoadError> {
    let default_count = non_zero_u32(
        feed.default_count.unwrap_or(DEFAULT_FEED_COUNT).into(),
        "feed.default_count",
    )?;
    Ok(FeedSettings { default_count })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
    acquire_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCatalogSettings {
    similarity_threshold: Option<f64>,
    max_suggestions: Option<u32>,
    load_attempts: Option<u32>,
    load_backoff_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawFeedSettings {
    default_count: Option<u32>,
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

#[cfg(test)]
mod tests;
