use std::{env, num::NonZeroUsize, str::FromStr, time::Duration};

use super::env::{
    AppConfig, CacheBackend, ClassifierConfig, ClassifierMode, ConfigError, DirectoryConfig,
    LoggingConfig, PipelineConfig, SiteVariant, SourceConfig, StorageConfig,
};

pub const DEFAULT_CLASSIFIER_URL: &str =
    "https://classify-articles-176115608786.europe-west9.run.app";

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let location = env::var("FEED_SOURCE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("FEED_SOURCE"))?;

        let site = parse_enum("SITE_VARIANT", SiteVariant::GoogleNews)?;

        let classifier = ClassifierConfig {
            endpoint: env::var("CLASSIFIER_URL")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_CLASSIFIER_URL.to_string()),
            mode: parse_enum("CLASSIFIER_MODE", ClassifierMode::Batched)?,
            timeout: parse_u64("CLASSIFIER_TIMEOUT_MS").map(Duration::from_millis),
        };

        let source = SourceConfig {
            location,
            fetch_timeout: Duration::from_millis(
                parse_u64("SOURCE_FETCH_TIMEOUT").unwrap_or(10_000),
            ),
            refresh_crons: env::var("REFRESH_CRONS")
                .map(|value| split_specs(&value))
                .unwrap_or_default(),
        };

        let pipeline = PipelineConfig {
            debounce: Duration::from_millis(parse_u64("DEBOUNCE_MS").unwrap_or(300)),
            cache_capacity: parse_u64("CACHE_CAPACITY")
                .and_then(|v| NonZeroUsize::new(v as usize))
                .unwrap_or_else(|| NonZeroUsize::new(5_000).unwrap_or(NonZeroUsize::MIN)),
        };

        let storage = StorageConfig {
            backend: parse_enum("CACHE_BACKEND", CacheBackend::Sqlite)?,
        };

        let directories = DirectoryConfig {
            logs_dir: env::var("LOGS_DIR").unwrap_or_else(|_| "logs".to_string()),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()),
            db_filename: env::var("DB_FILENAME").unwrap_or_else(|_| "cache.db".to_string()),
            output_filename: env::var("OUTPUT_FILENAME")
                .unwrap_or_else(|_| "filtered.html".to_string()),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        };

        Ok(Self {
            site,
            classifier,
            source,
            pipeline,
            storage,
            directories,
            logging,
        })
    }
}

fn parse_u64(key: &str) -> Option<u64> {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
}

fn parse_enum<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value }),
        _ => Ok(default),
    }
}

fn split_specs(value: &str) -> Vec<String> {
    value
        .split(';')
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}
