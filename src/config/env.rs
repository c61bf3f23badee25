use std::{num::NonZeroUsize, str::FromStr, time::Duration};

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub site: SiteVariant,
    pub classifier: ClassifierConfig,
    pub source: SourceConfig,
    pub pipeline: PipelineConfig,
    pub storage: StorageConfig,
    pub directories: DirectoryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteVariant {
    GoogleNews,
    Generic,
}

impl FromStr for SiteVariant {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "google-news" | "googlenews" => Ok(Self::GoogleNews),
            "generic" => Ok(Self::Generic),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub endpoint: String,
    pub mode: ClassifierMode,
    pub timeout: Option<Duration>,
}

/// Remote contract: one batched request, or the legacy one-title-per-request endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierMode {
    Batched,
    Single,
}

impl FromStr for ClassifierMode {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "batched" | "batch" => Ok(Self::Batched),
            "single" | "legacy" => Ok(Self::Single),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub location: String,
    pub fetch_timeout: Duration,
    pub refresh_crons: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub debounce: Duration,
    pub cache_capacity: NonZeroUsize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Sqlite,
    Memory,
}

impl FromStr for CacheBackend {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: CacheBackend,
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub logs_dir: String,
    pub data_dir: String,
    pub db_filename: String,
    pub output_filename: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for environment variable {key}")]
    Invalid { key: &'static str, value: String },
}
