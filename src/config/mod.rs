pub mod env;
mod loader;

pub use env::{
    AppConfig, CacheBackend, ClassifierConfig, ClassifierMode, DirectoryConfig, PipelineConfig,
    SiteVariant, SourceConfig,
};
pub use loader::load_config;
