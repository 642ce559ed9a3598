pub mod config_manager;

pub use config_manager::{AdsMetadata, ConfigError, ConfigManager, PageConfig, ResolvedPageConfig};
