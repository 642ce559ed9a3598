// src/config/config_manager.rs

use serde::{Serialize, Deserialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::RwLock;
use thiserror::Error;
use tracing::{info, warn};

use crate::model::placements::{PageType, SlotType};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read ads metadata from {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse ads metadata: {0}")]
    Parse(#[from] serde_json::Error),
}

/// 单个页面（或全局）的广告配置
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_per_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_slots: Option<BTreeSet<SlotType>>,
}

/// 分层广告配置：global + 按页面类型覆盖
///
/// 页面类型的配置存在时整体替换 global，不做逐字段合并。
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct AdsMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global: Option<PageConfig>,
    #[serde(flatten)]
    pub pages: HashMap<PageType, PageConfig>,
}

/// 解析后的页面配置，None 表示不限制
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedPageConfig {
    pub max_per_page: Option<usize>,
    pub enabled_slots: Option<BTreeSet<SlotType>>,
}

impl ResolvedPageConfig {
    pub fn is_slot_enabled(&self, slot: SlotType) -> bool {
        self.enabled_slots.as_ref().map_or(true, |enabled| enabled.contains(&slot))
    }

    /// 调用方指定的上限只替换 max_per_page
    pub fn with_max_per_page_override(mut self, max_per_page: Option<usize>) -> Self {
        if max_per_page.is_some() {
            self.max_per_page = max_per_page;
        }
        self
    }
}

impl From<&PageConfig> for ResolvedPageConfig {
    fn from(config: &PageConfig) -> Self {
        Self {
            max_per_page: config.max_per_page.map(|max| max as usize),
            enabled_slots: config.enabled_slots.clone(),
        }
    }
}

impl AdsMetadata {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(raw)?)
    }

    /// 页面配置 > global > 不限制
    pub fn resolve(&self, page_type: PageType) -> ResolvedPageConfig {
        self.pages
            .get(&page_type)
            .or(self.global.as_ref())
            .map(ResolvedPageConfig::from)
            .unwrap_or_default()
    }
}

/// 运行时持有当前 AdsMetadata，可整体替换
#[derive(Debug, Default)]
pub struct ConfigManager {
    metadata: RwLock<AdsMetadata>,
}

impl ConfigManager {
    pub fn new(metadata: AdsMetadata) -> Self {
        Self { metadata: RwLock::new(metadata) }
    }

    /// 从 JSON 文件加载；文件缺失或解析失败时记录日志并使用空配置
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        match Self::load_file(path.as_ref()) {
            Ok(metadata) => {
                info!(path = %path.as_ref().display(), pages = metadata.pages.len(), "ads metadata loaded");
                Self::new(metadata)
            }
            Err(e) => {
                warn!(error = %e, "ads metadata unavailable, running with no cap and all slots enabled");
                Self::default()
            }
        }
    }

    pub fn load_file(path: &Path) -> Result<AdsMetadata, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        AdsMetadata::from_json(&content)
    }

    pub fn update_metadata(&self, metadata: AdsMetadata) {
        let mut guard = self.metadata.write().unwrap_or_else(|e| e.into_inner());
        *guard = metadata;
    }

    pub fn metadata(&self) -> AdsMetadata {
        self.metadata.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn resolve(&self, page_type: PageType) -> ResolvedPageConfig {
        self.metadata.read().unwrap_or_else(|e| e.into_inner()).resolve(page_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn slots(list: &[SlotType]) -> Option<BTreeSet<SlotType>> {
        Some(list.iter().copied().collect())
    }

    #[test]
    fn absent_config_means_unlimited() {
        let resolved = AdsMetadata::default().resolve(PageType::Posts);
        assert_eq!(resolved, ResolvedPageConfig::default());
        assert!(resolved.is_slot_enabled(SlotType::Footer));
    }

    #[test]
    fn global_applies_when_page_missing() {
        let metadata = AdsMetadata::from_json(
            r#"{"global": {"maxPerPage": 2, "enabledSlots": ["header", "footer"]}}"#,
        )
        .unwrap();
        let resolved = metadata.resolve(PageType::Challenges);
        assert_eq!(resolved.max_per_page, Some(2));
        assert_eq!(resolved.enabled_slots, slots(&[SlotType::Header, SlotType::Footer]));
    }

    #[test]
    fn page_config_wholly_replaces_global() {
        let metadata = AdsMetadata::from_json(
            r#"{
                "global": {"maxPerPage": 2, "enabledSlots": ["header"]},
                "posts": {"enabledSlots": ["inline"]}
            }"#,
        )
        .unwrap();
        let resolved = metadata.resolve(PageType::Posts);
        // maxPerPage 不从 global 回填
        assert_eq!(resolved.max_per_page, None);
        assert_eq!(resolved.enabled_slots, slots(&[SlotType::Inline]));
        assert!(!resolved.is_slot_enabled(SlotType::Header));

        let home = metadata.resolve(PageType::Home);
        assert_eq!(home.max_per_page, Some(2));
    }

    #[test]
    fn empty_page_config_clears_global_limits() {
        let metadata =
            AdsMetadata::from_json(r#"{"global": {"maxPerPage": 1}, "tags": {}}"#).unwrap();
        assert_eq!(metadata.resolve(PageType::Tags), ResolvedPageConfig::default());
    }

    #[test]
    fn empty_document_is_not_an_error() {
        assert_eq!(AdsMetadata::from_json("  ").unwrap(), AdsMetadata::default());
        assert_eq!(AdsMetadata::from_json("{}").unwrap(), AdsMetadata::default());
    }

    #[test]
    fn override_replaces_only_max_per_page() {
        let resolved = ResolvedPageConfig {
            max_per_page: Some(3),
            enabled_slots: slots(&[SlotType::Header]),
        };
        let overridden = resolved.clone().with_max_per_page_override(Some(1));
        assert_eq!(overridden.max_per_page, Some(1));
        assert_eq!(overridden.enabled_slots, resolved.enabled_slots);
        assert_eq!(resolved.clone().with_max_per_page_override(None), resolved);
    }

    #[test]
    fn manager_falls_back_to_empty_config_on_bad_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2").unwrap();
        let manager = ConfigManager::from_file(file.path());
        assert_eq!(manager.metadata(), AdsMetadata::default());
        assert!(matches!(
            ConfigManager::load_file(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn manager_update_replaces_metadata() {
        let manager = ConfigManager::default();
        let mut metadata = AdsMetadata::default();
        metadata.pages.insert(
            PageType::Home,
            PageConfig { max_per_page: Some(1), enabled_slots: None },
        );
        manager.update_metadata(metadata);
        assert_eq!(manager.resolve(PageType::Home).max_per_page, Some(1));
        assert_eq!(manager.resolve(PageType::Posts).max_per_page, None);
    }
}
