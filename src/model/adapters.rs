// src/model/adapters.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

use crate::model::campaign::Campaign;
use crate::model::placements::PageType;
use crate::placement::eligibility::filter_eligible;

/// 广告活动存储相关错误
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("campaign store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("campaign records could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("campaign store request failed: {0}")]
    Http(String),

    #[error("campaign store timed out after {0} ms")]
    Timeout(u64),
}

/// 向存储查询候选广告活动的条件
///
/// 对应存储端的过滤能力：status = active、targets 包含 page_type、
/// 投放窗口覆盖 now，按 priority 降序，最多返回 limit 条。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CampaignQuery {
    pub page_type: PageType,
    pub now: DateTime<Utc>,
    pub limit: usize,
}

/// 广告活动存储适配器
#[async_trait]
pub trait CampaignStore: Send + Sync {
    async fn list_campaigns(&self, query: &CampaignQuery) -> Result<Vec<Campaign>, StoreError>;
}

/// 本地存储共用的查询逻辑：复用资格过滤后截断到 limit
fn apply_query(campaigns: &[Campaign], query: &CampaignQuery) -> Vec<Campaign> {
    filter_eligible(campaigns, query.page_type, query.now)
        .into_iter()
        .take(query.limit)
        .cloned()
        .collect()
}

/// 从 JSON 文件读取广告活动，每次查询都会重新读取文件
pub struct FileCampaignStore {
    pub path: PathBuf,
}

impl FileCampaignStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CampaignStore for FileCampaignStore {
    async fn list_campaigns(&self, query: &CampaignQuery) -> Result<Vec<Campaign>, StoreError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let campaigns: Vec<Campaign> = serde_json::from_str(&content)?;
        Ok(apply_query(&campaigns, query))
    }
}

/// 内存存储，测试和嵌入式场景使用
#[derive(Default)]
pub struct InMemoryCampaignStore {
    campaigns: Vec<Campaign>,
}

impl InMemoryCampaignStore {
    pub fn new(campaigns: Vec<Campaign>) -> Self {
        Self { campaigns }
    }
}

#[async_trait]
impl CampaignStore for InMemoryCampaignStore {
    async fn list_campaigns(&self, query: &CampaignQuery) -> Result<Vec<Campaign>, StoreError> {
        Ok(apply_query(&self.campaigns, query))
    }
}
