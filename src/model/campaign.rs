// src/model/campaign.rs

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;

use crate::model::placements::{PageType, SizeClass};

/// 广告活动状态，只有 Active 可以参与投放
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    #[default]
    Draft,
    Active,
    Paused,
    Archived,
}

/// 广告活动（由外部存储维护，编排器只读）
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: String,
    #[serde(default)]
    pub status: CampaignStatus,
    #[serde(default)]
    pub targets: Vec<PageType>,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub start_at: Option<DateTime<Utc>>, // None 表示没有开始时间限制
    #[serde(default)]
    pub end_at: Option<DateTime<Utc>>,   // None 表示没有结束时间限制
    /// 尺寸 -> 创意引用（未上传的尺寸不出现）
    #[serde(default)]
    pub creatives: BTreeMap<SizeClass, String>,
    #[serde(default)]
    pub click_url: String,
    #[serde(default)]
    pub title: String,
}

impl Campaign {
    pub fn new(id: &str, priority: i64) -> Self {
        Self {
            id: id.to_string(),
            status: CampaignStatus::Active,
            targets: Vec::new(),
            priority,
            start_at: None,
            end_at: None,
            creatives: BTreeMap::new(),
            click_url: String::new(),
            title: String::new(),
        }
    }

    pub fn with_status(mut self, status: CampaignStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_targets(mut self, targets: &[PageType]) -> Self {
        self.targets = targets.to_vec();
        self
    }

    pub fn with_window(mut self, start_at: Option<DateTime<Utc>>, end_at: Option<DateTime<Utc>>) -> Self {
        self.start_at = start_at;
        self.end_at = end_at;
        self
    }

    pub fn with_creative(mut self, size: SizeClass, reference: &str) -> Self {
        self.creatives.insert(size, reference.to_string());
        self
    }

    pub fn with_display(mut self, title: &str, click_url: &str) -> Self {
        self.title = title.to_string();
        self.click_url = click_url.to_string();
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == CampaignStatus::Active
    }

    pub fn targets_page(&self, page_type: PageType) -> bool {
        self.targets.contains(&page_type)
    }

    /// 投放窗口为左闭右开区间 [start_at, end_at)
    pub fn is_in_window(&self, now: DateTime<Utc>) -> bool {
        self.start_at.map_or(true, |start| start <= now) && self.end_at.map_or(true, |end| end > now)
    }

    /// 按回退链顺序返回第一个已上传的尺寸及其创意引用
    pub fn creative_for(&self, chain: &[SizeClass]) -> Option<(SizeClass, &str)> {
        chain
            .iter()
            .find_map(|size| self.creatives.get(size).map(|reference| (*size, reference.as_str())))
    }
}
