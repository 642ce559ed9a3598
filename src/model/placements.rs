// src/model/placements.rs

use serde::{Serialize, Deserialize};
use std::convert::TryFrom;
use std::fmt;

/// 创意尺寸类别
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    Leaderboard, // 728x90 横幅
    Rectangle,   // 300x250 矩形
    Skyscraper,  // 160x600 摩天楼
}

impl SizeClass {
    pub const ALL: [SizeClass; 3] = [SizeClass::Leaderboard, SizeClass::Rectangle, SizeClass::Skyscraper];

    pub fn as_str(&self) -> &'static str {
        match self {
            SizeClass::Leaderboard => "leaderboard",
            SizeClass::Rectangle => "rectangle",
            SizeClass::Skyscraper => "skyscraper",
        }
    }
}

impl TryFrom<&str> for SizeClass {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "leaderboard" => Ok(SizeClass::Leaderboard),
            "rectangle" => Ok(SizeClass::Rectangle),
            "skyscraper" => Ok(SizeClass::Skyscraper),
            _ => Err(format!("Invalid value for SizeClass: {}", value)),
        }
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 页面上的广告位位置
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum SlotType {
    Header,
    Inline,
    SidebarTop,
    SidebarMid,
    SidebarBottom,
    Footer,
}

impl SlotType {
    pub const ALL: [SlotType; 6] = [
        SlotType::Header,
        SlotType::Inline,
        SlotType::SidebarTop,
        SlotType::SidebarMid,
        SlotType::SidebarBottom,
        SlotType::Footer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SlotType::Header => "header",
            SlotType::Inline => "inline",
            SlotType::SidebarTop => "sidebar-top",
            SlotType::SidebarMid => "sidebar-mid",
            SlotType::SidebarBottom => "sidebar-bottom",
            SlotType::Footer => "footer",
        }
    }
}

impl TryFrom<&str> for SlotType {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        SlotType::ALL
            .into_iter()
            .find(|slot| slot.as_str() == value)
            .ok_or_else(|| format!("Invalid value for SlotType: {}", value))
    }
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 页面类型（用于定向）
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum PageType {
    Home,
    Posts,
    Challenges,
    Tags,
}

impl PageType {
    pub const ALL: [PageType; 4] = [PageType::Home, PageType::Posts, PageType::Challenges, PageType::Tags];

    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::Home => "home",
            PageType::Posts => "posts",
            PageType::Challenges => "challenges",
            PageType::Tags => "tags",
        }
    }
}

impl TryFrom<&str> for PageType {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        PageType::ALL
            .into_iter()
            .find(|page| page.as_str() == value)
            .ok_or_else(|| format!("Invalid value for PageType: {}", value))
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个广告位的最终投放结果（每次请求即时计算，不落库）
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Placement {
    /// 内部广告活动占用该广告位
    #[serde(rename_all = "camelCase")]
    Internal {
        campaign_id: String,
        slot: SlotType,
        size_class: SizeClass,
        creative_url: String,
        click_url: String,
        title: String,
    },
    /// 无内部广告可投，交给外部广告联盟渲染
    Fallback { slot: SlotType },
}

impl Placement {
    pub fn slot(&self) -> SlotType {
        match self {
            Placement::Internal { slot, .. } | Placement::Fallback { slot } => *slot,
        }
    }

    pub fn campaign_id(&self) -> Option<&str> {
        match self {
            Placement::Internal { campaign_id, .. } => Some(campaign_id),
            Placement::Fallback { .. } => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Placement::Fallback { .. })
    }
}
