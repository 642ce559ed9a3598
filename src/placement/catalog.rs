// src/placement/catalog.rs

use serde::Serialize;
use std::collections::BTreeMap;

use crate::model::placements::{PageType, SizeClass, SlotType};

impl SlotType {
    /// 广告位可接受的创意尺寸回退链，按顺序取第一个可用尺寸
    pub fn fallback_chain(&self) -> &'static [SizeClass] {
        match self {
            SlotType::Header => &[SizeClass::Leaderboard],
            SlotType::Inline => &[SizeClass::Rectangle],
            SlotType::SidebarTop | SlotType::SidebarMid | SlotType::SidebarBottom => {
                &[SizeClass::Skyscraper, SizeClass::Rectangle]
            }
            SlotType::Footer => &[SizeClass::Leaderboard, SizeClass::Rectangle],
        }
    }
}

impl PageType {
    /// 页面类型默认请求的广告位列表
    pub fn default_slots(&self) -> &'static [SlotType] {
        match self {
            PageType::Home => &[SlotType::Header, SlotType::Inline, SlotType::Footer],
            PageType::Posts => &[
                SlotType::Header,
                SlotType::Inline,
                SlotType::SidebarTop,
                SlotType::SidebarMid,
                SlotType::SidebarBottom,
                SlotType::Footer,
            ],
            PageType::Challenges => &[
                SlotType::Header,
                SlotType::SidebarTop,
                SlotType::SidebarBottom,
                SlotType::Footer,
            ],
            PageType::Tags => &[SlotType::Header, SlotType::Inline, SlotType::Footer],
        }
    }
}

/// 对外暴露的广告位目录（GET /catalog）
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SlotCatalog {
    pub pages: BTreeMap<PageType, Vec<SlotType>>,
    pub slots: BTreeMap<SlotType, Vec<SizeClass>>,
}

impl SlotCatalog {
    pub fn snapshot() -> Self {
        Self {
            pages: PageType::ALL
                .into_iter()
                .map(|page| (page, page.default_slots().to_vec()))
                .collect(),
            slots: SlotType::ALL
                .into_iter()
                .map(|slot| (slot, slot.fallback_chain().to_vec()))
                .collect(),
        }
    }
}
