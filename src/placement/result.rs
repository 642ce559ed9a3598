// src/placement/result.rs

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::model::placements::{Placement, SlotType};
use crate::placement::allocator::SlotDecision;

/// 把创意引用解析为可访问的素材 URL
#[derive(Debug, Clone)]
pub struct AssetResolver {
    base_url: String,
}

impl AssetResolver {
    pub fn new(base_url: &str) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_string() }
    }

    pub fn resolve(&self, reference: &str) -> String {
        if reference.starts_with("http://") || reference.starts_with("https://") || reference.starts_with("//") {
            return reference.to_string();
        }
        format!("{}/{}", self.base_url, reference.trim_start_matches('/'))
    }
}

impl Default for AssetResolver {
    fn default() -> Self {
        Self::new("/media")
    }
}

/// 广告位 -> 投放结果，序列化为 JSON 对象时保持调用方给定的广告位顺序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacementMap {
    entries: Vec<Placement>,
}

impl PlacementMap {
    pub fn get(&self, slot: SlotType) -> Option<&Placement> {
        self.entries.iter().find(|placement| placement.slot() == slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Placement> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn internal_count(&self) -> usize {
        self.entries.iter().filter(|placement| !placement.is_fallback()).count()
    }
}

impl Serialize for PlacementMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for placement in &self.entries {
            map.serialize_entry(&placement.slot(), placement)?;
        }
        map.end()
    }
}

pub fn build_placements(decisions: &[SlotDecision<'_>], assets: &AssetResolver) -> PlacementMap {
    let entries = decisions
        .iter()
        .map(|decision| match decision {
            SlotDecision::Assigned { slot, campaign, size_class, creative_ref } => Placement::Internal {
                campaign_id: campaign.id.clone(),
                slot: *slot,
                size_class: *size_class,
                creative_url: assets.resolve(creative_ref),
                click_url: campaign.click_url.clone(),
                title: campaign.title.clone(),
            },
            SlotDecision::Fallback { slot, .. } => Placement::Fallback { slot: *slot },
        })
        .collect();
    PlacementMap { entries }
}
