// src/placement/allocator.rs

use std::collections::HashSet;

use crate::config::ResolvedPageConfig;
use crate::model::campaign::Campaign;
use crate::model::placements::{SizeClass, SlotType};

/// 广告位回退的原因，只用于日志
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// 配置了 enabledSlots 且不包含该广告位
    SlotDisabled,
    /// 已使用的广告活动数达到 maxPerPage
    CapReached,
    /// 没有未使用且具备匹配尺寸创意的候选
    NoCandidate,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::SlotDisabled => "slot_disabled",
            FallbackReason::CapReached => "cap_reached",
            FallbackReason::NoCandidate => "no_candidate",
        }
    }
}

/// 单个广告位的分配结果
#[derive(Debug, Clone, PartialEq)]
pub enum SlotDecision<'a> {
    Assigned {
        slot: SlotType,
        campaign: &'a Campaign,
        size_class: SizeClass,
        creative_ref: &'a str,
    },
    Fallback {
        slot: SlotType,
        reason: FallbackReason,
    },
}

impl SlotDecision<'_> {
    pub fn slot(&self) -> SlotType {
        match self {
            SlotDecision::Assigned { slot, .. } | SlotDecision::Fallback { slot, .. } => *slot,
        }
    }
}

/// 贪心分配：按调用方给定的广告位顺序，为每个广告位挑选优先级最高、
/// 本次尚未使用、且在回退链上有可用创意的广告活动。
///
/// `candidates` 必须已经过资格过滤并按优先级排序。
/// 一个广告活动在同一页面只占用一个广告位；没有匹配创意的广告活动
/// 不会被标记为已使用，仍可竞争后续广告位。
pub fn allocate<'a>(
    slots: &[SlotType],
    candidates: &[&'a Campaign],
    config: &ResolvedPageConfig,
) -> Vec<SlotDecision<'a>> {
    let mut used: HashSet<&str> = HashSet::new();
    let mut decisions = Vec::with_capacity(slots.len());

    for &slot in slots {
        if !config.is_slot_enabled(slot) {
            decisions.push(SlotDecision::Fallback { slot, reason: FallbackReason::SlotDisabled });
            continue;
        }

        // 达到上限后不能再引入新的广告活动，而已使用的广告活动本来就会被跳过
        if config.max_per_page.map_or(false, |cap| used.len() >= cap) {
            decisions.push(SlotDecision::Fallback { slot, reason: FallbackReason::CapReached });
            continue;
        }

        let chain = slot.fallback_chain();
        let picked = candidates
            .iter()
            .filter(|campaign| !used.contains(campaign.id.as_str()))
            .find_map(|&campaign| {
                campaign
                    .creative_for(chain)
                    .map(|(size_class, creative_ref)| (campaign, size_class, creative_ref))
            });

        match picked {
            Some((campaign, size_class, creative_ref)) => {
                used.insert(campaign.id.as_str());
                decisions.push(SlotDecision::Assigned { slot, campaign, size_class, creative_ref });
            }
            None => {
                decisions.push(SlotDecision::Fallback { slot, reason: FallbackReason::NoCandidate });
            }
        }
    }

    decisions
}
