// src/logging/placement_log.rs

use serde::{Serialize, Deserialize};
use chrono::Utc;

use crate::placement::allocator::SlotDecision;

/// **投放编排日志**，每次编排调用聚合成一条
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PlacementLog {
    pub timestamp: String,          // 记录时间
    pub log_type: String,           // 日志类型，固定为 "ad_placement"
    pub request_id: String,
    pub page_type: String,
    pub store_status: String,       // "ok" 或 "unavailable"
    pub candidate_count: usize,     // 资格过滤后的候选数
    pub max_per_page: Option<usize>,
    pub internal_count: usize,
    pub fallback_count: usize,
    pub elapsed_us: u64,
    pub slots: Vec<SlotLog>,
}

/// **单个广告位日志**
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SlotLog {
    pub slot: String,
    pub outcome: String,            // "internal" 或 "fallback"
    pub campaign_id: Option<String>,
    pub size_class: Option<String>,
    pub reason: Option<String>,     // 回退原因
}

impl PlacementLog {
    pub fn new(request_id: &str, page_type: &str) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            log_type: "ad_placement".to_string(),
            request_id: request_id.to_string(),
            page_type: page_type.to_string(),
            store_status: "ok".to_string(),
            candidate_count: 0,
            max_per_page: None,
            internal_count: 0,
            fallback_count: 0,
            elapsed_us: 0,
            slots: Vec::new(),
        }
    }

    pub fn mark_store_unavailable(&mut self) {
        self.store_status = "unavailable".to_string();
    }

    /// **记录广告位分配结果**
    pub fn add_decision(&mut self, decision: &SlotDecision<'_>) {
        let entry = match decision {
            SlotDecision::Assigned { slot, campaign, size_class, .. } => {
                self.internal_count += 1;
                SlotLog {
                    slot: slot.to_string(),
                    outcome: "internal".to_string(),
                    campaign_id: Some(campaign.id.clone()),
                    size_class: Some(size_class.to_string()),
                    reason: None,
                }
            }
            SlotDecision::Fallback { slot, reason } => {
                self.fallback_count += 1;
                SlotLog {
                    slot: slot.to_string(),
                    outcome: "fallback".to_string(),
                    campaign_id: None,
                    size_class: None,
                    reason: Some(reason.as_str().to_string()),
                }
            }
        };
        self.slots.push(entry);
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
