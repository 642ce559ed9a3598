// src/model/context.rs

use crate::model::placements::{PageType, SlotType};
use chrono::{DateTime, Utc};
use std::time::Instant;

/// 一次投放编排调用的上下文（已通过校验）
#[derive(Debug, Clone)]
pub struct PlacementContext {
    /// 请求 ID，贯穿整条调用链日志
    pub request_id: String,
    pub page_type: PageType,
    /// 调用方给定顺序的广告位列表（已去重，保留首次出现的位置）
    pub slots: Vec<SlotType>,
    /// 用于判断投放窗口的时间点
    pub now: DateTime<Utc>,
    /// now 由调用方指定（而不是取当前时间），此时候选不能复用缓存快照
    pub now_pinned: bool,
    /// 调用方指定的每页上限，覆盖配置解析出的 maxPerPage
    pub max_per_page_override: Option<usize>,
    /// 请求开始时间，用于计算总耗时
    pub start_time: Instant,
}

impl PlacementContext {
    pub fn new(page_type: PageType, slots: &[SlotType]) -> Self {
        let mut deduped = Vec::with_capacity(slots.len());
        for slot in slots {
            if !deduped.contains(slot) {
                deduped.push(*slot);
            }
        }
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            page_type,
            slots: deduped,
            now: Utc::now(),
            now_pinned: false,
            max_per_page_override: None,
            start_time: Instant::now(),
        }
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self.now_pinned = true;
        self
    }

    pub fn with_max_per_page(mut self, max_per_page: Option<usize>) -> Self {
        self.max_per_page_override = max_per_page;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_slots_keep_first_position() {
        let ctx = PlacementContext::new(
            PageType::Posts,
            &[SlotType::Footer, SlotType::Header, SlotType::Footer],
        );
        assert_eq!(ctx.slots, vec![SlotType::Footer, SlotType::Header]);
        assert!(!ctx.request_id.is_empty());
        assert!(!ctx.now_pinned);
    }

    #[test]
    fn explicit_time_is_pinned() {
        let at = Utc::now() + chrono::Duration::days(2);
        let ctx = PlacementContext::new(PageType::Home, &[SlotType::Header]).at(at);
        assert_eq!(ctx.now, at);
        assert!(ctx.now_pinned);
    }
}
