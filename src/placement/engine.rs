// src/placement/engine.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{ConfigManager, ResolvedPageConfig};
use crate::logging::placement_log::PlacementLog;
use crate::logging::runtime_logger::{LogLevel, RuntimeLogger};
use crate::model::campaign::Campaign;
use crate::model::context::PlacementContext;
use crate::model::placements::{PageType, SlotType};
use crate::placement::allocator::allocate;
use crate::placement::cache::CampaignCache;
use crate::placement::eligibility::filter_eligible;
use crate::placement::result::{build_placements, AssetResolver, PlacementMap};

/// 一次编排的输出
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PlacementOutcome {
    pub request_id: String,
    pub page_type: PageType,
    pub placements: PlacementMap,
}

/// 纯计算入口：给定候选快照和解析好的配置，算出每个广告位的投放结果
pub fn place_slots(
    campaigns: &[Campaign],
    page_type: PageType,
    slots: &[SlotType],
    now: DateTime<Utc>,
    config: &ResolvedPageConfig,
    assets: &AssetResolver,
) -> PlacementMap {
    let candidates = filter_eligible(campaigns, page_type, now);
    let decisions = allocate(slots, &candidates, config);
    build_placements(&decisions, assets)
}

/// 广告位编排器
///
/// 每次调用取一次候选快照（经 CampaignCache），解析页面配置，
/// 过滤排序后贪心分配，最后组装结果并写一条聚合日志。
/// 调用之间除缓存外不共享可变状态。
pub struct PlacementOrchestrator {
    cache: CampaignCache,
    config: Arc<ConfigManager>,
    assets: AssetResolver,
    runtime_logger: Option<Arc<RuntimeLogger>>,
}

impl PlacementOrchestrator {
    pub fn new(cache: CampaignCache, config: Arc<ConfigManager>, assets: AssetResolver) -> Self {
        Self { cache, config, assets, runtime_logger: None }
    }

    pub fn with_runtime_logger(mut self, runtime_logger: Arc<RuntimeLogger>) -> Self {
        self.runtime_logger = Some(runtime_logger);
        self
    }

    /// 处理投放请求，永远返回完整的广告位映射
    pub async fn orchestrate(&self, ctx: &PlacementContext) -> PlacementOutcome {
        let mut log = PlacementLog::new(&ctx.request_id, ctx.page_type.as_str());

        // 调用方指定了时间点时不能复用按其他时间过滤的缓存快照
        let fetched = if ctx.now_pinned {
            self.cache.fetch_at(ctx.page_type, ctx.now).await
        } else {
            self.cache.snapshot(ctx.page_type, ctx.now).await
        };

        // 存储不可用时按零候选处理，所有广告位回退
        let snapshot = match fetched {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(
                    request_id = %ctx.request_id,
                    page_type = %ctx.page_type,
                    error = %e,
                    "campaign store unavailable, degrading to fallback placements"
                );
                log.mark_store_unavailable();
                Arc::new(Vec::new())
            }
        };

        let resolved = self
            .config
            .resolve(ctx.page_type)
            .with_max_per_page_override(ctx.max_per_page_override);

        let candidates = filter_eligible(&snapshot, ctx.page_type, ctx.now);
        let decisions = allocate(&ctx.slots, &candidates, &resolved);
        let placements = build_placements(&decisions, &self.assets);

        log.candidate_count = candidates.len();
        log.max_per_page = resolved.max_per_page;
        for decision in &decisions {
            log.add_decision(decision);
        }
        log.elapsed_us = ctx.start_time.elapsed().as_micros() as u64;

        info!(
            request_id = %ctx.request_id,
            page_type = %ctx.page_type,
            candidates = log.candidate_count,
            internal = log.internal_count,
            fallback = log.fallback_count,
            "placements resolved"
        );
        if let Some(runtime_logger) = &self.runtime_logger {
            runtime_logger.log(LogLevel::Info, &log.to_json()).await;
        }

        PlacementOutcome {
            request_id: ctx.request_id.clone(),
            page_type: ctx.page_type,
            placements,
        }
    }
}
