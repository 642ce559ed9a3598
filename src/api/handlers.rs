use axum::extract::rejection::JsonRejection;
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::model::context::PlacementContext;
use crate::model::placements::{PageType, SlotType};
use crate::placement::catalog::SlotCatalog;
use crate::placement::PlacementOutcome;

/// POST /placements 请求体
///
/// 字段先按字符串接收，便于对缺失和非法值给出明确的 400 错误。
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlacementRequestBody {
    pub page_type: Option<String>,
    pub slots: Option<Vec<String>>,
    pub now: Option<DateTime<Utc>>,
    pub max_per_page_override: Option<u32>,
}

impl PlacementRequestBody {
    /// 校验请求并构造编排上下文；pageType 和 slots 不允许默认
    pub fn into_context(self) -> Result<PlacementContext, ApiError> {
        let page_type = self
            .page_type
            .ok_or_else(|| ApiError::invalid("pageType is required"))?;
        let page_type = PageType::try_from(page_type.as_str()).map_err(ApiError::InvalidRequest)?;

        let raw_slots = self.slots.ok_or_else(|| ApiError::invalid("slots is required"))?;
        if raw_slots.is_empty() {
            return Err(ApiError::invalid("slots must not be empty"));
        }
        let slots = raw_slots
            .iter()
            .map(|slot| SlotType::try_from(slot.as_str()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(ApiError::InvalidRequest)?;

        let mut ctx = PlacementContext::new(page_type, &slots)
            .with_max_per_page(self.max_per_page_override.map(|max| max as usize));
        if let Some(now) = self.now {
            ctx = ctx.at(now);
        }
        Ok(ctx)
    }
}

/// **处理广告位编排请求**
pub async fn handle_placement_request(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PlacementRequestBody>, JsonRejection>,
) -> Result<Json<PlacementOutcome>, ApiError> {
    let ctx = payload
        .map_err(ApiError::from)
        .and_then(|Json(body)| body.into_context())
        .inspect_err(|e| warn!(error = %e, "placement request rejected"))?;

    Ok(Json(state.orchestrator.orchestrate(&ctx).await))
}

pub async fn handle_catalog() -> Json<SlotCatalog> {
    Json(SlotCatalog::snapshot())
}

pub async fn handle_health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
