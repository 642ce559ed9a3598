// src/placement/store_client.rs

use async_trait::async_trait;
use reqwest::Client;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::debug;

use crate::model::adapters::{CampaignQuery, CampaignStore, StoreError};
use crate::model::campaign::Campaign;

/// 通过 HTTP 查询远程广告活动存储
///
/// 请求形如 `GET {base_url}/campaigns?status=active&target=posts&at=...&sort=-priority&limit=50`，
/// 响应体为 Campaign 数组。远端负责过滤，这里只负责超时和解码。
pub struct HttpCampaignStore {
    client: Client,
    base_url: String,
    timeout_ms: u64,
}

impl HttpCampaignStore {
    pub fn new(base_url: &str, timeout_ms: u64) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_ms,
        }
    }

    fn query_params(query: &CampaignQuery) -> Vec<(&'static str, String)> {
        vec![
            ("status", "active".to_string()),
            ("target", query.page_type.to_string()),
            ("at", query.now.to_rfc3339()),
            ("sort", "-priority".to_string()),
            ("limit", query.limit.to_string()),
        ]
    }
}

#[async_trait]
impl CampaignStore for HttpCampaignStore {
    async fn list_campaigns(&self, query: &CampaignQuery) -> Result<Vec<Campaign>, StoreError> {
        let url = format!("{}/campaigns", self.base_url);
        let start = Instant::now();
        let response = timeout(
            Duration::from_millis(self.timeout_ms),
            self.client.get(&url).query(&Self::query_params(query)).send(),
        )
        .await
        .map_err(|_| StoreError::Timeout(self.timeout_ms))?
        .and_then(|resp| resp.error_for_status())
        .map_err(|e| StoreError::Http(e.to_string()))?;

        let body = response.bytes().await.map_err(|e| StoreError::Http(e.to_string()))?;
        let campaigns: Vec<Campaign> = serde_json::from_slice(&body)?;
        debug!(
            url = %url,
            count = campaigns.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "campaign store responded"
        );
        Ok(campaigns)
    }
}
