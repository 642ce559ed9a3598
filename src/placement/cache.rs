// src/placement/cache.rs

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::model::adapters::{CampaignQuery, CampaignStore, StoreError};
use crate::model::campaign::Campaign;
use crate::model::placements::PageType;

/// 每次编排拿到的候选广告活动快照
pub type CampaignSnapshot = Arc<Vec<Campaign>>;

struct CachedSnapshot {
    fetched_at: Instant,
    campaigns: CampaignSnapshot,
}

/// 按页面类型缓存存储查询结果
///
/// 作为显式对象注入编排器，测试时可以换成任意 CampaignStore。
/// 快照过期后重新查询；查询失败时若有旧快照则继续使用旧快照。
/// 存储按查询时间过滤投放窗口，所以快照只对“当前时间”的请求有效，
/// 调用方指定时间点的请求应走 `fetch_at`。
pub struct CampaignCache {
    store: Arc<dyn CampaignStore>,
    ttl: Duration,
    fetch_limit: usize,
    snapshots: RwLock<HashMap<PageType, CachedSnapshot>>,
}

impl CampaignCache {
    pub fn new(store: Arc<dyn CampaignStore>, ttl: Duration, fetch_limit: usize) -> Self {
        Self {
            store,
            ttl,
            fetch_limit,
            snapshots: RwLock::new(HashMap::new()),
        }
    }

    /// 不缓存，每次都直接查询存储
    pub fn uncached(store: Arc<dyn CampaignStore>, fetch_limit: usize) -> Self {
        Self::new(store, Duration::ZERO, fetch_limit)
    }

    pub async fn snapshot(&self, page_type: PageType, now: DateTime<Utc>) -> Result<CampaignSnapshot, StoreError> {
        if !self.ttl.is_zero() {
            let snapshots = self.snapshots.read().await;
            if let Some(cached) = snapshots.get(&page_type) {
                if cached.fetched_at.elapsed() < self.ttl {
                    return Ok(cached.campaigns.clone());
                }
            }
        }

        match self.store.list_campaigns(&self.query(page_type, now)).await {
            Ok(campaigns) => {
                debug!(page_type = %page_type, count = campaigns.len(), "campaign snapshot refreshed");
                let campaigns = Arc::new(campaigns);
                if !self.ttl.is_zero() {
                    self.snapshots.write().await.insert(
                        page_type,
                        CachedSnapshot { fetched_at: Instant::now(), campaigns: campaigns.clone() },
                    );
                }
                Ok(campaigns)
            }
            Err(e) => {
                let snapshots = self.snapshots.read().await;
                match snapshots.get(&page_type) {
                    Some(stale) => {
                        warn!(page_type = %page_type, error = %e, "campaign store failed, serving stale snapshot");
                        Ok(stale.campaigns.clone())
                    }
                    None => Err(e),
                }
            }
        }
    }

    /// 按指定时间点直接查询存储，不读也不写缓存
    ///
    /// 失败时不回退到旧快照：旧快照是按别的时间点过滤的。
    pub async fn fetch_at(&self, page_type: PageType, now: DateTime<Utc>) -> Result<CampaignSnapshot, StoreError> {
        let campaigns = self.store.list_campaigns(&self.query(page_type, now)).await?;
        Ok(Arc::new(campaigns))
    }

    fn query(&self, page_type: PageType, now: DateTime<Utc>) -> CampaignQuery {
        CampaignQuery { page_type, now, limit: self.fetch_limit }
    }

    pub async fn invalidate(&self) {
        self.snapshots.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::adapters::InMemoryCampaignStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// 可以切换失败状态、并统计调用次数的存储
    struct FlakyStore {
        inner: InMemoryCampaignStore,
        failing: AtomicBool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CampaignStore for FlakyStore {
        async fn list_campaigns(&self, query: &CampaignQuery) -> Result<Vec<Campaign>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(StoreError::Http("connection refused".to_string()));
            }
            self.inner.list_campaigns(query).await
        }
    }

    fn flaky(failing: bool) -> Arc<FlakyStore> {
        Arc::new(FlakyStore {
            inner: InMemoryCampaignStore::new(vec![Campaign::new("a", 1).with_targets(&[PageType::Posts])]),
            failing: AtomicBool::new(failing),
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn reuses_snapshot_within_ttl() {
        let store = flaky(false);
        let cache = CampaignCache::new(store.clone(), Duration::from_secs(60), 10);
        let first = cache.snapshot(PageType::Posts, Utc::now()).await.unwrap();
        let second = cache.snapshot(PageType::Posts, Utc::now()).await.unwrap();
        assert_eq!(first.len(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);

        // 不同页面类型分开缓存
        let home = cache.snapshot(PageType::Home, Utc::now()).await.unwrap();
        assert!(home.is_empty());
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn uncached_always_hits_store() {
        let store = flaky(false);
        let cache = CampaignCache::uncached(store.clone(), 10);
        cache.snapshot(PageType::Posts, Utc::now()).await.unwrap();
        cache.snapshot(PageType::Posts, Utc::now()).await.unwrap();
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn serves_stale_snapshot_when_store_fails() {
        let store = flaky(false);
        let cache = CampaignCache::new(store.clone(), Duration::from_millis(5), 10);
        cache.snapshot(PageType::Posts, Utc::now()).await.unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        store.failing.store(true, Ordering::SeqCst);

        let stale = cache.snapshot(PageType::Posts, Utc::now()).await.unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn propagates_error_without_snapshot() {
        let cache = CampaignCache::new(flaky(true), Duration::from_secs(60), 10);
        let err = cache.snapshot(PageType::Posts, Utc::now()).await.unwrap_err();
        assert!(matches!(err, StoreError::Http(_)));
    }

    #[tokio::test]
    async fn fetch_at_bypasses_cached_snapshot() {
        let now = Utc::now();
        let store = Arc::new(InMemoryCampaignStore::new(vec![
            Campaign::new("live", 1).with_targets(&[PageType::Posts]),
            Campaign::new("later", 9)
                .with_targets(&[PageType::Posts])
                .with_window(Some(now + chrono::Duration::days(1)), None),
        ]));
        let cache = CampaignCache::new(store, Duration::from_secs(60), 10);

        let warm = cache.snapshot(PageType::Posts, now).await.unwrap();
        assert_eq!(warm.len(), 1);

        let later = cache.fetch_at(PageType::Posts, now + chrono::Duration::days(2)).await.unwrap();
        let ids: Vec<&str> = later.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["later", "live"]);

        // 缓存中的快照不受影响
        let again = cache.snapshot(PageType::Posts, now).await.unwrap();
        assert!(Arc::ptr_eq(&warm, &again));
    }

    #[tokio::test]
    async fn fetch_at_does_not_serve_stale_snapshot() {
        let store = flaky(false);
        let cache = CampaignCache::new(store.clone(), Duration::from_secs(60), 10);
        cache.snapshot(PageType::Posts, Utc::now()).await.unwrap();
        store.failing.store(true, Ordering::SeqCst);
        let err = cache.fetch_at(PageType::Posts, Utc::now()).await.unwrap_err();
        assert!(matches!(err, StoreError::Http(_)));
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let store = flaky(false);
        let cache = CampaignCache::new(store.clone(), Duration::from_secs(60), 10);
        cache.snapshot(PageType::Posts, Utc::now()).await.unwrap();
        cache.invalidate().await;
        cache.snapshot(PageType::Posts, Utc::now()).await.unwrap();
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }
}
