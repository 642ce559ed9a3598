// src/main.rs

use axum::serve;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use rust_ad_placement::api::{self, AppState};
use rust_ad_placement::config::ConfigManager;
use rust_ad_placement::logging::init_tracing;
use rust_ad_placement::logging::runtime_logger::{LogLevel, RuntimeLogger, RuntimeLoggerOptions};
use rust_ad_placement::model::adapters::{CampaignStore, FileCampaignStore};
use rust_ad_placement::placement::cache::CampaignCache;
use rust_ad_placement::placement::result::AssetResolver;
use rust_ad_placement::placement::store_client::HttpCampaignStore;
use rust_ad_placement::placement::PlacementOrchestrator;

#[derive(Parser, Debug)]
#[command(author = "whiteCcinn", version = "1.0", about = "Ad placement orchestrator server")]
struct CliArgs {
    #[arg(short, long, default_value_t = 8080)]
    port: u16,
    #[arg(long, default_value = "logs")]
    log_dir: String,
    /// 本地广告活动文件（未指定 --store-url 时使用）
    #[arg(long, default_value = "static/campaigns.json")]
    campaigns_file: String,
    /// 远程广告活动存储地址，指定后替代本地文件
    #[arg(long)]
    store_url: Option<String>,
    #[arg(long, default_value_t = 300)]
    store_timeout_ms: u64,
    #[arg(long, default_value = "static/ads_metadata.json")]
    metadata_file: String,
    /// 0 表示不缓存
    #[arg(long, default_value_t = 30)]
    cache_ttl_secs: u64,
    /// 每次从存储拉取的候选上限（按 priority 取前 N）
    #[arg(long, default_value_t = 50)]
    fetch_limit: usize,
    #[arg(long, default_value = "/media")]
    asset_base_url: String,
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    // 初始化全局 tracing 日志
    let _guard = init_tracing(&args.log_dir).expect("Unable to set global tracing subscriber");
    info!("ad placement server starting on port {}", args.port);

    // 初始化运行日志记录器（用于记录每次编排的聚合日志）
    let runtime_logger = RuntimeLogger::new(&args.log_dir, RuntimeLoggerOptions::default());
    runtime_logger.log(LogLevel::Info, "ad placement server is starting...").await;

    // 广告配置：文件缺失或格式错误时按“不限制”处理
    let config = Arc::new(ConfigManager::from_file(&args.metadata_file));

    let store: Arc<dyn CampaignStore> = match &args.store_url {
        Some(url) => {
            info!(store_url = %url, "using remote campaign store");
            Arc::new(HttpCampaignStore::new(url, args.store_timeout_ms))
        }
        None => {
            info!(campaigns_file = %args.campaigns_file, "using file campaign store");
            Arc::new(FileCampaignStore::new(&args.campaigns_file))
        }
    };
    let cache = CampaignCache::new(store, Duration::from_secs(args.cache_ttl_secs), args.fetch_limit);

    let orchestrator = PlacementOrchestrator::new(cache, config, AssetResolver::new(&args.asset_base_url))
        .with_runtime_logger(runtime_logger.clone());
    let app = api::router(AppState::new(orchestrator));

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %addr, error = %e, "failed to bind listener");
            runtime_logger.log(LogLevel::Error, &format!("failed to bind {}: {}", addr, e)).await;
            runtime_logger.shutdown().await;
            std::process::exit(1);
        }
    };
    runtime_logger.log(LogLevel::Info, &format!("ad placement server running at http://{}", addr)).await;

    let shutdown_logger = runtime_logger.clone();
    let result = serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = signal::ctrl_c().await;
            shutdown_logger.log(LogLevel::Info, "Shutting down gracefully...").await;
        })
        .await;
    if let Err(e) = result {
        error!(error = %e, "server error");
    }

    runtime_logger.log(LogLevel::Info, "ad placement server shut down.").await;
    runtime_logger.shutdown().await;
}
