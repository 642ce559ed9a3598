pub mod placement_log;
pub mod runtime_logger;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// tracing 日志文件名（按小时滚动，实际文件带时间后缀）
pub const TRACING_LOG_FILE: &str = "placement_log.json";

/// 初始化全局 tracing 日志：JSON 格式，按小时滚动写入 log_dir/placement_log.json
///
/// 返回的 guard 必须持有到进程退出，否则缓冲中的日志会丢失。
pub fn init_tracing(log_dir: &str) -> Result<WorkerGuard, tracing::subscriber::SetGlobalDefaultError> {
    let log_file = rolling::hourly(log_dir, TRACING_LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);
    let subscriber = Registry::default()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json().with_writer(non_blocking));
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(guard)
}
