// src/logging/runtime_logger.rs

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::oneshot;
use tokio::task;
use tokio::time::{self, Duration};
use tracing::{info, warn};
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::fmt::MakeWriter;

use crate::logging::TRACING_LOG_FILE;

/// 运行日志级别，每个级别写入独立文件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub const ALL: [LogLevel; 5] = [LogLevel::Trace, LogLevel::Debug, LogLevel::Info, LogLevel::Warn, LogLevel::Error];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

enum LogCommand {
    Entry { level: LogLevel, content: String },
    /// 把所有缓冲写盘后回复
    Flush(oneshot::Sender<()>),
}

/// 运行日志管理器选项
#[derive(Debug, Clone)]
pub struct RuntimeLoggerOptions {
    pub file_prefix: String,
    /// mpsc 通道缓冲区大小
    pub buffer_size: usize,
    /// 每个级别累计多少条后批量写入
    pub batch_size: usize,
    /// 定时刷新间隔
    pub flush_interval: Duration,
    /// 日志文件保留时长，超过后由后台任务删除
    pub retention: Duration,
    /// 同一目录下其他需要按 retention 清理的文件前缀（默认包含 tracing 日志）
    pub extra_cleanup_prefixes: Vec<String>,
}

impl Default for RuntimeLoggerOptions {
    fn default() -> Self {
        Self {
            file_prefix: "runtime".to_string(),
            buffer_size: 1000,
            batch_size: 100,
            flush_interval: Duration::from_millis(1000),
            retention: Duration::from_secs(72 * 3600),
            extra_cleanup_prefixes: vec![TRACING_LOG_FILE.to_string()],
        }
    }
}

/// 运行日志管理器（RuntimeLogger）
/// 将运行时日志按日志级别分流到不同的日志文件（runtime_info.json 等）中，
/// 后台任务批量写盘，并定期清理过期文件。
pub struct RuntimeLogger {
    sender: Sender<LogCommand>,
}

impl RuntimeLogger {
    /// 必须在 tokio 运行时内调用
    pub fn new(log_dir: impl AsRef<Path>, options: RuntimeLoggerOptions) -> Arc<Self> {
        let log_dir = log_dir.as_ref().to_path_buf();
        let (sender, receiver) = mpsc::channel(options.buffer_size.max(1));

        let mut log_files = HashMap::new();
        for level in LogLevel::ALL {
            let file_name = format!("{}_{}.json", options.file_prefix, level.as_str().to_lowercase());
            log_files.insert(level, Arc::new(rolling::hourly(&log_dir, file_name)));
        }

        tokio::spawn(Self::background_log_writer(
            log_files,
            receiver,
            options.batch_size.max(1),
            options.flush_interval,
        ));

        let mut prefixes = vec![options.file_prefix.clone()];
        prefixes.extend(options.extra_cleanup_prefixes.iter().cloned());
        let retention = options.retention;
        tokio::spawn(async move {
            // 每小时扫描一次
            let mut interval = time::interval(Duration::from_secs(3600));
            loop {
                interval.tick().await;
                Self::cleanup_old_logs(&log_dir, &prefixes, retention).await;
            }
        });

        Arc::new(Self { sender })
    }

    /// 记录运行日志；message 是 JSON 对象时原样嵌入，否则按字符串记录
    pub async fn log(&self, level: LogLevel, message: &str) {
        let body = match serde_json::from_str::<Value>(message) {
            Ok(value @ Value::Object(_)) => value,
            _ => Value::String(message.to_string()),
        };
        let content = json!({
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            "level": level.as_str(),
            "message": body,
        })
        .to_string();

        if let Err(e) = self.sender.send(LogCommand::Entry { level, content }).await {
            eprintln!("Failed to send runtime log message: {}", e);
        }
    }

    /// 等待所有已提交的日志写盘
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.sender.send(LogCommand::Flush(ack)).await.is_ok() {
            let _ = done.await;
        }
    }

    pub async fn shutdown(&self) {
        self.flush().await;
    }

    async fn background_log_writer(
        log_files: HashMap<LogLevel, Arc<RollingFileAppender>>,
        mut receiver: Receiver<LogCommand>,
        batch_size: usize,
        flush_interval: Duration,
    ) {
        let mut buffers: HashMap<LogLevel, Vec<String>> = HashMap::new();
        let mut interval = time::interval(flush_interval);
        loop {
            tokio::select! {
                command = receiver.recv() => match command {
                    Some(LogCommand::Entry { level, content }) => {
                        let buffer = buffers.entry(level).or_default();
                        buffer.push(content);
                        if buffer.len() >= batch_size {
                            if let Some(appender) = log_files.get(&level) {
                                Self::write_logs_to_disk(appender.clone(), std::mem::take(buffer)).await;
                            }
                        }
                    }
                    Some(LogCommand::Flush(ack)) => {
                        Self::flush_all(&log_files, &mut buffers).await;
                        let _ = ack.send(());
                    }
                    None => {
                        // 所有 sender 都已释放
                        Self::flush_all(&log_files, &mut buffers).await;
                        break;
                    }
                },
                _ = interval.tick() => {
                    Self::flush_all(&log_files, &mut buffers).await;
                }
            }
        }
    }

    async fn flush_all(
        log_files: &HashMap<LogLevel, Arc<RollingFileAppender>>,
        buffers: &mut HashMap<LogLevel, Vec<String>>,
    ) {
        for (level, buffer) in buffers.iter_mut() {
            if buffer.is_empty() {
                continue;
            }
            if let Some(appender) = log_files.get(level) {
                Self::write_logs_to_disk(appender.clone(), std::mem::take(buffer)).await;
            }
        }
    }

    async fn write_logs_to_disk(file: Arc<RollingFileAppender>, lines: Vec<String>) {
        let content = lines.join("\n") + "\n";
        let result = task::spawn_blocking(move || {
            let mut writer = file.make_writer();
            writer.write_all(content.as_bytes()).and_then(|_| writer.flush())
        })
        .await;
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => eprintln!("Failed to write runtime logs: {}", e),
            Err(e) => eprintln!("Runtime log writer task failed: {}", e),
        }
    }

    /// 删除 log_dir 下以任一 prefix 开头、最后修改时间早于 retention 的文件
    async fn cleanup_old_logs(log_dir: &Path, prefixes: &[String], retention: Duration) {
        let now = SystemTime::now();
        let mut dir = match tokio::fs::read_dir(log_dir).await {
            Ok(dir) => dir,
            Err(e) => {
                warn!(dir = %log_dir.display(), error = %e, "failed to read log directory");
                return;
            }
        };
        while let Ok(Some(entry)) = dir.next_entry().await {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !prefixes.iter().any(|prefix| name.starts_with(prefix.as_str())) {
                continue;
            }
            let path = entry.path();
            let Ok(modified) = entry.metadata().await.and_then(|m| m.modified()) else {
                continue;
            };
            if now.duration_since(modified).unwrap_or_default() >= retention {
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => info!(path = %path.display(), "deleted old log file"),
                    Err(e) => warn!(path = %path.display(), error = %e, "failed to delete old log file"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_dir_contents(dir: &Path, prefix: &str) -> String {
        let mut out = String::new();
        for entry in std::fs::read_dir(dir).unwrap() {
            let entry = entry.unwrap();
            if entry.file_name().to_string_lossy().starts_with(prefix) {
                out.push_str(&std::fs::read_to_string(entry.path()).unwrap());
            }
        }
        out
    }

    #[tokio::test]
    async fn writes_entries_per_level_on_flush() {
        let dir = tempfile::tempdir().unwrap();
        let logger = RuntimeLogger::new(dir.path(), RuntimeLoggerOptions::default());
        logger.log(LogLevel::Info, r#"{"request_id":"r1"}"#).await;
        logger.log(LogLevel::Warn, "store unavailable").await;
        logger.flush().await;

        let info = read_dir_contents(dir.path(), "runtime_info");
        let line: Value = serde_json::from_str(info.trim()).unwrap();
        assert_eq!(line["level"], "INFO");
        assert_eq!(line["message"]["request_id"], "r1");

        let warn = read_dir_contents(dir.path(), "runtime_warn");
        assert!(warn.contains("store unavailable"));
        assert!(read_dir_contents(dir.path(), "runtime_error").is_empty());
    }

    #[tokio::test]
    async fn cleanup_only_touches_prefixed_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("runtime_info.json.old"), "x").unwrap();
        std::fs::write(dir.path().join("placement_log.json.2026-01-01-00"), "x").unwrap();
        std::fs::write(dir.path().join("keep.txt"), "x").unwrap();

        let options = RuntimeLoggerOptions::default();
        let mut prefixes = vec![options.file_prefix];
        prefixes.extend(options.extra_cleanup_prefixes);
        RuntimeLogger::cleanup_old_logs(dir.path(), &prefixes, Duration::ZERO).await;

        assert!(!dir.path().join("runtime_info.json.old").exists());
        assert!(!dir.path().join("placement_log.json.2026-01-01-00").exists());
        assert!(dir.path().join("keep.txt").exists());
    }
}
