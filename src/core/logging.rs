//! 日志初始化
//!
//! 配置tracing日志框架。日志级别优先取 `RUST_LOG` 环境变量，
//! 否则使用 `LoggingConfig::level`。

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::{LogLevel, LoggingConfig};

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// 安装全局日志订阅者
///
/// 重复调用是安全的：已经存在全局订阅者时 `try_init` 直接返回。
/// 打开日志文件失败时回退到控制台输出。
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_filter()));

    if config.log_to_file {
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file_path)
        {
            Ok(file) => {
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .try_init();
                tracing::info!(target: "editor", "Logging to {}", config.log_file_path);
                return;
            }
            Err(e) => {
                eprintln!(
                    "Failed to open log file {}: {}, falling back to console",
                    config.log_file_path, e
                );
            }
        }
    }

    if config.log_to_console {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    }
    tracing::info!(target: "editor", "Scene editor logging initialized");
}
