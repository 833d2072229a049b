//! 日志初始化

use std::fs;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 订阅者
///
/// 默认级别为 info，可通过 `RUST_LOG` 覆盖。重复调用不会 panic。
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .try_init();
}

/// 初始化日志文件，写入本次运行的时间头
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n题目标注日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header).with_context(|| format!("无法写入日志文件: {}", log_file_path))?;
    Ok(())
}
