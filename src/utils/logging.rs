//! 日志工具模块
//!
//! 提供日志格式化和输出的辅助函数

use tracing::info;

use crate::config::Config;
use crate::orchestrator::run_processor::RunStats;

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 题目分类标注模式");
    let model = if config.use_extended_reasoning {
        &config.llm_reasoning_model_name
    } else {
        &config.llm_model_name
    };
    info!("🤖 模型: {} (深度推理: {})", model, config.use_extended_reasoning);
    info!("⏱️ 题目间隔: {} ms", config.pacing_delay_ms);
    info!("{}", "=".repeat(60));
}

/// 记录输入加载信息
///
/// # 参数
/// - `leaves`: MapID 题型总数
/// - `exercises`: 文档中的题目数
pub fn log_inputs_loaded(leaves: usize, exercises: usize) {
    info!("✓ MapID 共 {} 个题型", leaves);
    info!("✓ 找到 {} 道待处理的题目", exercises);
    info!("💡 逐题处理，按 Ctrl+C 取消\n");
}

pub fn log_exercise_start(index: usize, total: usize) {
    info!("\n{}", "─".repeat(60));
    info!("📄 开始处理第 {}/{} 题", index, total);
}

/// 冷却倒计时
pub fn log_cooldown(index: usize, remaining_secs: u64) {
    info!("[练习 {}] ⏳ 冷却中，剩余 {} 秒", index, remaining_secs);
}

/// 打印最终统计信息
///
/// # 参数
/// - `stats`: 结果统计
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(stats: &RunStats, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 有效: {}/{}", stats.valid, stats.total());
    info!("⚠️ 警告: {}", stats.warning);
    info!("❌ 失败: {}", stats.error);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
