/// 日志工具模块
///
/// 提供日志初始化和格式化输出的辅助函数
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::ScoreResult;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，未设置时默认 `info`，详细模式下为 `debug`。
/// 日志写到 stderr，stdout 只留给 JSON 结果。重复初始化会被忽略。
///
/// # 参数
/// - `verbose`: 是否显示详细日志
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 答卷计分模式");
    info!("📊 最大并发数: {}", config.max_concurrent_documents);
    info!("⏱️ 获取超时: {} 秒", config.fetch_timeout_secs);
    if let Some(profile) = &config.exam_profile {
        info!("🎯 指定考试类型: {}", profile);
    }
    info!("{}", "=".repeat(60));
}

/// 记录单份答卷的分区明细
///
/// # 参数
/// - `prefix`: 日志前缀（答卷上下文）
/// - `result`: 计分结果
pub fn log_document_scored(prefix: &str, result: &ScoreResult) {
    for scored in &result.sections {
        let agg = &scored.aggregate;
        debug!(
            "{} {}{}: 对 {} / 错 {} / 未答 {} / 共 {}，得分 {:.2}{}",
            prefix,
            truncate_text(&scored.section.name, 24),
            if scored.section.excluded { "（不计分）" } else { "" },
            agg.correct_count,
            agg.incorrect_count,
            agg.unattempted_count,
            agg.total_count,
            agg.raw_score,
            agg.adjusted_score
                .map(|s| format!(" → {:.3}", s))
                .unwrap_or_default()
        );
    }
    if result.penalty_pool > 0.0 {
        debug!("{} 罚分池 {:.3}", prefix, result.penalty_pool);
    }
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 成功数量
/// - `failed`: 失败数量
/// - `total`: 总数
pub fn print_final_stats(success: usize, failed: usize, total: usize) {
    info!("{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
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
