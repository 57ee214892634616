//! 日志工具模块
//!
//! 提供日志初始化、格式化和输出的辅助函数

use std::fs::{self, OpenOptions};
use std::io::Write;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化终端日志
///
/// 级别由 `RUST_LOG` 控制，默认 `info`。重复调用无副作用。
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n投递日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法创建日志文件: {}", log_file_path))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 快速申请模式");
    info!("🎯 职位: {}", config.positions.join(", "));
    info!("📍 地点: {}", config.locations.join(", "));
    info!("⏱️ 搜索时长上限: {} 分钟", config.max_search_minutes);
    if config.browser.launch {
        info!("🌐 浏览器: 自行启动");
    } else {
        info!("🌐 浏览器: 连接端口 {}", config.browser.debug_port);
    }
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息，并追加到日志文件
///
/// # 参数
/// - `lines`: 统计行
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(lines: &[String], log_file_path: &str) {
    let finished = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!("完成时间: {}", finished);
    info!("{}", "=".repeat(60));
    for line in lines {
        info!("{}", line);
    }
    info!("{}", "=".repeat(60));

    let mut block = format!(
        "{}\n统计 - {}\n{}\n",
        "=".repeat(60),
        finished,
        "=".repeat(60)
    );
    for line in lines {
        block.push_str(line);
        block.push('\n');
    }

    match append_to_file(log_file_path, &block) {
        Ok(()) => info!("\n日志已保存至: {}", log_file_path),
        Err(e) => warn!("⚠️ 写入日志文件失败: {:#}", e),
    }
}

fn append_to_file(path: &str, content: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("无法打开日志文件: {}", path))?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（字符数）
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
