//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：写日志文件头、连接或启动浏览器、创建 JsExecutor
//! 2. **装配能力**：加载问答规则，构造答案解析器与搜索循环
//! 3. **资源管理**：持有 Browser 和 JsExecutor，确保生命周期正确
//! 4. **收尾**：导出问答缓存，输出全局统计

use std::path::Path;

use anyhow::{Context, Result};
use chromiumoxide::Browser;
use tracing::{info, warn};

use crate::browser;
use crate::config::Config;
use crate::error::AppError;
use crate::infrastructure::JsExecutor;
use crate::models::{load_rules, AnswerRule, ApplicantProfile};
use crate::orchestrator::search_runner::{RunStats, SearchRunner};
use crate::services::{AnswerResolver, TerminalEscalation, UnansweredLedger};
use crate::utils::logging::{init_log_file, log_startup, print_final_stats};

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    executor: JsExecutor,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        init_log_file(&config.output_log_file)?;
        log_startup(&config);

        let (browser, page) = browser::open_session(&config.browser).await?;

        // JsExecutor 是唯一持有 page 的对象
        let executor = JsExecutor::new(page);

        Ok(Self {
            config,
            _browser: browser,
            executor,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        let rules = load_rules(Path::new(&self.config.questions_file))
            .await
            .with_context(|| format!("无法加载问答规则: {}", self.config.questions_file))?;
        info!("✓ 加载了 {} 条问答规则", rules.len());

        let mut answers = build_answer_resolver(&self.config, rules);
        let runner = SearchRunner::new(&self.config);
        info!("📋 共 {} 个搜索组合", runner.combos().len());

        let stats = runner.run(&self.executor, &mut answers).await?;

        self.export_answers(&answers);
        finish(&stats, &self.config.output_log_file)
    }

    fn export_answers(&self, answers: &AnswerResolver) {
        if answers.cache().is_empty() {
            return;
        }
        let path = Path::new(&self.config.qa_export_file);
        match answers.cache().export_csv(path) {
            Ok(()) => info!(
                "💾 已导出 {} 条问答到 {}",
                answers.cache().len(),
                path.display()
            ),
            Err(e) => warn!("⚠️ 导出问答失败: {:#}", e),
        }
        if !answers.unanswered().is_empty() {
            info!(
                "📝 {} 个问题未能回答，见 {}",
                answers.unanswered().len(),
                self.config.unanswered_file
            );
        }
    }
}

/// 按配置装配答案解析器
pub fn build_answer_resolver(config: &Config, rules: Vec<AnswerRule>) -> AnswerResolver {
    let resolver = AnswerResolver::new(rules, ApplicantProfile::from_config(config))
        .with_rules_file(&config.questions_file)
        .with_unanswered_ledger(UnansweredLedger::new(&config.unanswered_file));

    if config.interactive_mode {
        info!("💬 交互模式：无法回答的问题将询问用户");
        resolver.with_escalation(Box::new(TerminalEscalation::stdio()))
    } else {
        resolver
    }
}

/// 输出统计；会话丢失时以错误结束
fn finish(stats: &RunStats, log_file_path: &str) -> Result<()> {
    print_final_stats(&stats.summary_lines(), log_file_path);
    match &stats.session_lost {
        Some(reason) => Err(AppError::page_unreachable(reason.clone()).into()),
        None => Ok(()),
    }
}
