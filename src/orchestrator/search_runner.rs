//! 搜索循环 - 编排层
//!
//! ## 职责
//!
//! 按随机顺序遍历"职位 × 地点"组合，逐页拉取候选职位，
//! 去重、筛选后交给 `ApplicationFlow` 逐个投递，并写入投递记录。
//!
//! ## 设计特点
//!
//! - **严格串行**：同一时刻只有一个职位在操作页面
//! - **全局时限**：每拉取一页结果前检查一次搜索时长
//! - **故障收敛**：单个职位的失败只影响该职位；只有会话丢失会结束整个运行

use std::collections::HashSet;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::infrastructure::PageDriver;
use crate::models::JobCandidate;
use crate::orchestrator::candidate_source::{
    CandidateSource, JobCard, LinkedInSearch, SearchQuery,
};
use crate::services::{AnswerResolver, ApplicationLedger, RelevanceScorer, Screening};
use crate::workflow::{ApplicationCtx, ApplicationFlow, ApplicationOutcome};

/// 运行统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub submitted: usize,
    pub failed: usize,
    pub discarded: usize,
    pub no_apply_control: usize,
    /// 被黑名单或相关度筛掉的职位
    pub filtered: usize,
    /// 近期已投递或本次运行已见过的职位
    pub duplicates: usize,
    pub pages: usize,
    /// 写入失败、未留下记录的职位
    pub ledger_write_failures: usize,
    /// 会话丢失的原因；非空时运行提前结束
    pub session_lost: Option<String>,
}

impl RunStats {
    /// 走完投递流程的职位数（每个都尝试写一条记录）
    pub fn processed(&self) -> usize {
        self.submitted + self.failed + self.discarded + self.no_apply_control
    }

    fn record(&mut self, outcome: &ApplicationOutcome) {
        match outcome {
            ApplicationOutcome::Submitted => self.submitted += 1,
            ApplicationOutcome::Discarded => self.discarded += 1,
            ApplicationOutcome::NoApplyControl => self.no_apply_control += 1,
            ApplicationOutcome::Failed(_) => self.failed += 1,
        }
    }

    /// 用于终端与日志文件的统计行
    pub fn summary_lines(&self) -> Vec<String> {
        vec![
            format!("✅ 已提交: {}/{}", self.submitted, self.processed()),
            format!("❌ 失败: {}", self.failed),
            format!("🗑️ 放弃: {}", self.discarded),
            format!("⏭️ 无投递按钮: {}", self.no_apply_control),
            format!("🚫 被筛除: {}", self.filtered),
            format!("🔁 重复: {}", self.duplicates),
            format!("📄 结果页: {}", self.pages),
            format!("💾 记录写入失败: {}", self.ledger_write_failures),
        ]
    }
}

/// 搜索循环
pub struct SearchRunner {
    combos: Vec<(String, String)>,
    budget: Duration,
    dedup_window_days: i64,
    source: Box<dyn CandidateSource>,
    flow: ApplicationFlow,
    scorer: RelevanceScorer,
    ledger: ApplicationLedger,
}

impl SearchRunner {
    pub fn new(config: &Config) -> Self {
        Self {
            combos: shuffled_combos(&config.positions, &config.locations, &mut rand::thread_rng()),
            budget: config.search_budget(),
            dedup_window_days: config.dedup_window_days,
            source: Box::new(LinkedInSearch::new(config)),
            flow: ApplicationFlow::new(config),
            scorer: RelevanceScorer::new(
                &config.positions,
                &config.blacklist,
                &config.blacklist_titles,
            ),
            ledger: ApplicationLedger::new(&config.output_filename),
        }
    }

    pub fn with_source(mut self, source: Box<dyn CandidateSource>) -> Self {
        self.source = source;
        self
    }

    /// 固定组合顺序
    pub fn with_combos(mut self, combos: Vec<(String, String)>) -> Self {
        self.combos = combos;
        self
    }

    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    pub fn combos(&self) -> &[(String, String)] {
        &self.combos
    }

    /// 运行整个搜索循环
    ///
    /// 只有启动时读取投递记录失败会返回错误；单条记录写入失败计入
    /// `RunStats::ledger_write_failures`，会话丢失记录在 `RunStats::session_lost`。
    pub async fn run(&self, page: &dyn PageDriver, answers: &mut AnswerResolver) -> Result<RunStats> {
        let now = chrono::Local::now().naive_local();
        let mut seen = self
            .ledger
            .recent_ids(self.dedup_window_days, now)
            .context("无法读取投递记录")?;
        info!(
            "✓ 近 {} 天已投递 {} 个职位，将跳过",
            self.dedup_window_days,
            seen.len()
        );

        let started = Instant::now();
        let mut stats = RunStats::default();
        let mut index = 0;

        'combos: for (position, location) in &self.combos {
            info!("\n{}", "=".repeat(60));
            info!("🎯 搜索组合: {} @ {}", position, location);
            info!("{}", "=".repeat(60));

            let mut query = SearchQuery::first_page(position.as_str(), location.as_str());
            loop {
                let elapsed = started.elapsed();
                if elapsed >= self.budget {
                    info!("⏰ 已达到搜索时长上限，停止搜索");
                    break 'combos;
                }
                info!(
                    "⏳ 本次搜索剩余约 {} 分钟",
                    (self.budget - elapsed).as_secs() / 60
                );

                let cards = match self.source.fetch(page, &query).await {
                    Ok(cards) => cards,
                    Err(e) => {
                        warn!("⚠️ 加载结果页失败: {:#}", e);
                        if let Some(reason) = probe_session(page).await {
                            stats.session_lost = Some(reason);
                            break 'combos;
                        }
                        break;
                    }
                };
                stats.pages += 1;

                if cards.is_empty() {
                    info!("📭 没有更多结果，切换下一组合");
                    break;
                }

                for card in cards {
                    if !seen.insert(card.external_id.clone()) {
                        debug!("跳过重复职位: {}", card.external_id);
                        stats.duplicates += 1;
                        continue;
                    }

                    let Some(candidate) = self.screen(card, &mut stats) else {
                        continue;
                    };

                    index += 1;
                    let ctx = ApplicationCtx::new(&candidate, index);
                    let report = self.flow.run(page, answers, &candidate, &ctx).await;

                    if let Err(e) = self.ledger.append(&report.record) {
                        error!("{} ❌ 无法写入投递记录: {}", ctx, e);
                        stats.ledger_write_failures += 1;
                    }
                    stats.record(&report.outcome);

                    if matches!(report.outcome, ApplicationOutcome::Failed(_)) {
                        if let Some(reason) = probe_session(page).await {
                            stats.session_lost = Some(reason);
                            break 'combos;
                        }
                    }
                }

                query = query.next_page();
            }
        }

        Ok(stats)
    }

    /// 黑名单与相关度筛选，通过的卡片转为候选职位
    fn screen(&self, card: JobCard, stats: &mut RunStats) -> Option<JobCandidate> {
        match self.scorer.screen(&card.title, &card.company) {
            Screening::Relevant(score) => {
                info!(
                    "✓ 匹配职位 (分数 {}): '{}' @ '{}'",
                    score, card.title, card.company
                );
                Some(
                    JobCandidate::new(card.external_id, card.title, card.company, score)
                        .with_card(card.handle),
                )
            }
            Screening::BlacklistedCompany(hit) => {
                info!("🚫 公司在黑名单中 ({}): '{}'", hit, card.company);
                stats.filtered += 1;
                None
            }
            Screening::BlacklistedTitle(hit) => {
                info!("🚫 标题含黑名单关键词 ({}): '{}'", hit, card.title);
                stats.filtered += 1;
                None
            }
            Screening::Irrelevant => {
                debug!("跳过低相关度职位: '{}'", card.title);
                stats.filtered += 1;
                None
            }
        }
    }
}

/// 探测页面是否仍可用，不可用时返回原因
async fn probe_session(page: &dyn PageDriver) -> Option<String> {
    match page.ping().await {
        Ok(()) => None,
        Err(e) => {
            error!("❌ 浏览器页面已不可用，结束本次运行: {:#}", e);
            Some(e.to_string())
        }
    }
}

/// 去重后打乱的"职位 × 地点"组合
pub fn shuffled_combos<R: Rng + ?Sized>(
    positions: &[String],
    locations: &[String],
    rng: &mut R,
) -> Vec<(String, String)> {
    let mut unique = HashSet::new();
    let mut combos: Vec<(String, String)> = positions
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .flat_map(|p| {
            locations
                .iter()
                .map(|l| l.trim())
                .filter(|l| !l.is_empty())
                .map(move |l| (p.to_string(), l.to_string()))
        })
        .filter(|combo| unique.insert(combo.clone()))
        .collect();
    combos.shuffle(rng);
    combos
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_combos_unique_and_complete() {
        let mut rng = StdRng::seed_from_u64(7);
        let combos = shuffled_combos(
            &strings(&["Data Analyst", "Data Analyst", "BI Developer"]),
            &strings(&["Remote", " ", "Berlin"]),
            &mut rng,
        );
        assert_eq!(combos.len(), 4);
        let unique: HashSet<_> = combos.iter().collect();
        assert_eq!(unique.len(), 4);
        assert!(combos.contains(&("BI Developer".to_string(), "Berlin".to_string())));
    }

    #[test]
    fn test_stats_counting() {
        let mut stats = RunStats::default();
        stats.record(&ApplicationOutcome::Submitted);
        stats.record(&ApplicationOutcome::NoApplyControl);
        stats.record(&ApplicationOutcome::Failed(
            crate::error::ApplyFault::FormValidationError,
        ));
        stats.filtered = 5;

        assert_eq!(stats.processed(), 3);
        assert_eq!(stats.failed, 1);
        assert!(stats.summary_lines()[0].contains("1/3"));
    }
}
