//! 候选职位来源
//!
//! 负责搜索地址、翻页和职位卡片解析。投递流程只消费这里产出的卡片。

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};
use url::Url;

use crate::config::Config;
use crate::infrastructure::{ElementHandle, ElementSnapshot, PageDriver};

/// 搜索结果中的职位卡片
pub const JOB_CARD_SELECTOR: &str = "div[data-job-id]";

/// 每页结果数，也是 `start` 参数的步长
pub const RESULTS_PER_PAGE: usize = 25;

/// 一次结果页查询
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub position: String,
    pub location: String,
    /// 结果偏移
    pub start: usize,
}

impl SearchQuery {
    pub fn first_page(position: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            position: position.into(),
            location: location.into(),
            start: 0,
        }
    }

    pub fn next_page(&self) -> Self {
        Self {
            start: self.start + RESULTS_PER_PAGE,
            ..self.clone()
        }
    }

    pub fn page_number(&self) -> usize {
        self.start / RESULTS_PER_PAGE + 1
    }
}

/// 从职位卡片解析出的原始信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCard {
    pub external_id: String,
    pub title: String,
    pub company: String,
    pub handle: ElementHandle,
}

/// 候选职位来源
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// 打开一页结果并返回其中尚未投递过的卡片
    async fn fetch(&self, page: &dyn PageDriver, query: &SearchQuery) -> Result<Vec<JobCard>>;
}

/// 站内职位搜索
#[derive(Debug, Clone)]
pub struct LinkedInSearch {
    base_url: String,
    experience_levels: Vec<u8>,
    settle: Duration,
}

impl LinkedInSearch {
    pub fn new(config: &Config) -> Self {
        Self {
            base_url: config.browser.search_base_url.clone(),
            experience_levels: config.experience_level.clone(),
            settle: config.timing.settle(),
        }
    }

    /// 构造结果页地址：只看快速申请职位
    pub fn search_url(&self, query: &SearchQuery) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("无效的搜索地址: {}", self.base_url))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("f_LF", "f_AL")
                .append_pair("keywords", &query.position)
                .append_pair("location", &query.location)
                .append_pair("start", &query.start.to_string());
            if !self.experience_levels.is_empty() {
                let levels = self
                    .experience_levels
                    .iter()
                    .map(|l| l.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                pairs.append_pair("f_E", &levels);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl CandidateSource for LinkedInSearch {
    async fn fetch(&self, page: &dyn PageDriver, query: &SearchQuery) -> Result<Vec<JobCard>> {
        let url = self.search_url(query)?;
        info!(
            "🔍 加载结果页: {} @ {} (第 {} 页)",
            query.position,
            query.location,
            query.page_number()
        );
        page.navigate(url.as_str()).await?;
        tokio::time::sleep(self.settle).await;

        // 结果列表懒加载，滚动到底才能拿到整页卡片
        page.scroll_results().await?;

        let snapshots = page.query(JOB_CARD_SELECTOR).await?;
        let cards: Vec<JobCard> = snapshots.iter().filter_map(parse_job_card).collect();
        debug!("结果页共 {} 个元素，解析出 {} 张卡片", snapshots.len(), cards.len());
        Ok(cards)
    }
}

/// 卡片底部的已投递标记：单独一行 `Applied` 或 `Applied 3 days ago`
fn is_applied_marker(line: &str) -> bool {
    let line = line.trim();
    line == "Applied" || (line.starts_with("Applied ") && line.ends_with(" ago"))
}

/// 解析一张职位卡片
///
/// 第一行为标题，第二行为公司。已投递的卡片和占位 ID `search` 被丢弃。
pub fn parse_job_card(snapshot: &ElementSnapshot) -> Option<JobCard> {
    let external_id = snapshot.attr("data-job-id")?.trim();
    if external_id.is_empty() || external_id == "search" {
        return None;
    }
    if snapshot.text.lines().any(is_applied_marker) {
        debug!("跳过已投递的卡片: {}", external_id);
        return None;
    }

    let mut lines = snapshot
        .text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty());
    let title = lines.next()?.to_string();
    let company = lines.next().unwrap_or_default().to_string();

    Some(JobCard {
        external_id: external_id.to_string(),
        title,
        company,
        handle: snapshot.handle.clone(),
    })
}
