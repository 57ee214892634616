//! 职位相关度评分 - 业务能力层
//!
//! 纯函数：职位标题 + 目标职位列表 → 分数。0 表示不投递，
//! 其余分数只用于判断是否纳入，不用于排序。

use phf::phf_map;
use tracing::debug;

use super::similarity::similarity;

/// 出现即排除的标题关键词（除非目标职位本身与之重叠）
pub const IRRELEVANT_KEYWORDS: &[&str] = &[
    "intern",
    "internship",
    "entry level data entry",
    "data entry clerk",
    "senior manager",
    "director",
    "vp ",
    "vice president",
    "recruiter",
    "recruitment",
    "sales",
    "account executive",
    "customer service",
    "customer support",
    "administrative",
    "secretary",
    "clerk",
];

/// 目标职位 → 领域相关词
static RELATED_TERMS: phf::Map<&'static str, &'static [&'static str]> = phf_map! {
    "data" => &["analyst", "scientist", "engineer", "analytics"],
    "analytics" => &["analyst", "engineer", "specialist"],
    "analyst" => &["data", "business", "analytics"],
    "engineer" => &["data", "analytics", "software", "machine learning"],
    "scientist" => &["data", "machine learning", "research"],
};

pub const EXACT_MATCH_SCORE: u32 = 100;
pub const CONTAINS_SCORE: u32 = 50;
pub const RELATED_TERM_BONUS: u32 = 20;
pub const FUZZY_THRESHOLD: f64 = 0.6;
pub const FUZZY_WEIGHT: f64 = 30.0;

/// 筛选结论
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screening {
    /// 公司命中黑名单
    BlacklistedCompany(String),
    /// 标题命中黑名单
    BlacklistedTitle(String),
    /// 分数为 0
    Irrelevant,
    /// 可以投递
    Relevant(u32),
}

/// 相关度评分器
#[derive(Debug, Clone, Default)]
pub struct RelevanceScorer {
    wanted: Vec<String>,
    blacklist_companies: Vec<String>,
    blacklist_titles: Vec<String>,
}

impl RelevanceScorer {
    pub fn new(wanted: &[String], blacklist_companies: &[String], blacklist_titles: &[String]) -> Self {
        Self {
            wanted: lowered(wanted),
            blacklist_companies: lowered(blacklist_companies),
            blacklist_titles: lowered(blacklist_titles),
        }
    }

    /// 先查黑名单，再评分
    pub fn screen(&self, title: &str, company: &str) -> Screening {
        let company_lower = company.to_lowercase();
        if let Some(hit) = self
            .blacklist_companies
            .iter()
            .find(|b| company_lower.contains(b.as_str()))
        {
            return Screening::BlacklistedCompany(hit.clone());
        }

        if let Some(hit) = first_blacklisted_title(title, &self.blacklist_titles) {
            return Screening::BlacklistedTitle(hit.to_string());
        }

        match score_lowered(title, &self.wanted) {
            0 => Screening::Irrelevant,
            score => Screening::Relevant(score),
        }
    }

    /// 不含黑名单检查的分数
    pub fn score(&self, title: &str) -> u32 {
        score_lowered(title, &self.wanted)
    }
}

/// 计算职位标题的相关度分数
///
/// 标题黑名单在此处同样生效（返回 0），与调用方的预先检查一致。
pub fn score(title: &str, wanted_positions: &[String], blacklist_titles: &[String]) -> u32 {
    if first_blacklisted_title(title, &lowered(blacklist_titles)).is_some() {
        return 0;
    }
    score_lowered(title, &lowered(wanted_positions))
}

fn lowered(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn first_blacklisted_title<'a>(title: &str, blacklist: &'a [String]) -> Option<&'a str> {
    let title_lower = title.to_lowercase();
    blacklist
        .iter()
        .find(|b| title_lower.contains(b.as_str()))
        .map(|s| s.as_str())
}

/// `wanted` 已经是去空白的小写形式
fn score_lowered(title: &str, wanted: &[String]) -> u32 {
    let title_lower = title.to_lowercase();

    // 1. 硬排除
    for keyword in IRRELEVANT_KEYWORDS {
        if title_lower.contains(keyword) && !wanted.iter().any(|p| overlaps(p, keyword)) {
            debug!("因无关关键词 '{}' 排除: {}", keyword, title);
            return 0;
        }
    }

    // 2. 精确/包含匹配
    let mut score = 0;
    for position in wanted {
        if *position == title_lower {
            score += EXACT_MATCH_SCORE;
            continue;
        }
        if title_lower.contains(position.as_str()) {
            score += CONTAINS_SCORE;
            if let Some(terms) = RELATED_TERMS.get(position.as_str()) {
                let related = terms.iter().filter(|t| title_lower.contains(*t)).count() as u32;
                score += related * RELATED_TERM_BONUS;
            }
        }
    }

    // 3. 模糊匹配兜底
    if score == 0 {
        for position in wanted {
            let ratio = similarity(position, &title_lower);
            if ratio > FUZZY_THRESHOLD {
                score += (ratio * FUZZY_WEIGHT).floor() as u32;
            }
        }
    }

    score
}

fn overlaps(position: &str, keyword: &str) -> bool {
    let keyword = keyword.trim();
    keyword.contains(position) || position.contains(keyword)
}
