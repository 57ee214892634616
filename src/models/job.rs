//! 职位与投递记录

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::infrastructure::ElementHandle;

/// 投递记录中的时间格式
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 搜索结果中解析出的候选职位
///
/// 相关度分数只在创建时计算一次；一次投递尝试后即丢弃。
#[derive(Debug, Clone, PartialEq)]
pub struct JobCandidate {
    /// 站点分配的职位 ID
    pub external_id: String,
    pub title: String,
    pub company: String,
    pub relevance_score: u32,
    /// 搜索结果中的职位卡片
    pub card: Option<ElementHandle>,
}

impl JobCandidate {
    pub fn new(
        external_id: impl Into<String>,
        title: impl Into<String>,
        company: impl Into<String>,
        relevance_score: u32,
    ) -> Self {
        Self {
            external_id: external_id.into(),
            title: title.into(),
            company: company.into(),
            relevance_score,
            card: None,
        }
    }

    pub fn with_card(mut self, card: ElementHandle) -> Self {
        self.card = Some(card);
        self
    }
}

/// 一次投递尝试的记录，写入后不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    pub external_id: String,
    pub title: String,
    pub company: String,
    /// 是否找到了投递按钮
    pub attempted: bool,
    pub submitted: bool,
}

impl ApplicationRecord {
    pub fn new(candidate: &JobCandidate, attempted: bool, submitted: bool) -> Self {
        Self {
            timestamp: chrono::Local::now().naive_local(),
            external_id: candidate.external_id.clone(),
            title: candidate.title.clone(),
            company: candidate.company.clone(),
            attempted,
            submitted,
        }
    }
}

mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}
