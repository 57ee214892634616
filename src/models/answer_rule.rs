//! 问答规则

use serde::{Deserialize, Serialize};

/// 关键词到答案的映射
///
/// 规则在启动时加载一次，运行期间不变；定义顺序决定优先级。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRule {
    pub keywords: Vec<String>,
    pub answer: String,
}

impl AnswerRule {
    pub fn new<K: Into<String>>(keywords: impl IntoIterator<Item = K>, answer: impl Into<String>) -> Self {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            answer: answer.into(),
        }
    }
}

/// 规则文件中的原始条目，缺字段的条目会被跳过
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawAnswerRule {
    pub keywords: Option<Vec<String>>,
    pub answer: Option<String>,
}

impl RawAnswerRule {
    pub(crate) fn into_rule(self) -> Option<AnswerRule> {
        match (self.keywords, self.answer) {
            (Some(keywords), Some(answer)) if !keywords.is_empty() => {
                Some(AnswerRule { keywords, answer })
            }
            _ => None,
        }
    }
}
