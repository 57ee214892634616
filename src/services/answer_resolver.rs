//! 问题回答 - 业务能力层
//!
//! 按层级回答表单问题，第一个给出结论的层级胜出：
//! 1. 规则关键词精确包含
//! 2. 规则关键词模糊匹配（相似度 > 0.75，取最高）
//! 3. 问题类型默认回答
//! 4. 是非题兜底
//! 5. 人工追问
//! 6. 记录为未回答
//!
//! 本模块不操作页面。

use std::fmt;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::models::{append_rule, AnswerRule, ApplicantProfile};

use super::answer_cache::AnswerCache;
use super::escalation::{EscalationPort, EscalationReply, SkipEscalation};
use super::question_patterns::{heuristic_answer, yes_no_answer};
use super::similarity::similarity;
use super::unanswered_ledger::UnansweredLedger;

/// 模糊匹配阈值（严格大于）
pub const FUZZY_ANSWER_THRESHOLD: f64 = 0.75;

/// 答案的来源层级
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerSource {
    ExactKeyword,
    FuzzyKeyword { similarity: f64 },
    Heuristic(&'static str),
    YesNo,
    Escalated,
}

impl fmt::Display for AnswerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerSource::ExactKeyword => write!(f, "精确匹配"),
            AnswerSource::FuzzyKeyword { similarity } => {
                write!(f, "模糊匹配 {:.0}%", similarity * 100.0)
            }
            AnswerSource::Heuristic(category) => write!(f, "默认回答/{}", category),
            AnswerSource::YesNo => write!(f, "是非题"),
            AnswerSource::Escalated => write!(f, "人工回答"),
        }
    }
}

/// 回答结果
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// 可填写的答案（可能为空串，表示留空）
    Text { value: String, source: AnswerSource },
    Unanswerable,
    /// 放弃整个投递
    Discard,
}

impl Answer {
    pub fn text(&self) -> Option<&str> {
        match self {
            Answer::Text { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// 问题回答器
pub struct AnswerResolver {
    rules: Vec<AnswerRule>,
    profile: ApplicantProfile,
    escalation: Option<Box<dyn EscalationPort>>,
    rules_path: Option<PathBuf>,
    unanswered: UnansweredLedger,
    cache: AnswerCache,
}

impl AnswerResolver {
    /// 不追问、不落盘的回答器
    pub fn new(rules: Vec<AnswerRule>, profile: ApplicantProfile) -> Self {
        Self {
            rules,
            profile,
            escalation: None,
            rules_path: None,
            unanswered: UnansweredLedger::in_memory(),
            cache: AnswerCache::new(),
        }
    }

    /// 启用人工追问
    pub fn with_escalation(mut self, port: Box<dyn EscalationPort>) -> Self {
        self.escalation = Some(port);
        self
    }

    /// 人工回答请求保存时写入的规则文件
    pub fn with_rules_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.rules_path = Some(path.into());
        self
    }

    pub fn with_unanswered_ledger(mut self, ledger: UnansweredLedger) -> Self {
        self.unanswered = ledger;
        self
    }

    pub fn rules(&self) -> &[AnswerRule] {
        &self.rules
    }

    pub fn cache(&self) -> &AnswerCache {
        &self.cache
    }

    pub fn unanswered(&self) -> &UnansweredLedger {
        &self.unanswered
    }

    /// 回答一个问题
    pub async fn answer(&mut self, question: &str) -> Answer {
        if let Some((value, source)) = self.resolve_automatically(question) {
            info!("[{}] '{}' → '{}'", source, question, value);
            self.cache.record(question, &value);
            return Answer::Text { value, source };
        }

        warn!("[未匹配] 无法自动回答: '{}'", question);

        if let Some(port) = &self.escalation {
            match port.ask(question) {
                EscalationReply::Discard => return Answer::Discard,
                EscalationReply::Answer {
                    text,
                    persist_keywords,
                } => {
                    if let Some(keywords) = persist_keywords {
                        self.persist(keywords, &text).await;
                    }
                    self.cache.record(question, &text);
                    return Answer::Text {
                        value: text,
                        source: AnswerSource::Escalated,
                    };
                }
                EscalationReply::Skip => {}
            }
        }

        match self.unanswered.record(question).await {
            Ok(true) => info!("已记录未回答的问题，留待人工整理"),
            Ok(false) => {}
            Err(e) => warn!("记录未回答的问题失败: {}", e),
        }
        Answer::Unanswerable
    }

    /// 前四个层级，不产生副作用
    pub fn resolve_automatically(&self, question: &str) -> Option<(String, AnswerSource)> {
        if let Some(rule) = exact_match(&self.rules, question) {
            return Some((rule.answer.clone(), AnswerSource::ExactKeyword));
        }
        if let Some((rule, ratio)) = fuzzy_match(&self.rules, question) {
            return Some((
                rule.answer.clone(),
                AnswerSource::FuzzyKeyword { similarity: ratio },
            ));
        }
        if let Some((category, value)) = heuristic_answer(question, &self.profile) {
            return Some((value, AnswerSource::Heuristic(category)));
        }
        yes_no_answer(question).map(|value| (value.to_string(), AnswerSource::YesNo))
    }

    async fn persist(&self, keywords: Vec<String>, answer: &str) {
        let Some(path) = &self.rules_path else {
            return;
        };
        let rule = AnswerRule::new(keywords, answer);
        match append_rule(path, &rule).await {
            Ok(()) => info!("已保存新规则到 {}，关键词: {:?}", path.display(), rule.keywords),
            Err(e) => warn!("保存规则失败: {}", e),
        }
    }
}

impl Default for AnswerResolver {
    fn default() -> Self {
        Self::new(Vec::new(), ApplicantProfile::default())
            .with_escalation(Box::new(SkipEscalation))
    }
}

/// 第一条有关键词（忽略大小写）出现在问题中的规则
pub fn exact_match<'a>(rules: &'a [AnswerRule], question: &str) -> Option<&'a AnswerRule> {
    let lowered = question.to_lowercase();
    rules.iter().find(|rule| {
        rule.keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .any(|k| !k.is_empty() && lowered.contains(&k))
    })
}

/// 相似度最高且超过阈值的规则；同分取先定义者
pub fn fuzzy_match<'a>(rules: &'a [AnswerRule], question: &str) -> Option<(&'a AnswerRule, f64)> {
    let mut best: Option<(&AnswerRule, f64)> = None;
    for rule in rules {
        for keyword in &rule.keywords {
            let ratio = similarity(keyword, question);
            if ratio <= FUZZY_ANSWER_THRESHOLD {
                continue;
            }
            if best.map(|(_, top)| ratio > top).unwrap_or(true) {
                best = Some((rule, ratio));
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn profile() -> ApplicantProfile {
        ApplicantProfile {
            years_of_experience: 8,
            salary: "100000".to_string(),
            locations: vec!["Remote".to_string()],
            ..Default::default()
        }
    }

    struct Scripted {
        reply: EscalationReply,
        calls: Arc<AtomicUsize>,
    }

    impl EscalationPort for Scripted {
        fn ask(&self, _question: &str) -> EscalationReply {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    #[tokio::test]
    async fn test_exact_beats_fuzzy_and_order_preserved() {
        let rules = vec![
            AnswerRule::new(["sql server"], "fuzzy"),
            AnswerRule::new(["python"], "first"),
            AnswerRule::new(["python"], "second"),
        ];
        let mut resolver = AnswerResolver::new(rules, profile());
        let answer = resolver.answer("Python").await;
        assert_eq!(answer.text(), Some("first"));
        assert!(matches!(
            answer,
            Answer::Text { source: AnswerSource::ExactKeyword, .. }
        ));
    }

    #[test]
    fn test_fuzzy_threshold_and_ranking() {
        let rules = vec![
            AnswerRule::new(["authorised to work"], "A"),
            AnswerRule::new(["authorized to work!"], "B"),
            AnswerRule::new(["unrelated"], "C"),
        ];
        // 两条都超过阈值时取相似度更高者
        let (rule, ratio) = fuzzy_match(&rules, "authorized to work").unwrap();
        assert_eq!(rule.answer, "B");
        assert!(ratio > FUZZY_ANSWER_THRESHOLD);

        assert!(fuzzy_match(&rules, "Are you legally authorized to work in the US?").is_none());
    }

    #[test]
    fn test_fuzzy_tie_keeps_definition_order() {
        let rules = vec![
            AnswerRule::new(["relocatex"], "first"),
            AnswerRule::new(["relocatey"], "second"),
        ];
        let (rule, _) = fuzzy_match(&rules, "relocate").unwrap();
        assert_eq!(rule.answer, "first");
    }

    #[test]
    fn test_empty_keyword_never_matches() {
        let rules = vec![AnswerRule::new(["", "  "], "nope")];
        assert!(exact_match(&rules, "anything").is_none());
    }

    #[tokio::test]
    async fn test_heuristic_before_yes_no() {
        let mut resolver = AnswerResolver::new(Vec::new(), profile());
        let answer = resolver
            .answer("How many years of experience do you have?")
            .await;
        assert_eq!(
            answer,
            Answer::Text {
                value: "8".to_string(),
                source: AnswerSource::Heuristic("experience"),
            }
        );
    }

    #[tokio::test]
    async fn test_sponsorship_answered_no() {
        let mut resolver = AnswerResolver::new(Vec::new(), profile());
        let answer = resolver.answer("Do you require visa sponsorship?").await;
        assert_eq!(answer.text(), Some("No"));
    }

    #[tokio::test]
    async fn test_unanswerable_recorded_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unanswered.toml");
        let mut resolver = AnswerResolver::new(Vec::new(), profile())
            .with_unanswered_ledger(UnansweredLedger::new(&path));

        let question = "Favourite programming paradigm";
        assert_eq!(resolver.answer(question).await, Answer::Unanswerable);
        assert_eq!(resolver.answer(question).await, Answer::Unanswerable);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches(question).count(), 1);
        assert!(resolver.cache().is_empty());
    }

    #[tokio::test]
    async fn test_escalation_discard_propagates() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut resolver = AnswerResolver::new(Vec::new(), profile()).with_escalation(Box::new(
            Scripted {
                reply: EscalationReply::Discard,
                calls: calls.clone(),
            },
        ));
        assert_eq!(resolver.answer("Favourite paradigm").await, Answer::Discard);
        assert!(resolver.unanswered().is_empty());

        // 自动层级命中时不追问
        resolver.answer("Do you have a driver's license?").await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_escalation_skip_is_unanswerable() {
        let mut resolver = AnswerResolver::new(Vec::new(), profile())
            .with_escalation(Box::new(SkipEscalation));
        assert_eq!(resolver.answer("Favourite paradigm").await, Answer::Unanswerable);
        assert!(resolver.unanswered().seen().contains("Favourite paradigm"));
    }

    #[tokio::test]
    async fn test_escalated_answer_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let rules_path = dir.path().join("questions.toml");
        let mut resolver = AnswerResolver::new(Vec::new(), profile())
            .with_rules_file(&rules_path)
            .with_escalation(Box::new(Scripted {
                reply: EscalationReply::Answer {
                    text: "Functional".to_string(),
                    persist_keywords: Some(vec!["paradigm".to_string()]),
                },
                calls: Arc::new(AtomicUsize::new(0)),
            }));

        let answer = resolver.answer("Favourite paradigm").await;
        assert_eq!(answer.text(), Some("Functional"));
        assert_eq!(resolver.cache().get("Favourite paradigm"), Some("Functional"));

        let saved = crate::models::load_rules(&rules_path).await.unwrap();
        assert_eq!(saved, vec![AnswerRule::new(["paradigm"], "Functional")]);
    }
}
