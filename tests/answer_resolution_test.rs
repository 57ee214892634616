//! 答题与筛选的端到端场景

use easy_apply::models::{load_rules, ApplicantProfile};
use easy_apply::services::relevance::score;
use easy_apply::services::{
    Answer, AnswerResolver, AnswerSource, EscalationPort, EscalationReply, RelevanceScorer,
    Screening, UnansweredLedger,
};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_senior_data_analyst_scores_seventy() {
    assert_eq!(score("Senior Data Analyst", &strings(&["data"]), &[]), 70);
}

#[test]
fn test_staffing_company_excluded_before_scoring() {
    let scorer = RelevanceScorer::new(&strings(&["data"]), &strings(&["staffing"]), &[]);
    assert_eq!(
        scorer.screen("Data Analyst", "Acme Staffing Inc"),
        Screening::BlacklistedCompany("staffing".to_string())
    );
}

#[test]
fn test_exact_title_scores_at_least_hundred() {
    assert!(score("data analyst", &strings(&["Data Analyst"]), &[]) >= 100);
}

#[tokio::test]
async fn test_years_answered_by_heuristic() {
    let profile = ApplicantProfile {
        years_of_experience: 8,
        ..Default::default()
    };
    let mut resolver = AnswerResolver::new(Vec::new(), profile);
    match resolver
        .answer("How many years of experience do you have?")
        .await
    {
        Answer::Text { value, source } => {
            assert_eq!(value, "8");
            assert!(matches!(source, AnswerSource::Heuristic(_)));
        }
        other => panic!("应由启发式回答: {:?}", other),
    }
}

#[tokio::test]
async fn test_sponsorship_answered_no() {
    let mut resolver = AnswerResolver::new(Vec::new(), ApplicantProfile::default());
    let answer = resolver.answer("Do you require visa sponsorship?").await;
    assert_eq!(answer.text(), Some("No"));
}

#[tokio::test]
async fn test_unanswerable_exported_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("unanswered_questions.toml");

    let mut resolver = AnswerResolver::new(Vec::new(), ApplicantProfile::default())
        .with_unanswered_ledger(UnansweredLedger::new(&path));

    let question = "Describe a pipeline you built";
    assert_eq!(resolver.answer(question).await, Answer::Unanswerable);
    assert_eq!(resolver.answer(question).await, Answer::Unanswerable);

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.matches(question).count(), 1);
}

struct AnswerAndSave;

impl EscalationPort for AnswerAndSave {
    fn ask(&self, _question: &str) -> EscalationReply {
        EscalationReply::Answer {
            text: "Airflow and Rust".to_string(),
            persist_keywords: Some(vec!["pipeline".to_string()]),
        }
    }
}

#[tokio::test]
async fn test_escalated_answer_reloads_as_rule() {
    let dir = tempfile::tempdir().unwrap();
    let rules_path = dir.path().join("questions.toml");

    let mut resolver = AnswerResolver::new(Vec::new(), ApplicantProfile::default())
        .with_escalation(Box::new(AnswerAndSave))
        .with_rules_file(&rules_path);
    let answer = resolver.answer("Describe a pipeline you built").await;
    assert_eq!(answer.text(), Some("Airflow and Rust"));
    // 内存中的规则不变
    assert!(resolver.rules().is_empty());

    let reloaded = load_rules(&rules_path).await.unwrap();
    let next_run = AnswerResolver::new(reloaded, ApplicantProfile::default());
    let (value, source) = next_run
        .resolve_automatically("Which pipeline are you proudest of?")
        .unwrap();
    assert_eq!(value, "Airflow and Rust");
    assert_eq!(source, AnswerSource::ExactKeyword);
}
