//! 搜索循环的场景测试：去重、筛选、每个职位一条记录、会话丢失

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use easy_apply::config::{Config, TimingSettings};
use easy_apply::infrastructure::{ElementHandle, ElementSnapshot, FixtureEffect, FixtureFrame, FixturePage, PageDriver};
use easy_apply::models::{ApplicationRecord, ApplicantProfile, JobCandidate};
use easy_apply::orchestrator::{CandidateSource, JobCard, SearchQuery, SearchRunner};
use easy_apply::services::{AnswerResolver, ApplicationLedger};

/// 第一页返回固定卡片，之后没有结果
struct StaticSource {
    cards: Vec<JobCard>,
}

#[async_trait]
impl CandidateSource for StaticSource {
    async fn fetch(&self, _page: &dyn PageDriver, query: &SearchQuery) -> Result<Vec<JobCard>> {
        if query.start == 0 {
            Ok(self.cards.clone())
        } else {
            Ok(Vec::new())
        }
    }
}

fn job_card(id: &str, title: &str, company: &str) -> JobCard {
    JobCard {
        external_id: id.to_string(),
        title: title.to_string(),
        company: company.to_string(),
        handle: ElementHandle::new(format!("card-{}", id)),
    }
}

fn card_element(id: &str) -> ElementSnapshot {
    ElementSnapshot::fixture(&format!("card-{}", id), "div").with_attr("data-job-id", id)
}

fn config(ledger_path: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.positions = vec!["Data Analyst".to_string()];
    config.locations = vec!["Remote".to_string()];
    config.blacklist = vec!["staffing".to_string()];
    config.output_filename = ledger_path.display().to_string();
    config.timing = TimingSettings::immediate();
    config
}

#[tokio::test]
async fn test_one_record_per_processed_candidate() {
    let dir = tempfile::tempdir().unwrap();
    let ledger_path = dir.path().join("output.csv");
    let config = config(&ledger_path);

    // 近期已投递过的职位
    let ledger = ApplicationLedger::new(&ledger_path);
    ledger
        .append(&ApplicationRecord::new(
            &JobCandidate::new("300", "Data Analyst", "Old Co", 100),
            true,
            true,
        ))
        .unwrap();

    let cards = vec![
        job_card("100", "Data Analyst", "Acme"),
        job_card("200", "Data Analyst", "Acme Staffing Inc"),
        job_card("300", "Data Analyst", "Old Co"),
        job_card("400", "Senior Data Analyst", "Globex"),
        job_card("500", "Warehouse Associate", "Initech"),
    ];

    let results = || {
        FixtureFrame::new()
            .with(card_element("100"))
            .with(card_element("400"))
    };
    let page = FixturePage::new(vec![
        results().with(ElementSnapshot::fixture("apply", "button").with_id("jobs-apply-button")),
        FixtureFrame::new().with(
            ElementSnapshot::fixture("submit", "button").with_aria("Submit application"),
        ),
        FixtureFrame::new()
            .with_text("Your application was sent")
            .with(ElementSnapshot::fixture("close", "button").with_aria("Dismiss")),
        // 关闭弹窗后回到结果页，第二个职位没有投递按钮
        results(),
    ])
    .on_click("apply", FixtureEffect::GoTo(1))
    .on_click("submit", FixtureEffect::GoTo(2))
    .on_click("close", FixtureEffect::GoTo(3));

    let runner = SearchRunner::new(&config).with_source(Box::new(StaticSource { cards }));
    let mut answers = AnswerResolver::new(Vec::new(), ApplicantProfile::default());
    let stats = runner.run(&page, &mut answers).await.unwrap();

    assert_eq!(stats.submitted, 1);
    assert_eq!(stats.no_apply_control, 1);
    assert_eq!(stats.filtered, 2);
    assert_eq!(stats.duplicates, 1);
    assert_eq!(stats.pages, 2);
    assert!(stats.session_lost.is_none());

    let records = ledger.read_all().unwrap();
    assert_eq!(records.len(), 3);
    let applied = records.iter().find(|r| r.external_id == "100").unwrap();
    assert!(applied.attempted && applied.submitted);
    let no_button = records.iter().find(|r| r.external_id == "400").unwrap();
    assert!(!no_button.attempted && !no_button.submitted);
    // 被筛除的职位不写记录
    assert!(records.iter().all(|r| r.external_id != "200"));
}

#[tokio::test]
async fn test_session_loss_ends_run_with_partial_record() {
    let dir = tempfile::tempdir().unwrap();
    let ledger_path = dir.path().join("output.csv");
    let config = config(&ledger_path);

    let cards = vec![
        job_card("100", "Data Analyst", "Acme"),
        job_card("101", "Data Analyst", "Globex"),
    ];
    let page = FixturePage::new(vec![FixtureFrame::new()
        .with(card_element("100"))
        .with(card_element("101"))
        .with(ElementSnapshot::fixture("apply", "button").with_id("jobs-apply-button"))])
    .on_click("apply", FixtureEffect::Crash);

    let runner = SearchRunner::new(&config).with_source(Box::new(StaticSource { cards }));
    let mut answers = AnswerResolver::new(Vec::new(), ApplicantProfile::default());
    let stats = runner.run(&page, &mut answers).await.unwrap();

    assert_eq!(stats.failed, 1);
    assert!(stats.session_lost.is_some());

    let records = ApplicationLedger::new(&ledger_path).read_all().unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].attempted);
    assert!(!records[0].submitted);
}

#[tokio::test]
async fn test_ledger_write_failure_does_not_end_run() {
    let dir = tempfile::tempdir().unwrap();
    // 父目录不存在，每次追加都会失败
    let config = config(&dir.path().join("missing").join("output.csv"));

    let cards = vec![
        job_card("100", "Data Analyst", "Acme"),
        job_card("101", "Data Analyst", "Globex"),
    ];
    // 两个职位都没有投递按钮
    let page = FixturePage::new(vec![FixtureFrame::new()
        .with(card_element("100"))
        .with(card_element("101"))]);

    let runner = SearchRunner::new(&config).with_source(Box::new(StaticSource { cards }));
    let mut answers = AnswerResolver::new(Vec::new(), ApplicantProfile::default());
    let stats = runner.run(&page, &mut answers).await.unwrap();

    assert_eq!(stats.no_apply_control, 2);
    assert_eq!(stats.ledger_write_failures, 2);
    assert!(stats.session_lost.is_none());
    let clicks = page.log().clicks;
    assert!(clicks.contains(&"card-100".to_string()));
    assert!(clicks.contains(&"card-101".to_string()));
}

#[tokio::test]
async fn test_exhausted_budget_skips_search() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir.path().join("output.csv"));
    let page = FixturePage::new(vec![FixtureFrame::new()]);

    let runner = SearchRunner::new(&config)
        .with_source(Box::new(StaticSource {
            cards: vec![job_card("100", "Data Analyst", "Acme")],
        }))
        .with_budget(Duration::ZERO);
    let mut answers = AnswerResolver::new(Vec::new(), ApplicantProfile::default());
    let stats = runner.run(&page, &mut answers).await.unwrap();

    assert_eq!(stats.pages, 0);
    assert_eq!(stats.processed(), 0);
    assert!(page.log().clicks.is_empty());
}

#[tokio::test]
async fn test_combos_visited_in_given_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(&dir.path().join("output.csv"));
    config.locations = vec!["Remote".to_string(), "Berlin".to_string()];
    let page = FixturePage::new(vec![FixtureFrame::new()]);

    let runner = SearchRunner::new(&config)
        .with_source(Box::new(easy_apply::orchestrator::LinkedInSearch::new(&config)))
        .with_combos(vec![
            ("Data Analyst".to_string(), "Berlin".to_string()),
            ("Data Analyst".to_string(), "Remote".to_string()),
        ]);
    let mut answers = AnswerResolver::new(Vec::new(), ApplicantProfile::default());
    let stats = runner.run(&page, &mut answers).await.unwrap();

    // 每个组合一页空结果
    assert_eq!(stats.pages, 2);
    let navigations = page.log().navigations;
    assert!(navigations[0].contains("location=Berlin"));
    assert!(navigations[1].contains("location=Remote"));
}
