use easy_apply::browser::connect_to_browser_and_page;
use easy_apply::config::Config;
use easy_apply::infrastructure::{JsExecutor, PageDriver};
use easy_apply::orchestrator::{CandidateSource, LinkedInSearch, SearchQuery};
use easy_apply::utils::logging;

#[tokio::test]
#[ignore] // 默认忽略，需要已登录的浏览器：cargo test -- --ignored
async fn test_browser_connection() {
    logging::init();

    let config = Config::from_env().expect("加载配置失败");

    let result =
        connect_to_browser_and_page(config.browser.debug_port, &config.browser.search_base_url)
            .await;

    assert!(result.is_ok(), "应该能够成功连接浏览器");
}

#[tokio::test]
#[ignore]
async fn test_first_results_page_has_cards() {
    logging::init();

    let config = Config::from_env().expect("加载配置失败");
    let (_browser, page) =
        connect_to_browser_and_page(config.browser.debug_port, &config.browser.search_base_url)
            .await
            .expect("连接浏览器失败");
    let executor = JsExecutor::new(page);
    executor.ping().await.expect("页面无响应");

    let search = LinkedInSearch::new(&config);
    let query = SearchQuery::first_page(config.positions[0].as_str(), config.locations[0].as_str());
    let cards = search.fetch(&executor, &query).await.expect("加载结果页失败");

    assert!(!cards.is_empty(), "第一页应该有职位卡片");
}
