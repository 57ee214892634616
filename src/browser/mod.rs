//! 浏览器会话
//!
//! 两种方式获得页面：连接到已登录的浏览器（默认），或自行启动一个。

pub mod connection;
pub mod launch;

use anyhow::Result;
use chromiumoxide::{Browser, Page};

use crate::config::BrowserSettings;

pub use connection::connect_to_browser_and_page;
pub use launch::launch_browser;

/// 按配置打开浏览器会话，页面停在职位搜索页
pub async fn open_session(settings: &BrowserSettings) -> Result<(Browser, Page)> {
    if settings.launch {
        launch_browser(settings, &settings.search_base_url).await
    } else {
        connect_to_browser_and_page(settings.debug_port, &settings.search_base_url).await
    }
}
