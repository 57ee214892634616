//! 弹窗清理
//!
//! 每次投递结束后无条件调用。依次尝试：确认放弃按钮、关闭按钮、Escape；
//! 关闭后再检查一次嵌套的确认放弃对话框。从不返回错误。

use tracing::debug;

use crate::config::TimingSettings;
use crate::infrastructure::PageDriver;
use crate::services::{Control, ElementResolver, Resolution, ResolveContext};

/// 关闭当前打开的投递弹窗，返回是否关闭了任何东西
pub async fn dismiss_open_modal(
    page: &dyn PageDriver,
    resolver: &ElementResolver,
    timing: &TimingSettings,
) -> bool {
    let mut dismissed = click_if_present(page, resolver, Control::DiscardConfirm, timing).await;

    if click_if_present(page, resolver, Control::Dismiss, timing).await {
        debug!("已关闭投递弹窗");
        confirm_nested_discard(page, resolver, timing).await;
        return true;
    }

    match page.press_escape().await {
        Ok(()) => {
            debug!("已发送 Escape");
            tokio::time::sleep(timing.settle()).await;
            if confirm_nested_discard(page, resolver, timing).await {
                dismissed = true;
            }
        }
        Err(e) => debug!("发送 Escape 失败: {}", e),
    }

    if !dismissed {
        debug!("没有需要关闭的弹窗");
    }
    dismissed
}

async fn confirm_nested_discard(
    page: &dyn PageDriver,
    resolver: &ElementResolver,
    timing: &TimingSettings,
) -> bool {
    let clicked = click_if_present(page, resolver, Control::DiscardConfirm, timing).await;
    if clicked {
        debug!("已确认放弃嵌套对话框");
    }
    clicked
}

async fn click_if_present(
    page: &dyn PageDriver,
    resolver: &ElementResolver,
    control: Control,
    timing: &TimingSettings,
) -> bool {
    let element = match resolver
        .resolve(control, page, &ResolveContext::default())
        .await
    {
        Resolution::Found(element) => element,
        Resolution::NotFound => return false,
        Resolution::Error(reason) => {
            debug!("定位 {} 失败: {}", control, reason);
            return false;
        }
    };

    match page.click(&element.handle).await {
        Ok(()) => {
            tokio::time::sleep(timing.settle()).await;
            true
        }
        Err(e) => {
            debug!("点击 {} 失败: {}", control, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{ElementSnapshot, FixtureEffect, FixtureFrame, FixturePage};

    fn dismiss_button() -> ElementSnapshot {
        ElementSnapshot::fixture("close", "button").with_aria("Dismiss")
    }

    fn discard_button() -> ElementSnapshot {
        ElementSnapshot::fixture("discard", "button")
            .with_attr("data-test-dialog-primary-btn", "")
            .with_text("Discard")
    }

    #[tokio::test]
    async fn test_dismiss_then_nested_confirm() {
        let page = FixturePage::new(vec![
            FixtureFrame::new().with(dismiss_button()),
            FixtureFrame::new().with(discard_button()),
            FixtureFrame::new(),
        ])
        .on_click("close", FixtureEffect::GoTo(1))
        .on_click("discard", FixtureEffect::GoTo(2));

        let resolver = ElementResolver::with_defaults();
        assert!(dismiss_open_modal(&page, &resolver, &TimingSettings::immediate()).await);
        assert_eq!(page.log().clicks, vec!["close", "discard"]);
        assert_eq!(page.log().escapes, 0);
    }

    #[tokio::test]
    async fn test_escape_fallback_then_confirm() {
        let page = FixturePage::new(vec![
            FixtureFrame::new(),
            FixtureFrame::new().with(discard_button()),
            FixtureFrame::new(),
        ])
        .on_escape(FixtureEffect::GoTo(1))
        .on_click("discard", FixtureEffect::GoTo(2));

        let resolver = ElementResolver::with_defaults();
        assert!(dismiss_open_modal(&page, &resolver, &TimingSettings::immediate()).await);
        assert_eq!(page.log().escapes, 1);
        assert_eq!(page.log().clicks, vec!["discard"]);
    }

    #[tokio::test]
    async fn test_nothing_open() {
        let page = FixturePage::new(vec![FixtureFrame::new()]);
        let resolver = ElementResolver::with_defaults();
        assert!(!dismiss_open_modal(&page, &resolver, &TimingSettings::immediate()).await);
        // 可重复调用
        assert!(!dismiss_open_modal(&page, &resolver, &TimingSettings::immediate()).await);
    }

    #[tokio::test]
    async fn test_never_raises_on_dead_page() {
        let page = FixturePage::new(vec![FixtureFrame::new().with(dismiss_button())])
            .on_click("close", FixtureEffect::Crash);
        let resolver = ElementResolver::with_defaults();
        // 点击关闭后页面失联，后续步骤的错误被吞掉
        assert!(dismiss_open_modal(&page, &resolver, &TimingSettings::immediate()).await);

        assert!(!dismiss_open_modal(&page, &resolver, &TimingSettings::immediate()).await);
    }
}
