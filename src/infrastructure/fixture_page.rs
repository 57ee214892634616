//! 脚本化的内存页面
//!
//! 由若干"帧"组成，每帧是一组控件可见性快照。点击、填写、Escape
//! 可以切换帧，用来在没有浏览器的情况下驱动定位器和投递状态机。

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::{bail, Result};
use async_trait::async_trait;

use super::page_driver::{
    ElementHandle, ElementSnapshot, FieldKind, FillOutcome, FormSection, PageDriver,
};

/// 页面的一帧
#[derive(Debug, Clone, Default)]
pub struct FixtureFrame {
    pub elements: Vec<ElementSnapshot>,
    pub sections: Vec<FormSection>,
    pub text: String,
}

impl FixtureFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, element: ElementSnapshot) -> Self {
        self.elements.push(element);
        self
    }

    pub fn with_section(mut self, section: FormSection) -> Self {
        self.sections.push(section);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }
}

/// 交互触发的效果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureEffect {
    /// 切换到指定帧
    GoTo(usize),
    /// 从当前帧移除被操作的元素
    Remove,
    /// 页面失联，此后所有调用都失败
    Crash,
}

/// 交互记录
#[derive(Debug, Clone, Default)]
pub struct FixtureLog {
    pub clicks: Vec<String>,
    pub uploads: Vec<(String, PathBuf)>,
    /// (问题文本, 答案)
    pub fills: Vec<(String, String)>,
    pub escapes: usize,
    pub queries: usize,
    pub navigations: Vec<String>,
}

#[derive(Debug, Default)]
struct FixtureInner {
    frames: Vec<FixtureFrame>,
    current: usize,
    on_click: HashMap<String, FixtureEffect>,
    on_fill: HashMap<String, FixtureEffect>,
    on_escape: Option<FixtureEffect>,
    on_navigate: Option<FixtureEffect>,
    unreachable: bool,
    log: FixtureLog,
}

/// 内存页面
#[derive(Debug, Default)]
pub struct FixturePage {
    inner: Mutex<FixtureInner>,
}

impl FixturePage {
    pub fn new(frames: Vec<FixtureFrame>) -> Self {
        Self {
            inner: Mutex::new(FixtureInner {
                frames,
                ..Default::default()
            }),
        }
    }

    /// 点击指定句柄时触发效果
    pub fn on_click(self, handle: &str, effect: FixtureEffect) -> Self {
        self.lock().on_click.insert(handle.to_string(), effect);
        self
    }

    /// 填写指定分组时触发效果
    pub fn on_fill(self, section_handle: &str, effect: FixtureEffect) -> Self {
        self.lock().on_fill.insert(section_handle.to_string(), effect);
        self
    }

    pub fn on_escape(self, effect: FixtureEffect) -> Self {
        self.lock().on_escape = Some(effect);
        self
    }

    pub fn on_navigate(self, effect: FixtureEffect) -> Self {
        self.lock().on_navigate = Some(effect);
        self
    }

    pub fn current_frame(&self) -> usize {
        self.lock().current
    }

    pub fn log(&self) -> FixtureLog {
        self.lock().log.clone()
    }

    fn lock(&self) -> MutexGuard<'_, FixtureInner> {
        // 测试代码中不会有线程在持锁时 panic
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl FixtureInner {
    fn frame(&self) -> Option<&FixtureFrame> {
        self.frames.get(self.current)
    }

    fn ensure_reachable(&self) -> Result<()> {
        if self.unreachable {
            bail!("页面已断开");
        }
        Ok(())
    }

    fn apply(&mut self, effect: FixtureEffect, handle: &str) {
        match effect {
            FixtureEffect::GoTo(index) => self.current = index,
            FixtureEffect::Remove => {
                if let Some(frame) = self.frames.get_mut(self.current) {
                    frame.elements.retain(|e| e.handle.as_str() != handle);
                }
            }
            FixtureEffect::Crash => self.unreachable = true,
        }
    }

    fn contains(&self, handle: &ElementHandle) -> bool {
        self.frame()
            .map(|f| f.elements.iter().any(|e| &e.handle == handle))
            .unwrap_or(false)
    }
}

#[async_trait]
impl PageDriver for FixturePage {
    async fn navigate(&self, url: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.ensure_reachable()?;
        inner.log.navigations.push(url.to_string());
        if let Some(effect) = inner.on_navigate {
            inner.apply(effect, "");
        }
        Ok(())
    }

    async fn query(&self, _css: &str) -> Result<Vec<ElementSnapshot>> {
        let mut inner = self.lock();
        inner.ensure_reachable()?;
        inner.log.queries += 1;
        Ok(inner.frame().map(|f| f.elements.clone()).unwrap_or_default())
    }

    async fn click(&self, handle: &ElementHandle) -> Result<()> {
        let mut inner = self.lock();
        inner.ensure_reachable()?;
        if !inner.contains(handle) {
            bail!("元素 {} 已不存在", handle);
        }
        inner.log.clicks.push(handle.as_str().to_string());
        if let Some(effect) = inner.on_click.get(handle.as_str()).copied() {
            inner.apply(effect, handle.as_str());
        }
        Ok(())
    }

    async fn upload_file(&self, handle: &ElementHandle, path: &Path) -> Result<()> {
        let mut inner = self.lock();
        inner.ensure_reachable()?;
        if !inner.contains(handle) {
            bail!("上传控件 {} 已不存在", handle);
        }
        inner
            .log
            .uploads
            .push((handle.as_str().to_string(), path.to_path_buf()));
        Ok(())
    }

    async fn page_text(&self) -> Result<String> {
        let inner = self.lock();
        inner.ensure_reachable()?;
        Ok(inner.frame().map(|f| f.text.clone()).unwrap_or_default())
    }

    async fn press_escape(&self) -> Result<()> {
        let mut inner = self.lock();
        inner.ensure_reachable()?;
        inner.log.escapes += 1;
        if let Some(effect) = inner.on_escape {
            inner.apply(effect, "");
        }
        Ok(())
    }

    async fn form_sections(&self) -> Result<Vec<FormSection>> {
        let inner = self.lock();
        inner.ensure_reachable()?;
        Ok(inner.frame().map(|f| f.sections.clone()).unwrap_or_default())
    }

    async fn fill_section(&self, section: &FormSection, answer: &str) -> Result<FillOutcome> {
        let mut inner = self.lock();
        inner.ensure_reachable()?;
        if section.kind == FieldKind::Unknown {
            return Ok(FillOutcome::NoInput);
        }
        inner
            .log
            .fills
            .push((section.text.clone(), answer.to_string()));
        if let Some(effect) = inner.on_fill.get(section.handle.as_str()).copied() {
            inner.apply(effect, section.handle.as_str());
        }
        Ok(FillOutcome::Filled)
    }

    async fn scroll_results(&self) -> Result<()> {
        self.lock().ensure_reachable()
    }

    async fn ping(&self) -> Result<()> {
        self.lock().ensure_reachable()
    }
}

// ========== 快照构造辅助 ==========

impl ElementSnapshot {
    /// 可见、可用的元素
    pub fn fixture(handle: &str, tag: &str) -> Self {
        Self {
            handle: ElementHandle::new(handle),
            tag: tag.to_string(),
            visible: true,
            enabled: true,
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn with_aria(mut self, label: &str) -> Self {
        self.aria_label = label.to_string();
        self.attrs.insert("aria-label".to_string(), label.to_string());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        match name {
            "type" => self.input_type = value.to_string(),
            "name" => self.name = value.to_string(),
            _ => {}
        }
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

impl FormSection {
    pub fn fixture(handle: &str, text: &str, kind: FieldKind) -> Self {
        Self {
            handle: ElementHandle::new(handle),
            text: text.to_string(),
            kind,
            ..Default::default()
        }
    }

    pub fn required(mut self) -> Self {
        self.has_required_input = true;
        self
    }

    pub fn with_selected(mut self, option: &str) -> Self {
        self.selected_option = Some(option.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_click_switches_frame() {
        let page = FixturePage::new(vec![
            FixtureFrame::new().with(ElementSnapshot::fixture("next", "button")),
            FixtureFrame::new(),
        ])
        .on_click("next", FixtureEffect::GoTo(1));

        page.click(&ElementHandle::new("next")).await.unwrap();
        assert_eq!(page.current_frame(), 1);
        assert!(page.query("button").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_click_missing_element_fails() {
        let page = FixturePage::new(vec![FixtureFrame::new()]);
        assert!(page.click(&ElementHandle::new("ghost")).await.is_err());
    }

    #[tokio::test]
    async fn test_crash_makes_everything_fail() {
        let page = FixturePage::new(vec![
            FixtureFrame::new().with(ElementSnapshot::fixture("boom", "button"))
        ])
        .on_click("boom", FixtureEffect::Crash);

        page.click(&ElementHandle::new("boom")).await.unwrap();
        assert!(page.ping().await.is_err());
        assert!(page.query("button").await.is_err());
    }
}
