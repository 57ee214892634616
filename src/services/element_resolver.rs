//! 控件定位 - 业务能力层
//!
//! 每个逻辑控件对应一条有序的定位策略链，依次尝试，第一个命中即返回。
//! 策略之间互不依赖，且只读页面，可以反复调用。
//!
//! 命中的条件不只是"存在"：按策略声明的要求，元素还必须可见/可用，
//! 存在但隐藏或禁用的元素视为未命中。

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use tracing::debug;

use crate::config::TimingSettings;
use crate::infrastructure::{ElementSnapshot, PageDriver};

use super::controls::{default_registry, Control};

/// 定位结果
#[derive(Debug, Clone)]
pub enum Resolution {
    Found(ElementSnapshot),
    NotFound,
    /// 页面调用本身失败
    Error(String),
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }

    /// 转为 `Option`，页面错误变为 `Err`
    pub fn into_result(self) -> anyhow::Result<Option<ElementSnapshot>> {
        match self {
            Resolution::Found(element) => Ok(Some(element)),
            Resolution::NotFound => Ok(None),
            Resolution::Error(reason) => Err(anyhow::anyhow!(reason)),
        }
    }
}

/// 命中所需的可交互程度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interactability {
    /// 可见且可用（按钮）
    Clickable,
    /// 可见即可（提示、标题）
    Visible,
    /// 存在且可用，允许隐藏（文件输入框）
    Attached,
}

impl Interactability {
    fn admits(self, element: &ElementSnapshot) -> bool {
        match self {
            Interactability::Clickable => element.is_clickable(),
            Interactability::Visible => element.visible,
            Interactability::Attached => element.enabled,
        }
    }
}

/// 定位上下文
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    /// 当前职位 ID，用于排除属于其他职位的按钮
    pub job_id: Option<String>,
}

impl ResolveContext {
    pub fn for_job(job_id: impl Into<String>) -> Self {
        Self {
            job_id: Some(job_id.into()),
        }
    }
}

/// 定位策略
#[async_trait]
pub trait LocatorStrategy: Send + Sync {
    /// 用于日志的描述
    fn describe(&self) -> &str;

    /// 尝试定位，不得修改页面
    async fn locate(&self, page: &dyn PageDriver, ctx: &ResolveContext) -> Resolution;
}

/// 元素属性匹配条件（文本与 aria-label 比较均不区分大小写）
#[derive(Debug, Clone)]
pub enum Matcher {
    Tag(&'static str),
    IdEquals(&'static str),
    IdContains(&'static str),
    HasClass(&'static str),
    ClassContains(&'static str),
    AriaEquals(&'static str),
    AriaContains(&'static str),
    TextEquals(&'static str),
    TextContains(&'static str),
    TextOrAriaContains(&'static str),
    InputType(&'static str),
    NameContains(&'static str),
    AttrPresent(&'static str),
    AttrEquals(&'static str, &'static str),
}

impl Matcher {
    pub fn matches(&self, el: &ElementSnapshot) -> bool {
        match self {
            Matcher::Tag(tag) => el.tag.eq_ignore_ascii_case(tag),
            Matcher::IdEquals(id) => el.id == *id,
            Matcher::IdContains(part) => el.id.contains(part),
            Matcher::HasClass(class) => el.has_class(class),
            Matcher::ClassContains(part) => el.classes.iter().any(|c| c.contains(part)),
            Matcher::AriaEquals(label) => el.aria_label == *label,
            Matcher::AriaContains(part) => contains_ci(&el.aria_label, part),
            Matcher::TextEquals(text) => el.text.trim() == *text,
            Matcher::TextContains(part) => contains_ci(&el.text, part),
            Matcher::TextOrAriaContains(part) => {
                contains_ci(&el.text, part) || contains_ci(&el.aria_label, part)
            }
            Matcher::InputType(kind) => el.input_type.eq_ignore_ascii_case(kind),
            Matcher::NameContains(part) => el.name.contains(part),
            Matcher::AttrPresent(name) => el.attr(name).is_some(),
            Matcher::AttrEquals(name, value) => el.attr(name) == Some(*value),
        }
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// 基于 CSS 预筛 + 属性匹配的通用策略
///
/// `css` 只用于缩小查询范围，最终以 `matchers` 为准。
#[derive(Debug, Clone)]
pub struct SelectorStrategy {
    label: String,
    css: &'static str,
    matchers: Vec<Matcher>,
    requirement: Interactability,
    check_job_id: bool,
}

impl SelectorStrategy {
    pub fn new(label: impl Into<String>, css: &'static str, matchers: Vec<Matcher>) -> Self {
        Self {
            label: label.into(),
            css,
            matchers,
            requirement: Interactability::Clickable,
            check_job_id: false,
        }
    }

    pub fn requiring(mut self, requirement: Interactability) -> Self {
        self.requirement = requirement;
        self
    }

    /// 元素带有 `data-job-id` 时必须与当前职位一致
    pub fn scoped_to_job(mut self) -> Self {
        self.check_job_id = true;
        self
    }

    pub fn accepts(&self, el: &ElementSnapshot, ctx: &ResolveContext) -> bool {
        if !self.requirement.admits(el) {
            return false;
        }
        if !self.matchers.iter().all(|m| m.matches(el)) {
            return false;
        }
        if self.check_job_id {
            if let (Some(own), Some(wanted)) = (el.attr("data-job-id"), ctx.job_id.as_deref()) {
                if !own.is_empty() && own != wanted {
                    return false;
                }
            }
        }
        true
    }
}

#[async_trait]
impl LocatorStrategy for SelectorStrategy {
    fn describe(&self) -> &str {
        &self.label
    }

    async fn locate(&self, page: &dyn PageDriver, ctx: &ResolveContext) -> Resolution {
        match page.query(self.css).await {
            Ok(elements) => elements
                .into_iter()
                .find(|el| self.accepts(el, ctx))
                .map(Resolution::Found)
                .unwrap_or(Resolution::NotFound),
            Err(e) => Resolution::Error(format!("{}: {}", self.label, e)),
        }
    }
}

/// 控件定位器
pub struct ElementResolver {
    chains: HashMap<Control, Vec<Box<dyn LocatorStrategy>>>,
}

impl ElementResolver {
    /// 空注册表
    pub fn empty() -> Self {
        Self {
            chains: HashMap::new(),
        }
    }

    /// 内置的控件策略表
    pub fn with_defaults() -> Self {
        Self {
            chains: default_registry(),
        }
    }

    /// 替换某个控件的整条策略链
    pub fn set_chain(&mut self, control: Control, chain: Vec<Box<dyn LocatorStrategy>>) {
        self.chains.insert(control, chain);
    }

    /// 在链尾追加策略
    pub fn register(&mut self, control: Control, strategy: Box<dyn LocatorStrategy>) {
        self.chains.entry(control).or_default().push(strategy);
    }

    /// 依次尝试策略链
    ///
    /// 全部策略都报错时返回 `Error`，否则未命中返回 `NotFound`。
    pub async fn resolve(
        &self,
        control: Control,
        page: &dyn PageDriver,
        ctx: &ResolveContext,
    ) -> Resolution {
        let Some(chain) = self.chains.get(&control) else {
            return Resolution::NotFound;
        };

        let mut last_error = None;
        let mut errors = 0;
        for strategy in chain {
            match strategy.locate(page, ctx).await {
                Resolution::Found(element) => {
                    debug!("✓ 控件 {} 由策略 [{}] 定位", control, strategy.describe());
                    return Resolution::Found(element);
                }
                Resolution::NotFound => {}
                Resolution::Error(reason) => {
                    debug!("控件 {} 的策略 [{}] 出错: {}", control, strategy.describe(), reason);
                    errors += 1;
                    last_error = Some(reason);
                }
            }
        }

        match last_error {
            Some(reason) if errors == chain.len() => Resolution::Error(reason),
            _ => Resolution::NotFound,
        }
    }

    /// 在超时内轮询，直到控件可交互；至少尝试一次
    pub async fn wait_for(
        &self,
        control: Control,
        page: &dyn PageDriver,
        ctx: &ResolveContext,
        timing: &TimingSettings,
    ) -> Resolution {
        let deadline = Instant::now() + timing.wait_timeout();
        loop {
            let resolution = self.resolve(control, page, ctx).await;
            match resolution {
                Resolution::NotFound if Instant::now() < deadline => {
                    tokio::time::sleep(timing.poll_interval()).await;
                }
                other => return other,
            }
        }
    }

    /// 控件当前是否存在（页面错误视为 `Err`）
    pub async fn is_present(
        &self,
        control: Control,
        page: &dyn PageDriver,
        ctx: &ResolveContext,
    ) -> anyhow::Result<bool> {
        Ok(self.resolve(control, page, ctx).await.into_result()?.is_some())
    }
}

impl Default for ElementResolver {
    fn default() -> Self {
        Self::with_defaults()
    }
}
