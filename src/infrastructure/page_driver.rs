//! 页面能力接口 - 基础设施层
//!
//! 状态机、定位器、候选来源都只通过 `PageDriver` 操作页面，
//! 具体实现是持有 Page 的 `JsExecutor`，测试中是 `FixturePage`。

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// 页面元素句柄（页面内唯一标记）
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementHandle(pub String);

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 查询时刻的元素快照
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementSnapshot {
    pub handle: ElementHandle,
    pub tag: String,
    pub id: String,
    pub classes: Vec<String>,
    pub name: String,
    pub input_type: String,
    pub aria_label: String,
    pub text: String,
    pub attrs: HashMap<String, String>,
    pub visible: bool,
    pub enabled: bool,
}

impl ElementSnapshot {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(|s| s.as_str())
    }

    /// 可见且可用
    pub fn is_clickable(&self) -> bool {
        self.visible && self.enabled
    }
}

/// 表单字段类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Dropdown,
    Radio,
    Select,
    Text,
    TextArea,
    #[default]
    Unknown,
}

/// 投递向导中的一个问题分组
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormSection {
    pub handle: ElementHandle,
    /// 分组内可见文本（即问题文本）
    pub text: String,
    pub label_texts: Vec<String>,
    /// 任一输入带有 `required` 或 `aria-required="true"`
    pub has_required_input: bool,
    pub kind: FieldKind,
    /// 除下拉框外的输入当前是否已有值
    pub has_value: bool,
    /// 原生下拉框当前选中项的文本
    pub selected_option: Option<String>,
}

impl FormSection {
    /// 判断字段是否必填
    pub fn is_required(&self) -> bool {
        if marks_required(&self.text) || self.has_required_input {
            return true;
        }
        self.label_texts.iter().any(|label| marks_required(label))
    }

    /// 分组是否已经作答，下拉框停在占位选项时视为未作答
    pub fn is_answered(&self) -> bool {
        self.has_value
            || self
                .selected_option
                .as_deref()
                .is_some_and(|option| !is_placeholder_option(option))
    }
}

/// `Select an option`、`-- Choose --` 之类的占位选项
fn is_placeholder_option(text: &str) -> bool {
    let text = text.trim().trim_matches('-').trim().to_lowercase();
    text.is_empty() || text.starts_with("select") || text.starts_with("choose")
}

fn marks_required(text: &str) -> bool {
    text.contains('*') || text.to_lowercase().contains("required")
}

/// 填写结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    Filled,
    /// 下拉/单选中没有包含答案的选项
    NoMatchingOption,
    /// 分组中没有可填写的输入
    NoInput,
}

/// 页面能力
///
/// 所有方法都不得阻塞超过实现自身的超时。查询方法不点击、不输入，
/// 唯一允许的写入是实现为找回元素而打的不可见标记。
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// 导航到指定地址
    async fn navigate(&self, url: &str) -> Result<()>;

    /// 按 CSS 选择器查询元素快照
    async fn query(&self, css: &str) -> Result<Vec<ElementSnapshot>>;

    /// 点击元素
    async fn click(&self, handle: &ElementHandle) -> Result<()>;

    /// 向文件输入框设置文件
    async fn upload_file(&self, handle: &ElementHandle, path: &Path) -> Result<()>;

    /// 页面可见文本
    async fn page_text(&self) -> Result<String>;

    /// 发送 Escape 键
    async fn press_escape(&self) -> Result<()>;

    /// 当前步骤的表单分组
    async fn form_sections(&self) -> Result<Vec<FormSection>>;

    /// 按字段类型把答案填入分组
    async fn fill_section(&self, section: &FormSection, answer: &str) -> Result<FillOutcome>;

    /// 滚动搜索结果列表，触发懒加载
    async fn scroll_results(&self) -> Result<()>;

    /// 探测页面是否仍然可用
    async fn ping(&self) -> Result<()>;
}
