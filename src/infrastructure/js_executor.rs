//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS"以及 `PageDriver` 能力

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::debug;

use super::page_driver::{ElementHandle, ElementSnapshot, FillOutcome, FormSection, PageDriver};

/// 元素标记属性，查询时写入，点击/上传时据此找回元素
///
/// 这是查询唯一会对页面做的写入：属性不可见、重复写入结果不变，
/// 不触发点击、输入或焦点变化。
const HANDLE_ATTR: &str = "data-apply-handle";

/// 表单分组的选择器
pub const FORM_SECTION_SELECTOR: &str = ".jobs-easy-apply-form-section__grouping";

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() 能力
/// - 实现 `PageDriver`，不认识职位、问题或向导流程
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    fn handle_selector(handle: &ElementHandle) -> String {
        format!("[{}=\"{}\"]", HANDLE_ATTR, handle.as_str())
    }
}

#[async_trait]
impl PageDriver for JsExecutor {
    async fn navigate(&self, url: &str) -> Result<()> {
        debug!("导航到: {}", url);
        self.page
            .goto(url)
            .await
            .with_context(|| format!("导航到 {} 失败", url))?;
        Ok(())
    }

    async fn query(&self, css: &str) -> Result<Vec<ElementSnapshot>> {
        let js_code = format!(
            r#"
            (() => {{
                const handleAttr = '{attr}';
                let seq = window.__applyHandleSeq || 0;
                const out = [];
                for (const el of document.querySelectorAll({css})) {{
                    if (!el.getAttribute(handleAttr)) {{
                        seq += 1;
                        el.setAttribute(handleAttr, String(seq));
                    }}
                    const style = window.getComputedStyle(el);
                    const rect = el.getBoundingClientRect();
                    const attrs = {{}};
                    for (const a of el.attributes) {{ attrs[a.name] = a.value; }}
                    out.push({{
                        handle: el.getAttribute(handleAttr),
                        tag: el.tagName.toLowerCase(),
                        id: el.id || '',
                        classes: Array.from(el.classList),
                        name: el.getAttribute('name') || '',
                        inputType: el.getAttribute('type') || '',
                        ariaLabel: el.getAttribute('aria-label') || '',
                        text: (el.innerText || el.textContent || '').trim(),
                        attrs,
                        visible: style.display !== 'none'
                            && style.visibility !== 'hidden'
                            && rect.width > 0 && rect.height > 0,
                        enabled: !el.disabled && el.getAttribute('aria-disabled') !== 'true'
                    }});
                }}
                window.__applyHandleSeq = seq;
                return out;
            }})()
            "#,
            attr = HANDLE_ATTR,
            css = serde_json::to_string(css)?,
        );
        self.eval_as(js_code).await
    }

    async fn click(&self, handle: &ElementHandle) -> Result<()> {
        let element = self
            .page
            .find_element(Self::handle_selector(handle))
            .await
            .with_context(|| format!("元素 {} 已不存在", handle))?;
        element.click().await?;
        Ok(())
    }

    async fn upload_file(&self, handle: &ElementHandle, path: &Path) -> Result<()> {
        let element = self
            .page
            .find_element(Self::handle_selector(handle))
            .await
            .with_context(|| format!("上传控件 {} 已不存在", handle))?;
        let params = SetFileInputFilesParams::builder()
            .file(path.to_string_lossy().to_string())
            .backend_node_id(element.backend_node_id)
            .build()
            .map_err(|e| anyhow::anyhow!("构造上传参数失败: {}", e))?;
        self.page.execute(params).await?;
        Ok(())
    }

    async fn page_text(&self) -> Result<String> {
        self.eval_as("document.body ? document.body.innerText : ''")
            .await
    }

    async fn press_escape(&self) -> Result<()> {
        let body = self.page.find_element("body").await?;
        body.press_key("Escape").await?;
        Ok(())
    }

    async fn form_sections(&self) -> Result<Vec<FormSection>> {
        let js_code = format!(
            r#"
            (() => {{
                const handleAttr = '{attr}';
                let seq = window.__applyHandleSeq || 0;
                const out = [];
                for (const el of document.querySelectorAll({css})) {{
                    if (!el.getAttribute(handleAttr)) {{
                        seq += 1;
                        el.setAttribute(handleAttr, String(seq));
                    }}
                    const inputs = Array.from(el.querySelectorAll('input, textarea, select'));
                    const textInput = el.querySelector(
                        "input[type='text'], input[type='tel'], input[type='email'], input[type='number'], input:not([type])");
                    let kind = 'unknown';
                    if (el.querySelector("button[aria-haspopup='listbox']")) kind = 'dropdown';
                    else if (el.querySelector("input[type='radio']")) kind = 'radio';
                    else if (el.querySelector('select')) kind = 'select';
                    else if (textInput) kind = 'text';
                    else if (el.querySelector('textarea')) kind = 'text_area';
                    const valued = inputs.some(i => i.tagName !== 'SELECT' &&
                        ((i.type === 'radio' || i.type === 'checkbox') ? i.checked : !!i.value));
                    const select = el.querySelector('select');
                    const selected = select && select.selectedIndex >= 0
                        ? (select.options[select.selectedIndex].text || '').trim()
                        : null;
                    out.push({{
                        handle: el.getAttribute(handleAttr),
                        text: (el.innerText || '').trim(),
                        labelTexts: Array.from(el.querySelectorAll('label')).map(l => (l.innerText || '').trim()),
                        hasRequiredInput: inputs.some(i =>
                            i.hasAttribute('required') || i.getAttribute('aria-required') === 'true'),
                        kind,
                        hasValue: valued,
                        selectedOption: selected
                    }});
                }}
                window.__applyHandleSeq = seq;
                return out;
            }})()
            "#,
            attr = HANDLE_ATTR,
            css = serde_json::to_string(FORM_SECTION_SELECTOR)?,
        );
        self.eval_as(js_code).await
    }

    async fn fill_section(&self, section: &FormSection, answer: &str) -> Result<FillOutcome> {
        let js_code = format!(
            r#"
            (async () => {{
                const section = document.querySelector({selector});
                if (!section) return 'no_input';
                const answer = {answer};
                const wanted = answer.toLowerCase();
                const sleep = ms => new Promise(r => setTimeout(r, ms));
                const setValue = (input, value) => {{
                    const proto = Object.getPrototypeOf(input);
                    const desc = Object.getOwnPropertyDescriptor(proto, 'value');
                    if (desc && desc.set) desc.set.call(input, value); else input.value = value;
                    input.dispatchEvent(new Event('input', {{ bubbles: true }}));
                    input.dispatchEvent(new Event('change', {{ bubbles: true }}));
                }};

                const trigger = section.querySelector("button[aria-haspopup='listbox']");
                if (trigger) {{
                    trigger.click();
                    await sleep(300);
                    const items = Array.from(document.querySelectorAll('li.artdeco-dropdown__item'));
                    const item = items.find(li => (li.innerText || '').toLowerCase().includes(wanted));
                    if (!item) return 'no_matching_option';
                    item.click();
                    return 'filled';
                }}

                const radios = Array.from(section.querySelectorAll("input[type='radio']"));
                if (radios.length > 0) {{
                    for (const radio of radios) {{
                        let label = radio.nextElementSibling;
                        if (!label || label.tagName !== 'LABEL') {{
                            label = radio.id ? section.querySelector(`label[for="${{radio.id}}"]`) : null;
                        }}
                        if (label && (label.innerText || '').toLowerCase().includes(wanted)) {{
                            label.click();
                            return 'filled';
                        }}
                    }}
                    return 'no_matching_option';
                }}

                const select = section.querySelector('select');
                if (select) {{
                    const option = Array.from(select.options)
                        .find(o => (o.text || '').toLowerCase().includes(wanted));
                    if (!option) return 'no_matching_option';
                    select.value = option.value;
                    select.dispatchEvent(new Event('change', {{ bubbles: true }}));
                    return 'filled';
                }}

                const input = section.querySelector(
                    "input[type='text'], input[type='tel'], input[type='email'], input[type='number'], input:not([type])")
                    || section.querySelector('textarea');
                if (input) {{
                    setValue(input, answer);
                    return 'filled';
                }}
                return 'no_input';
            }})()
            "#,
            selector = serde_json::to_string(&Self::handle_selector(&section.handle))?,
            answer = serde_json::to_string(answer)?,
        );

        let outcome: String = self.eval_as(js_code).await?;
        Ok(match outcome.as_str() {
            "filled" => FillOutcome::Filled,
            "no_matching_option" => FillOutcome::NoMatchingOption,
            _ => FillOutcome::NoInput,
        })
    }

    async fn scroll_results(&self) -> Result<()> {
        let js_code = r#"
            (async () => {
                const sleep = ms => new Promise(r => setTimeout(r, ms));
                for (let y = 0; y < 4000; y += 500) {
                    window.scrollTo(0, y);
                    await sleep(100);
                }
                const list = document.querySelector('.jobs-search-results-list');
                if (list) {
                    for (let y = 300; y < 3000; y += 100) {
                        list.scrollTo(0, y);
                        await sleep(20);
                    }
                }
                window.scrollTo(0, 0);
                return true;
            })()
        "#;
        self.eval(js_code).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.eval("1").await?;
        Ok(())
    }
}
