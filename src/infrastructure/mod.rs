//! 基础设施层（Infrastructure Layer）
//!
//! 持有稀缺资源（Page），只暴露能力。
//!
//! - `page_driver` - 页面能力接口与快照类型
//! - `js_executor` - 唯一的 page owner，通过 JS 实现页面能力
//! - `fixture_page` - 脚本化的内存页面，用于无浏览器测试

pub mod fixture_page;
pub mod js_executor;
pub mod page_driver;

pub use fixture_page::{FixtureEffect, FixtureFrame, FixtureLog, FixturePage};
pub use js_executor::JsExecutor;
pub use page_driver::{
    ElementHandle, ElementSnapshot, FieldKind, FillOutcome, FormSection, PageDriver,
};
