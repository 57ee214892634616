//! # Easy Apply
//!
//! 一个用于自动投递快速申请职位的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `PageDriver` - 页面能力接口（查询、点击、上传、填写）
//! - `JsExecutor` - 唯一的 page owner，通过 JS 实现 `PageDriver`
//! - `FixturePage` - 脚本化的内存页面，用于无浏览器测试
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，每个能力只处理一件事
//! - `ElementResolver` - 按策略链定位逻辑控件
//! - `RelevanceScorer` - 职位黑名单与相关度评分
//! - `AnswerResolver` - 表单问题的分级解析（规则 → 模糊 → 启发式 → 是否题 → 人工）
//! - `ApplicationLedger` / `UnansweredLedger` - 只追加的记录文件
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个职位"的完整投递流程
//! - `ApplicationCtx` - 上下文封装（序号 + 职位 ID）
//! - `WizardState` - 投递向导状态机
//! - `ApplicationFlow` - 流程编排（打开 → 填写 → 提交 / 恢复 → 清理弹窗）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 应用入口，管理浏览器资源
//! - `orchestrator/search_runner` - 搜索循环，去重、筛选并逐个投递
//! - `orchestrator/candidate_source` - 搜索结果页与职位卡片解析
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::open_session;
pub use config::Config;
pub use error::{AppError, AppResult, ApplyFault};
pub use infrastructure::{FixturePage, JsExecutor, PageDriver};
pub use models::{AnswerRule, ApplicationRecord, JobCandidate};
pub use orchestrator::{App, RunStats, SearchRunner};
pub use services::{AnswerResolver, ElementResolver, RelevanceScorer};
pub use workflow::{ApplicationCtx, ApplicationFlow, ApplicationOutcome, ApplicationReport};
