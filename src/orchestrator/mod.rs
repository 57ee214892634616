//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责搜索调度和资源管理，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 管理应用生命周期（初始化、运行、收尾）
//! - 管理浏览器资源（Browser、JsExecutor）
//! - 装配问答规则、答案解析器和人工兜底
//! - 输出全局统计信息
//!
//! ### `search_runner` - 搜索循环
//! - 打乱并遍历"职位 × 地点"组合
//! - 检查全局搜索时长
//! - 去重、黑名单与相关度筛选
//! - 逐个调用 ApplicationFlow 并写入投递记录
//!
//! ### `candidate_source` - 候选职位来源
//! - 构造搜索地址、翻页
//! - 解析职位卡片
//!
//! ## 层次关系
//!
//! ```text
//! app (持有 Browser / JsExecutor)
//!     ↓
//! search_runner (处理 Vec<JobCandidate>)
//!     ↓
//! workflow::ApplicationFlow (处理单个职位)
//!     ↓
//! services (能力层：定位 / 评分 / 答题 / 记录)
//!     ↓
//! infrastructure (基础设施：PageDriver)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：app 管资源，search_runner 管调度
//! 2. **资源隔离**：只有编排层持有 Browser 和 JsExecutor
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure
//! 4. **严格串行**：不并发投递，页面在一次投递期间独占

pub mod app;
pub mod candidate_source;
pub mod search_runner;

// 重新导出主要类型
pub use app::{build_answer_resolver, App};
pub use candidate_source::{
    parse_job_card, CandidateSource, JobCard, LinkedInSearch, SearchQuery, JOB_CARD_SELECTOR,
    RESULTS_PER_PAGE,
};
pub use search_runner::{shuffled_combos, RunStats, SearchRunner};
