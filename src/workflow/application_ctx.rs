//! 投递上下文
//!
//! 封装"我正在投递第几个职位、哪个职位"这一信息

use std::fmt::Display;

use crate::models::JobCandidate;
use crate::services::ResolveContext;

/// 投递上下文
#[derive(Debug, Clone)]
pub struct ApplicationCtx {
    /// 职位ID
    pub job_id: String,

    /// 本次运行中的序号（仅用于日志显示，从1开始）
    pub index: usize,

    pub title: String,
    pub company: String,
}

impl ApplicationCtx {
    pub fn new(candidate: &JobCandidate, index: usize) -> Self {
        Self {
            job_id: candidate.external_id.clone(),
            index,
            title: candidate.title.clone(),
            company: candidate.company.clone(),
        }
    }

    /// 供控件定位使用的上下文
    pub fn resolve_ctx(&self) -> ResolveContext {
        ResolveContext::for_job(self.job_id.clone())
    }
}

impl Display for ApplicationCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[职位 #{} ID#{}]", self.index, self.job_id)
    }
}
