//! 问答缓存：问题 → 最近一次使用的答案，仅用于导出与观察

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

#[derive(Debug, Default, Clone)]
pub struct AnswerCache {
    answers: HashMap<String, String>,
    /// 问题首次出现的顺序
    order: Vec<String>,
}

impl AnswerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, question: &str, answer: &str) {
        if self
            .answers
            .insert(question.to_string(), answer.to_string())
            .is_none()
        {
            self.order.push(question.to_string());
        }
    }

    pub fn get(&self, question: &str) -> Option<&str> {
        self.answers.get(question).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// 导出为 `Question,Answer` 两列 CSV
    pub fn export_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("无法创建问答导出文件: {}", path.display()))?;
        writer.write_record(["Question", "Answer"])?;
        for question in &self.order {
            let answer = self.answers.get(question).map(|s| s.as_str()).unwrap_or("");
            writer.write_record([question.as_str(), answer])?;
        }
        writer.flush()?;
        info!("已导出 {} 条问答到 {}", self.order.len(), path.display());
        Ok(())
    }
}
