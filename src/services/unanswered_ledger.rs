//! 未回答问题记录 - 业务能力层
//!
//! 只负责"写 unanswered_questions.toml"能力，不关心流程

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::similarity::leading_words;

const FILE_HEADER: &str = "# 自动回答失败的问题\n\
# 把 TODO 改成合适的关键词和答案后，复制到问答规则文件中即可生效\n";

/// 未回答问题记录
///
/// 职责：
/// - 同一问题在一次运行中只记录一次
/// - 以 `[[rules]]` 骨架的形式追加到文件，便于转为正式规则
pub struct UnansweredLedger {
    path: Option<PathBuf>,
    seen: HashSet<String>,
}

impl UnansweredLedger {
    /// 写入指定文件
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            seen: HashSet::new(),
        }
    }

    /// 只在内存中去重，不写文件
    pub fn in_memory() -> Self {
        Self {
            path: None,
            seen: HashSet::new(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// 本次运行已记录的问题
    pub fn seen(&self) -> &HashSet<String> {
        &self.seen
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// 记录问题；首次出现返回 true
    pub async fn record(&mut self, question: &str) -> Result<bool> {
        if !self.seen.insert(question.to_string()) {
            debug!("问题已记录过，跳过: {}", question);
            return Ok(false);
        }

        let Some(path) = &self.path else {
            return Ok(true);
        };

        let is_new = !path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("无法打开未回答问题文件: {}", path.display()))?;

        if is_new {
            file.write_all(FILE_HEADER.as_bytes())?;
        }
        file.write_all(render_block(question).as_bytes())
            .with_context(|| format!("无法写入未回答问题文件: {}", path.display()))?;

        info!("已将未回答的问题保存到 {}", path.display());
        Ok(true)
    }
}

fn render_block(question: &str) -> String {
    let flattened = question.replace(['\n', '\r'], " ");
    format!(
        "\n# 问题: {}\n[[rules]]\nkeywords = [\"TODO\"]  # 建议: {}...\nanswer = \"TODO\"\n",
        flattened,
        leading_words(&flattened, 5)
    )
}
