use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, FileError};
use crate::models::answer_rule::{AnswerRule, RawAnswerRule};

#[derive(Debug, Default, Deserialize)]
struct RulesFile {
    #[serde(default)]
    rules: Vec<toml::Value>,
}

/// 解析规则文本，缺少 keywords 或 answer 的条目被跳过
pub fn parse_rules(content: &str) -> Result<Vec<AnswerRule>> {
    let file: RulesFile = toml::from_str(content).context("无法解析问答规则")?;

    let mut rules = Vec::with_capacity(file.rules.len());
    for (index, value) in file.rules.into_iter().enumerate() {
        let parsed = value
            .try_into::<RawAnswerRule>()
            .ok()
            .and_then(RawAnswerRule::into_rule);
        match parsed {
            Some(rule) => rules.push(rule),
            None => tracing::warn!("跳过第 {} 条格式不完整的问答规则", index + 1),
        }
    }
    Ok(rules)
}

/// 从 TOML 文件加载问答规则；文件不存在时返回空列表
pub async fn load_rules(path: &Path) -> Result<Vec<AnswerRule>> {
    if !path.exists() {
        tracing::info!("未找到 {}，将只使用默认回答逻辑", path.display());
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

    let rules = parse_rules(&content).map_err(|e| {
        AppError::File(FileError::TomlParseFailed {
            path: path.display().to_string(),
            source: e.into(),
        })
    })?;
    tracing::info!("已从 {} 加载 {} 条问答规则", path.display(), rules.len());
    Ok(rules)
}

/// 以 `[[rules]]` 条目的形式把新规则追加到文件末尾
pub async fn append_rule(path: &Path, rule: &AnswerRule) -> Result<()> {
    let keywords = toml::Value::Array(
        rule.keywords
            .iter()
            .map(|k| toml::Value::String(k.clone()))
            .collect(),
    );
    let answer = toml::Value::String(rule.answer.clone());
    let body = format!("[[rules]]\nkeywords = {}\nanswer = {}\n", keywords, answer);

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .with_context(|| format!("无法打开问答规则文件: {}", path.display()))?;

    file.write_all(format!("\n# 交互模式中添加\n{}", body).as_bytes())
        .await
        .with_context(|| format!("无法写入问答规则文件: {}", path.display()))?;
    file.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_entries_skipped() {
        let content = r#"
[[rules]]
keywords = ["authorized", "legally"]
answer = "Yes"

[[rules]]
keywords = ["sponsorship"]

[[rules]]
answer = "orphan"

[[rules]]
keywords = ["relocate"]
answer = "No"
"#;
        let rules = parse_rules(content).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].answer, "Yes");
        assert_eq!(rules[1].keywords, vec!["relocate".to_string()]);
    }

    #[test]
    fn test_empty_file_has_no_rules() {
        assert!(parse_rules("").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_appended_rule_is_loadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("questions.toml");
        std::fs::write(&path, "[[rules]]\nkeywords = [\"gpa\"]\nanswer = \"3.8\"\n").unwrap();

        let rule = AnswerRule::new(["hybrid"], "Yes");
        append_rule(&path, &rule).await.unwrap();

        let rules = load_rules(&path).await.unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[1], rule);
    }

    #[tokio::test]
    async fn test_missing_file_yields_empty() {
        let dir = tempfile::tempdir().unwrap();
        let rules = load_rules(&dir.path().join("absent.toml")).await.unwrap();
        assert!(rules.is_empty());
    }
}
