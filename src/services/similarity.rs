//! 文本相似度与问题文本规整

use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("静态正则"));

/// 大小写不敏感的归一化编辑距离相似度，取值 [0, 1]
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase())
}

/// 规整表单分组文本：去掉空行、重复的标签行和末尾的 "Required" 标记，合并空白
pub fn normalize_question(raw: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.eq_ignore_ascii_case("required") {
            continue;
        }
        if lines.last() == Some(&line) {
            continue;
        }
        lines.push(line);
    }
    WHITESPACE.replace_all(&lines.join(" "), " ").trim().to_string()
}

/// 问题的前 n 个小写单词，用作关键词建议
pub fn leading_words(question: &str, n: usize) -> String {
    question
        .to_lowercase()
        .split_whitespace()
        .take(n)
        .collect::<Vec<_>>()
        .join(" ")
}
