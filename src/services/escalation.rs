//! 人工追问 - 业务能力层
//!
//! 自动回答失败时把问题交给操作者。非交互模式使用 `SkipEscalation`。

use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};
use std::sync::Mutex;

use tracing::{info, warn};

use super::similarity::leading_words;

/// 追问结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscalationReply {
    /// 给出答案；`persist_keywords` 非空时请求保存为新规则
    Answer {
        text: String,
        persist_keywords: Option<Vec<String>>,
    },
    /// 跳过该问题
    Skip,
    /// 放弃整个投递
    Discard,
}

/// 追问端口（同步调用）
pub trait EscalationPort: Send + Sync {
    fn ask(&self, question: &str) -> EscalationReply;
}

/// 始终跳过
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipEscalation;

impl EscalationPort for SkipEscalation {
    fn ask(&self, _question: &str) -> EscalationReply {
        EscalationReply::Skip
    }
}

struct PromptIo<R, W> {
    input: R,
    output: W,
}

/// 基于文本输入输出的追问
///
/// 终端模式下读写标准输入输出，测试中可以换成内存缓冲。
pub struct PromptEscalation<R, W> {
    io: Mutex<PromptIo<R, W>>,
}

/// 终端追问
pub type TerminalEscalation = PromptEscalation<BufReader<Stdin>, Stdout>;

impl TerminalEscalation {
    pub fn stdio() -> Self {
        PromptEscalation::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> PromptEscalation<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            io: Mutex::new(PromptIo { input, output }),
        }
    }

    pub fn into_output(self) -> W {
        match self.io.into_inner() {
            Ok(io) => io.output,
            Err(poisoned) => poisoned.into_inner().output,
        }
    }
}

impl<R: BufRead, W: Write> PromptIo<R, W> {
    /// 输出提示并读取一行；读到 EOF 返回 None
    fn prompt(&mut self, message: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", message)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn converse(&mut self, question: &str) -> io::Result<EscalationReply> {
        let banner = "=".repeat(80);
        writeln!(self.output, "\n{}", banner)?;
        writeln!(self.output, "⚠️  需要人工回答")?;
        writeln!(self.output, "{}", banner)?;
        writeln!(self.output, "\n问题: {}\n", question)?;
        writeln!(self.output, "  直接输入答案后回车")?;
        writeln!(self.output, "  输入 skip 跳过该问题")?;
        writeln!(self.output, "  输入 discard 放弃本次投递")?;

        let Some(reply) = self.prompt("你的答案: ")? else {
            return Ok(EscalationReply::Skip);
        };

        match reply.to_lowercase().as_str() {
            "" | "skip" => return Ok(EscalationReply::Skip),
            "discard" => return Ok(EscalationReply::Discard),
            _ => {}
        }

        let save = self
            .prompt("\n是否保存为规则供以后使用? (y/n): ")?
            .unwrap_or_default();
        if !save.eq_ignore_ascii_case("y") {
            return Ok(EscalationReply::Answer {
                text: reply,
                persist_keywords: None,
            });
        }

        let raw = self
            .prompt("匹配关键词（逗号分隔，直接回车使用问题前三个词）: ")?
            .unwrap_or_default();
        let keywords = parse_keywords(&raw, question);
        Ok(EscalationReply::Answer {
            text: reply,
            persist_keywords: Some(keywords),
        })
    }
}

fn parse_keywords(raw: &str, question: &str) -> Vec<String> {
    let keywords: Vec<String> = raw
        .split(',')
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.is_empty() {
        vec![leading_words(question, 3)]
    } else {
        keywords
    }
}

impl<R, W> EscalationPort for PromptEscalation<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    fn ask(&self, question: &str) -> EscalationReply {
        let mut io = match self.io.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match io.converse(question) {
            Ok(reply) => {
                match &reply {
                    EscalationReply::Skip => info!("用户跳过问题: '{}'", question),
                    EscalationReply::Discard => info!("用户因问题放弃投递: '{}'", question),
                    EscalationReply::Answer { text, .. } => {
                        info!("用户回答 '{}': '{}'", question, text)
                    }
                }
                reply
            }
            Err(e) => {
                warn!("读取用户输入失败，跳过该问题: {}", e);
                EscalationReply::Skip
            }
        }
    }
}
