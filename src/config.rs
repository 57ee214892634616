use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::ConfigError;

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 想要投递的职位关键词
    pub positions: Vec<String>,
    /// 搜索地点
    pub locations: Vec<String>,
    /// 手机号（用于自动填写联系方式）
    pub phone_number: String,
    /// 期望薪资
    pub salary: String,
    /// 期望时薪
    pub rate: String,
    /// 工作年限
    pub years_of_experience: u32,
    /// 遇到无法回答的问题时是否询问用户
    pub interactive_mode: bool,
    /// 公司黑名单（大小写不敏感的子串匹配）
    pub blacklist: Vec<String>,
    /// 职位标题黑名单
    pub blacklist_titles: Vec<String>,
    /// 经验等级过滤（1..=6）
    pub experience_level: Vec<u8>,
    /// 附件路径，键为 `Resume` / `Cover Letter`
    pub uploads: HashMap<String, String>,
    /// 投递记录文件
    pub output_filename: String,
    /// 问答规则文件
    pub questions_file: String,
    /// 未回答问题导出文件
    pub unanswered_file: String,
    /// 问答缓存导出文件
    pub qa_export_file: String,
    /// 运行日志文件
    pub output_log_file: String,
    /// 全局搜索时长（分钟）
    pub max_search_minutes: u64,
    /// 去重窗口（天）
    pub dedup_window_days: i64,
    /// 单次投递最多推进的步骤数
    pub max_wizard_steps: usize,
    /// 是否取消勾选"关注公司"
    pub uncheck_follow_company: bool,
    /// 个人主页链接
    pub profile_url: String,
    pub browser: BrowserSettings,
    pub timing: TimingSettings,
}

/// 浏览器配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// 浏览器调试端口（连接已登录的浏览器）
    pub debug_port: u16,
    /// 是否自行启动浏览器而不是连接
    pub launch: bool,
    /// 启动模式下的浏览器可执行文件
    pub executable: Option<String>,
    /// 启动模式下的额外参数
    pub args: Vec<String>,
    /// 职位搜索页地址
    pub search_base_url: String,
}

/// 等待与轮询时长（毫秒）
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    /// 点击、上传等操作后的固定等待
    pub settle_ms: u64,
    /// 控件轮询间隔
    pub poll_interval_ms: u64,
    /// 等待控件可交互的超时
    pub wait_timeout_ms: u64,
    /// 错误恢复时两次检查之间的等待
    pub recheck_pause_ms: u64,
    /// 点开职位卡片后等待详情面板加载
    pub card_open_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            positions: Vec::new(),
            locations: Vec::new(),
            phone_number: String::new(),
            salary: String::new(),
            rate: String::new(),
            years_of_experience: 8,
            interactive_mode: false,
            blacklist: Vec::new(),
            blacklist_titles: Vec::new(),
            experience_level: Vec::new(),
            uploads: HashMap::new(),
            output_filename: "output.csv".to_string(),
            questions_file: "questions.toml".to_string(),
            unanswered_file: "unanswered_questions.toml".to_string(),
            qa_export_file: "qa.csv".to_string(),
            output_log_file: "output.txt".to_string(),
            max_search_minutes: 60,
            dedup_window_days: 2,
            max_wizard_steps: 25,
            uncheck_follow_company: true,
            profile_url: "https://www.linkedin.com".to_string(),
            browser: BrowserSettings::default(),
            timing: TimingSettings::default(),
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            debug_port: 9222,
            launch: false,
            executable: None,
            args: vec![
                "--start-maximized".to_string(),
                "--ignore-certificate-errors".to_string(),
                "--no-sandbox".to_string(),
                "--disable-extensions".to_string(),
            ],
            search_base_url: "https://www.linkedin.com/jobs/search/".to_string(),
        }
    }
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            settle_ms: 1000,
            poll_interval_ms: 250,
            wait_timeout_ms: 3000,
            recheck_pause_ms: 2000,
            card_open_ms: 1500,
        }
    }
}

impl TimingSettings {
    /// 测试用：所有等待为零
    pub fn immediate() -> Self {
        Self {
            settle_ms: 0,
            poll_interval_ms: 0,
            wait_timeout_ms: 0,
            recheck_pause_ms: 0,
            card_open_ms: 0,
        }
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    pub fn recheck_pause(&self) -> Duration {
        Duration::from_millis(self.recheck_pause_ms)
    }

    pub fn card_open(&self) -> Duration {
        Duration::from_millis(self.card_open_ms)
    }
}

impl Config {
    /// 从 TOML 文本解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(|e| {
            // uploads 写成数组时给出明确提示
            if e.to_string().contains("uploads") {
                anyhow::anyhow!(
                    "uploads 应为表格（[uploads] 下写 Resume = \"...\"），而不是数组: {}",
                    e
                )
            } else {
                anyhow::anyhow!(e)
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载配置，然后应用环境变量覆盖
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))?;
        config.apply_env()
    }

    /// 按 `EASY_APPLY_CONFIG` 指定的路径加载（默认 `config.toml`）
    pub fn from_env() -> Result<Self> {
        let path =
            std::env::var("EASY_APPLY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load(path)
    }

    /// 环境变量覆盖部分标量字段
    fn apply_env(mut self) -> Result<Self> {
        if let Some(port) = env_parse::<u16>("BROWSER_DEBUG_PORT", "u16")? {
            self.browser.debug_port = port;
        }
        if let Some(interactive) = env_parse::<bool>("INTERACTIVE_MODE", "bool")? {
            self.interactive_mode = interactive;
        }
        if let Some(minutes) = env_parse::<u64>("MAX_SEARCH_MINUTES", "u64")? {
            self.max_search_minutes = minutes;
        }
        if let Ok(file) = std::env::var("OUTPUT_LOG_FILE") {
            self.output_log_file = file;
        }
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.positions.iter().all(|p| p.trim().is_empty()) {
            return Err(ConfigError::MissingField {
                field: "positions".to_string(),
            });
        }
        if self.locations.iter().all(|l| l.trim().is_empty()) {
            return Err(ConfigError::MissingField {
                field: "locations".to_string(),
            });
        }
        if let Some(level) = self.experience_level.iter().find(|l| !(1..=6).contains(*l)) {
            return Err(ConfigError::InvalidValue {
                field: "experience_level".to_string(),
                reason: format!("{} 不在 1..=6 范围内", level),
            });
        }
        Ok(())
    }

    pub fn search_budget(&self) -> Duration {
        Duration::from_secs(self.max_search_minutes * 60)
    }
}

fn env_parse<T: std::str::FromStr>(var_name: &str, expected: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected.to_string(),
            }),
        Err(_) => Ok(None),
    }
}
