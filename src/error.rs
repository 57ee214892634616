use std::fmt;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 会话错误（页面不可用，终止整个运行）
    #[error("会话错误: {0}")]
    Session(#[from] SessionError),
}

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed { port: u16, source: BoxedSource },
    /// 启动浏览器失败
    #[error("启动浏览器失败: {source}")]
    LaunchFailed { source: BoxedSource },
    /// 浏览器配置失败
    #[error("浏览器配置失败: {message}")]
    ConfigurationFailed { message: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed { path: String, source: BoxedSource },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed { path: String, source: BoxedSource },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed { path: String, source: BoxedSource },
    /// CSV 读写失败
    #[error("CSV处理失败 ({path}): {source}")]
    CsvFailed { path: String, source: BoxedSource },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 必填字段为空
    #[error("配置项 {field} 不能为空")]
    MissingField { field: String },
    /// 字段取值非法
    #[error("配置项 {field} 取值非法: {reason}")]
    InvalidValue { field: String, reason: String },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

/// 会话错误
#[derive(Debug, Error)]
pub enum SessionError {
    /// 页面无响应
    #[error("页面已不可用: {reason}")]
    PageUnreachable { reason: String },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建浏览器连接错误
    pub fn browser_connection_failed(
        port: u16,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Browser(BrowserError::ConnectionFailed {
            port,
            source: Box::new(source),
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建 CSV 错误
    pub fn csv_failed(path: impl Into<String>, source: csv::Error) -> Self {
        AppError::File(FileError::CsvFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建会话失效错误
    pub fn page_unreachable(reason: impl Into<String>) -> Self {
        AppError::Session(SessionError::PageUnreachable {
            reason: reason.into(),
        })
    }
}

// ========== 单次投递的故障分类 ==========

/// 单次投递过程中可能出现的故障
///
/// 除 `SessionFault` 外都只影响当前职位，由状态机边界收敛为一条记录。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyFault {
    /// 所有定位策略都未命中
    ElementNotFound { control: String },
    /// 附件未配置或文件不存在
    UploadFailure { reason: String },
    /// 提交后出现行内校验错误
    FormValidationError,
    /// 用户在追问时选择放弃
    UserDiscard,
    /// 页面或会话不可用
    SessionFault { reason: String },
    /// 问题无法回答
    Unanswerable { question: String },
    /// 向导步骤数超过上限仍未结束
    StepLimit { steps: usize },
}

impl fmt::Display for ApplyFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyFault::ElementNotFound { control } => write!(f, "未找到控件: {}", control),
            ApplyFault::UploadFailure { reason } => write!(f, "附件上传失败: {}", reason),
            ApplyFault::FormValidationError => write!(f, "表单校验未通过"),
            ApplyFault::UserDiscard => write!(f, "用户放弃了本次投递"),
            ApplyFault::SessionFault { reason } => write!(f, "会话故障: {}", reason),
            ApplyFault::Unanswerable { question } => write!(f, "无法回答的问题: {}", question),
            ApplyFault::StepLimit { steps } => write!(f, "向导推进 {} 步后仍未结束", steps),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_error_display() {
        let err: AppError = ConfigError::MissingField {
            field: "positions".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "配置错误: 配置项 positions 不能为空");
    }

    #[test]
    fn test_apply_fault_display() {
        let fault = ApplyFault::ElementNotFound {
            control: "submit".to_string(),
        };
        assert_eq!(fault.to_string(), "未找到控件: submit");
    }
}
