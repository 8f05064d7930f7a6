use thiserror::Error;

/// 应用程序错误类型
///
/// 核心流程只会返回完整的 `ScoreResult` 或者下面的某一种错误，
/// 不存在"算了一半"的结果。
#[derive(Debug, Error)]
pub enum AppError {
    /// 文档获取错误
    #[error("文档获取错误: {0}")]
    Fetch(#[from] FetchError),
    /// 文档结构错误（找不到任何结构锚点）
    #[error("文档结构错误: {0}")]
    MalformedDocument(#[from] MalformedDocumentError),
    /// 无法识别的考试类型
    #[error("考试类型错误: {0}")]
    UnsupportedExamVariant(#[from] UnsupportedExamVariantError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 文档获取失败的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchReason {
    /// 超时
    Timeout,
    /// 文档超过字节上限
    TooLarge { limit: usize },
    /// 文档不存在（HTTP 404 或本地文件不存在）
    NotFound,
    /// 网络请求失败或服务端返回错误状态
    NetworkError,
    /// 本地文件读取失败
    Io,
}

impl std::fmt::Display for FetchReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchReason::Timeout => write!(f, "超时"),
            FetchReason::TooLarge { limit } => write!(f, "超过 {} 字节上限", limit),
            FetchReason::NotFound => write!(f, "不存在"),
            FetchReason::NetworkError => write!(f, "网络错误"),
            FetchReason::Io => write!(f, "读取失败"),
        }
    }
}

/// 文档获取错误
#[derive(Debug, Error)]
#[error("获取 {source_label} 失败 ({reason}){}", detail_suffix(.detail))]
pub struct FetchError {
    pub source_label: String,
    pub reason: FetchReason,
    pub detail: Option<String>,
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {}", d))
        .unwrap_or_default()
}

impl FetchError {
    pub fn new(source_label: impl Into<String>, reason: FetchReason) -> Self {
        Self {
            source_label: source_label.into(),
            reason,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl std::fmt::Display) -> Self {
        self.detail = Some(detail.to_string());
        self
    }
}

/// 文档结构错误
///
/// 只在整个结构锚点缺失时出现；单个题目缺字段不算错误。
#[derive(Debug, Error)]
#[error("在考试类型 {profile} 的文档中找不到结构锚点 '{anchor}'")]
pub struct MalformedDocumentError {
    pub profile: String,
    pub anchor: String,
}

/// 无法识别考试类型
#[derive(Debug, Error)]
#[error("{}", selector_message(.selector))]
pub struct UnsupportedExamVariantError {
    /// 显式指定的考试类型（自动识别失败时为 None）
    pub selector: Option<String>,
}

fn selector_message(selector: &Option<String>) -> String {
    match selector {
        Some(selector) => format!("不支持的考试类型: {}", selector),
        None => "无法从文档中识别考试类型".to_string(),
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 考试配置不合法
    #[error("考试配置 '{profile}' 不合法: {reason}")]
    InvalidProfile { profile: String, reason: String },
    /// 考试配置重复
    #[error("考试配置 '{profile}' 重复定义")]
    DuplicateProfile { profile: String },
    /// 考试配置文件读取或解析失败
    #[error("考试配置文件 {path} 加载失败: {source}")]
    ProfileFileFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文档结构错误
    pub fn malformed(profile: impl Into<String>, anchor: impl Into<String>) -> Self {
        AppError::MalformedDocument(MalformedDocumentError {
            profile: profile.into(),
            anchor: anchor.into(),
        })
    }

    /// 创建考试类型错误
    pub fn unsupported_variant(selector: Option<&str>) -> Self {
        AppError::UnsupportedExamVariant(UnsupportedExamVariantError {
            selector: selector.map(str::to_string),
        })
    }

    /// 创建考试配置错误
    pub fn invalid_profile(profile: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Config(ConfigError::InvalidProfile {
            profile: profile.into(),
            reason: reason.into(),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
