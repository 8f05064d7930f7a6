use crate::error::{AppResult, ConfigError};
use std::str::FromStr;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 同时处理的答卷数量
    pub max_concurrent_documents: usize,
    /// 获取文档的超时时间（秒）
    pub fetch_timeout_secs: u64,
    /// 文档字节上限，超过直接拒绝
    pub max_document_bytes: usize,
    /// HTTP 请求使用的 User-Agent
    pub user_agent: String,
    /// 显式指定的考试类型，未设置时从文档自动识别
    pub exam_profile: Option<String>,
    /// 额外的考试配置文件（TOML）
    pub profiles_file: Option<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_documents: 4,
            fetch_timeout_secs: 20,
            max_document_bytes: 8 * 1024 * 1024,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) sheet_score/0.1".to_string(),
            exam_profile: None,
            profiles_file: None,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量读取配置
    ///
    /// 未设置的变量使用默认值；设置了但无法解析的变量直接报错。
    pub fn from_env() -> AppResult<Self> {
        let default = Self::default();
        Ok(Self {
            max_concurrent_documents: parse_env(
                "MAX_CONCURRENT_DOCUMENTS",
                default.max_concurrent_documents,
            )?
            .max(1),
            fetch_timeout_secs: parse_env("FETCH_TIMEOUT_SECS", default.fetch_timeout_secs)?,
            max_document_bytes: parse_env("MAX_DOCUMENT_BYTES", default.max_document_bytes)?,
            user_agent: std::env::var("HTTP_USER_AGENT").unwrap_or(default.user_agent),
            exam_profile: non_empty_env("EXAM_PROFILE"),
            profiles_file: non_empty_env("PROFILES_FILE"),
            verbose_logging: parse_env("VERBOSE_LOGGING", default.verbose_logging)?,
        })
    }
}

fn parse_env<T: FromStr>(var_name: &str, default: T) -> AppResult<T> {
    let Ok(value) = std::env::var(var_name) else {
        return Ok(default);
    };
    let parsed = value.trim().parse::<T>();
    parsed.map_err(|_| {
        ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value,
            expected_type: std::any::type_name::<T>().to_string(),
        }
        .into()
    })
}

fn non_empty_env(var_name: &str) -> Option<String> {
    std::env::var(var_name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
