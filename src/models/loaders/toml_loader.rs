use crate::error::{AppResult, ConfigError};
use crate::models::exam_profile::ProfileDefinition;
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

/// 考试配置文件：顶层是若干个 `[[profile]]`
#[derive(Debug, Deserialize)]
struct ProfileDocument {
    #[serde(default)]
    profile: Vec<ProfileDefinition>,
}

/// 解析考试配置 TOML 文本
///
/// # 参数
/// - `content`: TOML 文本
/// - `origin`: 来源描述（文件路径或内置配置名），用于错误信息
pub fn parse_profile_document(content: &str, origin: &str) -> AppResult<Vec<ProfileDefinition>> {
    let document: ProfileDocument =
        toml::from_str(content).map_err(|e| ConfigError::ProfileFileFailed {
            path: origin.to_string(),
            source: Box::new(e),
        })?;
    Ok(document.profile)
}

/// 从文件加载考试配置
pub async fn load_profiles_file(path: &Path) -> AppResult<Vec<ProfileDefinition>> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::ProfileFileFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;

    let definitions = parse_profile_document(&content, &path.display().to_string())?;
    tracing::info!(
        "从 {} 加载了 {} 个考试配置",
        path.file_name().unwrap_or_default().to_string_lossy(),
        definitions.len()
    );

    Ok(definitions)
}
