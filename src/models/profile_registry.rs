use crate::error::{AppError, AppResult, ConfigError};
use crate::models::exam_profile::{ExamProfile, ProfileDefinition};
use crate::models::loaders::{load_profiles_file, parse_profile_document};
use std::path::Path;

/// 内置考试配置
const BUILTIN_PROFILES: [(&str, &str); 2] = [
    ("builtin:cat", include_str!("../../profiles/cat.toml")),
    ("builtin:xat", include_str!("../../profiles/xat.toml")),
];

/// 考试配置注册表
///
/// 保持注册顺序，自动识别时按顺序尝试。
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    profiles: Vec<ExamProfile>,
}

impl ProfileRegistry {
    /// 加载内置的考试配置
    pub fn builtin() -> AppResult<Self> {
        let mut definitions = Vec::new();
        for (origin, content) in BUILTIN_PROFILES {
            definitions.extend(parse_profile_document(content, origin)?);
        }
        Self::from_definitions(definitions)
    }

    /// 内置配置 + 外部配置文件（同 id 的外部配置覆盖内置配置）
    pub async fn with_profiles_file(path: &Path) -> AppResult<Self> {
        let mut registry = Self::builtin()?;
        registry.load_file(path).await?;
        Ok(registry)
    }

    /// 从定义列表构造，id 重复时报错
    pub fn from_definitions(definitions: Vec<ProfileDefinition>) -> AppResult<Self> {
        let mut registry = Self::default();
        for definition in definitions {
            let profile = ExamProfile::from_definition(definition)?;
            if registry.get(&profile.id).is_some() {
                return Err(ConfigError::DuplicateProfile { profile: profile.id }.into());
            }
            registry.profiles.push(profile);
        }
        Ok(registry)
    }

    /// 合并另一个注册表，同 id 的配置被覆盖
    ///
    /// # 返回
    /// 被覆盖的配置数量
    pub fn merge(&mut self, other: ProfileRegistry) -> usize {
        let mut overridden = 0;
        for profile in other.profiles {
            match self.profiles.iter_mut().find(|p| p.id == profile.id) {
                Some(existing) => {
                    tracing::info!("🔁 考试配置 {} 被外部配置覆盖", profile.id);
                    *existing = profile;
                    overridden += 1;
                }
                None => self.profiles.push(profile),
            }
        }
        overridden
    }

    /// 加载外部配置文件并合并
    pub async fn load_file(&mut self, path: &Path) -> AppResult<usize> {
        let definitions = load_profiles_file(path).await?;
        let loaded = Self::from_definitions(definitions)?;
        let count = loaded.len();
        self.merge(loaded);
        Ok(count)
    }

    /// 按 id 查找（忽略大小写和首尾空白）
    pub fn get(&self, id: &str) -> Option<&ExamProfile> {
        let wanted = id.trim().to_lowercase();
        self.profiles.iter().find(|p| p.id == wanted)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// 确定文档使用的考试配置
    ///
    /// # 参数
    /// - `selector`: 显式指定的考试类型，优先使用
    /// - `markup`: 文档内容，未指定类型时用来自动识别
    pub fn resolve(&self, selector: Option<&str>, markup: &str) -> AppResult<&ExamProfile> {
        match selector.map(str::trim).filter(|s| !s.is_empty()) {
            Some(selector) => self
                .get(selector)
                .ok_or_else(|| AppError::unsupported_variant(Some(selector))),
            None => self
                .profiles
                .iter()
                .find(|p| p.matches(markup))
                .ok_or_else(|| AppError::unsupported_variant(None)),
        }
    }
}
