//! 答卷处理上下文
//!
//! 封装"我正在处理第几份答卷、它从哪里来"这一信息

use std::fmt::Display;

use crate::infrastructure::DocumentSource;

/// 答卷处理上下文
#[derive(Debug, Clone)]
pub struct DocumentCtx {
    /// 答卷索引（从1开始，仅用于日志显示）
    pub index: usize,

    /// 答卷来源
    pub source: DocumentSource,
}

impl DocumentCtx {
    pub fn new(index: usize, source: DocumentSource) -> Self {
        Self { index, source }
    }
}

impl Display for DocumentCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[答卷 #{} {}]", self.index, self.source)
    }
}
