//! 百分位查询服务

use tracing::warn;

use crate::models::answer_sheet::ProfileContext;
use crate::models::exam_profile::PercentileTableLookup;

/// 百分位查询
///
/// 对任意实数分数都返回唯一的档位，包括负分和 NaN（落到最低档）。
pub struct PercentileResolver<'a> {
    tables: &'a dyn PercentileTableLookup,
}

impl<'a> PercentileResolver<'a> {
    pub fn new(tables: &'a dyn PercentileTableLookup) -> Self {
        Self { tables }
    }

    /// 从最高阈值往下找第一个不超过分数的档位
    ///
    /// # 参数
    /// - `score`: 最终总分
    /// - `context`: 场次等上下文
    pub fn resolve(&self, score: f64, context: &ProfileContext) -> String {
        let Some(bands) = self.tables.bands(context.shift) else {
            warn!("⚠️ 场次 {} 没有百分位表，使用最低档", context.shift);
            return self.tables.lowest_band().to_string();
        };

        bands
            .iter()
            .find(|band| band.min_score <= score)
            .map(|band| band.label.clone())
            .unwrap_or_else(|| self.tables.lowest_band().to_string())
    }
}
