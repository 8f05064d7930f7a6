//! 答卷计分流程 - 流程层
//!
//! 核心职责：定义"一份答卷"的完整处理流程
//!
//! 流程顺序：
//! 1. 获取原文（唯一的 I/O）
//! 2. 确定考试配置 → 结构提取
//! 3. 逐题判定 → 作废题改判 → 计分
//! 4. 确定场次 → 查百分位

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::AppResult;
use crate::infrastructure::{DocumentFetcher, DocumentSource};
use crate::markup::sanitize;
use crate::models::answer_sheet::{ScoreResult, ScoredSection, SectionRecord, ShiftSource};
use crate::models::ProfileRegistry;
use crate::services::{MarkingEngine, PercentileResolver, QuestionClassifier, StructuralExtractor};
use crate::workflow::score_ctx::DocumentCtx;

/// 答卷计分流程
///
/// - 编排完整的计分流程
/// - 只持有获取能力和只读的考试配置，不保存任何中间结果
/// - 多份答卷可以共享同一个实例并发计算
pub struct ScoreFlow {
    fetcher: Arc<dyn DocumentFetcher>,
    registry: Arc<ProfileRegistry>,
}

impl ScoreFlow {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>, registry: Arc<ProfileRegistry>) -> Self {
        Self { fetcher, registry }
    }

    /// 处理一份答卷并记录日志
    pub async fn run(&self, ctx: &DocumentCtx, selector: Option<&str>) -> AppResult<ScoreResult> {
        info!("{} 📄 开始处理", ctx);
        let result = self.compute_result(&ctx.source, selector).await?;

        if result.shift_source == ShiftSource::Defaulted {
            warn!("{} ⚠️ 未能从考试时间识别场次，按默认场次 {} 计算", ctx, result.shift);
        }
        info!(
            "{} ✓ {} 总分 {:.2} → {}",
            ctx, result.exam_profile, result.adjusted_total, result.percentile_band
        );

        Ok(result)
    }

    /// 获取并计算一份答卷
    ///
    /// # 参数
    /// - `source`: URL 或本地路径
    /// - `selector`: 显式指定的考试类型，None 时自动识别
    ///
    /// # 返回
    /// 完整的 `ScoreResult`，或者获取 / 结构 / 考试类型错误之一
    pub async fn compute_result(
        &self,
        source: &DocumentSource,
        selector: Option<&str>,
    ) -> AppResult<ScoreResult> {
        let raw = self.fetcher.fetch(source).await?;
        debug!("已获取 {} ({} 字节)", raw.source, raw.bytes);
        self.score_markup(&raw.html, selector)
    }

    /// 对已经拿到手的 HTML 计分，不做任何 I/O
    pub fn score_markup(&self, markup: &str, selector: Option<&str>) -> AppResult<ScoreResult> {
        let markup = sanitize(markup);
        let profile = self.registry.resolve(selector, &markup)?;
        debug!("使用考试配置 {} ({})", profile.id, profile.name);

        let sheet = StructuralExtractor::new(profile).extract(&markup)?;

        let mut sections: Vec<SectionRecord> = sheet
            .sections
            .iter()
            .map(|raw| {
                let excluded = profile.marking.is_excluded(&raw.name);
                QuestionClassifier::classify_section(raw, excluded)
            })
            .collect();

        let engine = MarkingEngine::new(&profile.marking);
        let voided = engine.apply_special_questions(&mut sections);
        if voided > 0 {
            debug!("{} 道作废题按正确计分", voided);
        }

        let summary = engine.score(&sections);
        debug_assert!(summary.aggregates.iter().all(|a| a.is_consistent()));

        let context = profile.percentile.context_for(&sheet.student);
        let percentile_band =
            PercentileResolver::new(&profile.percentile).resolve(summary.adjusted_total, &context);

        Ok(ScoreResult {
            exam_profile: profile.id.clone(),
            student_profile: sheet.student,
            shift: context.shift,
            shift_source: context.source,
            sections: sections
                .into_iter()
                .zip(summary.aggregates)
                .map(|(section, aggregate)| ScoredSection { section, aggregate })
                .collect(),
            raw_total: summary.raw_total,
            penalty_pool: summary.penalty_pool,
            adjusted_total: summary.adjusted_total,
            percentile_band,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, FetchError, FetchReason};
    use crate::infrastructure::RawMarkup;
    use crate::models::answer_sheet::Outcome;
    use async_trait::async_trait;

    /// 从内存返回固定内容的获取器
    struct StaticFetcher(String);

    #[async_trait]
    impl DocumentFetcher for StaticFetcher {
        async fn fetch(&self, source: &DocumentSource) -> Result<RawMarkup, FetchError> {
            if self.0.is_empty() {
                return Err(FetchError::new(source.label(), FetchReason::NotFound));
            }
            Ok(RawMarkup {
                source: source.clone(),
                html: self.0.clone(),
                bytes: self.0.len(),
            })
        }
    }

    fn flow(html: &str) -> ScoreFlow {
        ScoreFlow::new(
            Arc::new(StaticFetcher(html.to_string())),
            Arc::new(ProfileRegistry::builtin().unwrap()),
        )
    }

    const MINI_CAT: &str = r#"<html><title>CAT 2024 Response Sheet</title>
        <table class="main-info-pnl"><tr><td>Test Time</td><td>4:30 PM - 6:30 PM</td></tr></table>
        <!-- <div class="section-cntnr">commented out</div> -->
        <div class="section-cntnr"><div class="section-lbl">Section : QA</div>
          <div class="question-pnl"><table>
            <tr><td class="rightAns">0. zero</td></tr>
            <tr><td>Question Type :</td><td>MCQ</td></tr>
            <tr><td>Status :</td><td>Answered</td></tr>
            <tr><td>Chosen Option :</td><td>0</td></tr>
          </table></div>
          <div class="question-pnl"><table>
            <tr><td class="rightAns">0. zero</td></tr>
            <tr><td>Question Type :</td><td>MCQ</td></tr>
            <tr><td>Status :</td><td>Not Answered</td></tr>
            <tr><td>Chosen Option :</td><td>--</td></tr>
          </table></div>
        </div></html>"#;

    #[tokio::test]
    async fn test_compute_result_end_to_end() {
        let source = DocumentSource::from("memory://mini-cat");
        let result = flow(MINI_CAT).compute_result(&source, None).await.unwrap();

        assert_eq!(result.exam_profile, "cat");
        assert_eq!(result.shift, 3);
        assert_eq!(result.shift_source, ShiftSource::Declared);
        assert_eq!(result.sections.len(), 1);

        let qa = &result.sections[0];
        assert_eq!(qa.section.name, "QA");
        assert_eq!(qa.section.questions[0].outcome, Outcome::Correct);
        assert_eq!(qa.section.questions[1].outcome, Outcome::Unattempted);
        assert_eq!(qa.aggregate.raw_score, 3.0);
        assert_eq!(result.adjusted_total, 3.0);
    }

    #[tokio::test]
    async fn test_fetch_error_is_propagated() {
        let source = DocumentSource::from("missing.html");
        let err = flow("").compute_result(&source, None).await.unwrap_err();
        assert!(matches!(err, AppError::Fetch(ref e) if e.reason == FetchReason::NotFound));
    }

    #[test]
    fn test_unknown_exam_is_rejected() {
        let err = flow("")
            .score_markup("<html><title>Some Other Exam</title></html>", None)
            .unwrap_err();
        assert!(matches!(err, AppError::UnsupportedExamVariant(_)));
    }

    #[test]
    fn test_score_markup_is_deterministic() {
        let flow = flow("");
        let first = serde_json::to_string(&flow.score_markup(MINI_CAT, None).unwrap()).unwrap();
        let second = serde_json::to_string(&flow.score_markup(MINI_CAT, None).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}
