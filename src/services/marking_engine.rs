//! 计分服务
//!
//! 一套通用的计分流程，差异全部来自 `MarkingRules`：
//! 1. 作废题强制记为正确（在统计之前）
//! 2. 按题型逐题加减分，得到各分区原始分
//! 3. 若配置了罚分再分配，计算罚分池并按分区得分占比分摊

use tracing::debug;

use crate::models::answer_sheet::{
    Outcome, QuestionRecord, QuestionType, SectionAggregate, SectionRecord,
};
use crate::models::exam_profile::{MarkingRules, Redistribution};

/// 计分结果
#[derive(Debug, Clone, PartialEq)]
pub struct MarkingSummary {
    /// 与输入分区一一对应
    pub aggregates: Vec<SectionAggregate>,
    /// 计分分区原始分之和
    pub raw_total: f64,
    pub penalty_pool: f64,
    pub adjusted_total: f64,
}

/// 计分引擎
pub struct MarkingEngine<'a> {
    rules: &'a MarkingRules,
}

impl<'a> MarkingEngine<'a> {
    pub fn new(rules: &'a MarkingRules) -> Self {
        Self { rules }
    }

    /// 作废题一律记为正确
    ///
    /// # 返回
    /// 被改判的题目数量
    pub fn apply_special_questions(&self, sections: &mut [SectionRecord]) -> usize {
        if self.rules.special_question_count() == 0 {
            return 0;
        }

        let mut voided = 0;
        for question in sections.iter_mut().flat_map(|s| s.questions.iter_mut()) {
            let special = question.id.as_deref().is_some_and(|id| self.rules.is_special(id));
            if special && !question.voided {
                question.outcome = Outcome::Correct;
                question.voided = true;
                voided += 1;
            }
        }
        voided
    }

    /// 计算各分区统计和总分
    ///
    /// 排除分区照常统计原始分，但不进入总分、罚分池和再分配。
    pub fn score(&self, sections: &[SectionRecord]) -> MarkingSummary {
        let mut aggregates: Vec<SectionAggregate> =
            sections.iter().map(|s| self.aggregate(s)).collect();

        let scored: Vec<usize> = sections
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.excluded)
            .map(|(idx, _)| idx)
            .collect();

        let raw_total: f64 = scored.iter().map(|&i| aggregates[i].raw_score).sum();

        let Some(redistribution) = self.rules.redistribution else {
            return MarkingSummary {
                aggregates,
                raw_total,
                penalty_pool: 0.0,
                adjusted_total: raw_total,
            };
        };

        let unattempted: u32 = scored.iter().map(|&i| aggregates[i].unattempted_count).sum();
        let pool = penalty_pool(unattempted, redistribution);
        let raw_scores: Vec<f64> = scored.iter().map(|&i| aggregates[i].raw_score).collect();

        for (&i, adjusted) in scored.iter().zip(redistribute(&raw_scores, pool)) {
            aggregates[i].adjusted_score = Some(adjusted);
        }

        debug!(
            "罚分再分配: 未作答 {} 题, 免罚 {} 题, 罚分池 {:.3}",
            unattempted, redistribution.free_allowance, pool
        );

        MarkingSummary {
            aggregates,
            raw_total,
            penalty_pool: pool,
            adjusted_total: raw_total - pool,
        }
    }

    fn aggregate(&self, section: &SectionRecord) -> SectionAggregate {
        let mut aggregate = SectionAggregate {
            correct_count: 0,
            incorrect_count: 0,
            unattempted_count: 0,
            total_count: section.questions.len() as u32,
            voided_count: 0,
            raw_score: 0.0,
            adjusted_score: None,
        };

        for question in &section.questions {
            match question.outcome {
                Outcome::Correct => aggregate.correct_count += 1,
                Outcome::Incorrect => aggregate.incorrect_count += 1,
                Outcome::Unattempted => aggregate.unattempted_count += 1,
            }
            if question.voided {
                aggregate.voided_count += 1;
            }
            aggregate.raw_score += self.question_delta(question);
        }

        aggregate
    }

    /// 单题得分，罚分以非负幅度保存，这里取负
    fn question_delta(&self, question: &QuestionRecord) -> f64 {
        match (question.outcome, question.question_type) {
            (Outcome::Correct, _) => self.rules.correct,
            (Outcome::Incorrect, QuestionType::MultipleChoice) => -self.rules.multiple_choice_penalty,
            (Outcome::Incorrect, QuestionType::ShortAnswer) => -self.rules.short_answer_penalty,
            (Outcome::Unattempted, _) => 0.0,
        }
    }
}

/// 罚分池：超出免罚数量的每道未作答题扣一次
pub fn penalty_pool(unattempted: u32, redistribution: Redistribution) -> f64 {
    let over = unattempted.saturating_sub(redistribution.free_allowance);
    f64::from(over) * redistribution.penalty_per_question
}

/// 按各分区得分占比分摊罚分池
///
/// 总分为正时 `s_i - (s_i / S) * P`；总分不为正时沿用 `s_i - s_i * P`。
/// 第二个分支的缩放方式和第一个不同，分区之和不再等于 `S - P`。
pub fn redistribute(scores: &[f64], pool: f64) -> Vec<f64> {
    let total: f64 = scores.iter().sum();
    if total > 0.0 {
        scores.iter().map(|s| s - (s / total) * pool).collect()
    } else {
        scores.iter().map(|s| s - s * pool).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::answer_sheet::OptionId;
    use crate::models::loaders::parse_profile_document;
    use crate::models::ExamProfile;

    fn question(outcome: Outcome, kind: QuestionType) -> QuestionRecord {
        QuestionRecord {
            id: None,
            question_type: kind,
            chosen_option: OptionId::parse("1"),
            correct_option: OptionId::parse("1"),
            status: None,
            outcome,
            voided: false,
        }
    }

    fn section(name: &str, outcomes: &[(Outcome, QuestionType)], excluded: bool) -> SectionRecord {
        SectionRecord {
            name: name.to_string(),
            questions: outcomes.iter().map(|&(o, k)| question(o, k)).collect(),
            excluded,
        }
    }

    fn builtin(id: &str) -> ExamProfile {
        let content = match id {
            "cat" => include_str!("../../profiles/cat.toml"),
            _ => include_str!("../../profiles/xat.toml"),
        };
        let definition = parse_profile_document(content, id).unwrap().remove(0);
        ExamProfile::from_definition(definition).unwrap()
    }

    #[test]
    fn test_cat_marking_does_not_penalize_short_answers() {
        use Outcome::*;
        use QuestionType::*;

        let profile = builtin("cat");
        let sections = vec![section(
            "QA",
            &[
                (Correct, MultipleChoice),
                (Incorrect, MultipleChoice),
                (Incorrect, ShortAnswer),
                (Correct, ShortAnswer),
                (Unattempted, MultipleChoice),
            ],
            false,
        )];

        let summary = MarkingEngine::new(&profile.marking).score(&sections);
        let agg = &summary.aggregates[0];
        assert_eq!((agg.correct_count, agg.incorrect_count, agg.unattempted_count), (2, 2, 1));
        assert!(agg.is_consistent());
        assert_eq!(agg.raw_score, 5.0);
        assert_eq!(agg.adjusted_score, None);
        assert_eq!(summary.raw_total, 5.0);
        assert_eq!(summary.adjusted_total, 5.0);
        assert_eq!(summary.penalty_pool, 0.0);
    }

    #[test]
    fn test_redistribution_scenario() {
        let rule = Redistribution {
            free_allowance: 8,
            penalty_per_question: 0.1,
        };
        assert!((penalty_pool(10, rule) - 0.2).abs() < 1e-9);

        let adjusted = redistribute(&[10.0, 5.0], 0.2);
        assert!((adjusted[0] - 9.867).abs() < 1e-3);
        assert!((adjusted[1] - 4.933).abs() < 1e-3);
        assert!((adjusted.iter().sum::<f64>() - 14.8).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_redistribution_uses_plain_scaling() {
        let adjusted = redistribute(&[-2.0, 0.0], 0.5);
        assert_eq!(adjusted, vec![-1.0, 0.0]);
    }

    #[test]
    fn test_no_penalty_within_allowance() {
        let r = Redistribution {
            free_allowance: 8,
            penalty_per_question: 0.1,
        };
        assert_eq!(penalty_pool(0, r), 0.0);
        assert_eq!(penalty_pool(8, r), 0.0);
    }

    #[test]
    fn test_xat_marking_with_excluded_section() {
        use Outcome::*;
        use QuestionType::MultipleChoice as Mc;

        let profile = builtin("xat");
        let mut verbal = vec![(Correct, Mc); 11];
        verbal.push((Incorrect, Mc));
        verbal.push((Incorrect, Mc));
        verbal.push((Incorrect, Mc));
        verbal.push((Incorrect, Mc));
        verbal.extend(vec![(Unattempted, Mc); 6]);
        let mut quant = vec![(Correct, Mc); 5];
        quant.extend(vec![(Unattempted, Mc); 4]);
        let gk = vec![(Unattempted, Mc); 20];

        let sections = vec![
            section("Verbal", &verbal, false),
            section("Quant", &quant, false),
            section("General Knowledge", &gk, true),
        ];
        let summary = MarkingEngine::new(&profile.marking).score(&sections);

        // 11 - 4 * 0.25 = 10，5，GK 的未作答不计入
        assert_eq!(summary.aggregates[0].raw_score, 10.0);
        assert_eq!(summary.aggregates[1].raw_score, 5.0);
        assert_eq!(summary.raw_total, 15.0);
        assert!((summary.penalty_pool - 0.2).abs() < 1e-9);
        assert!((summary.adjusted_total - 14.8).abs() < 1e-9);

        let verbal_adj = summary.aggregates[0].adjusted_score.unwrap();
        let quant_adj = summary.aggregates[1].adjusted_score.unwrap();
        assert!((verbal_adj - 9.867).abs() < 1e-3);
        assert!((quant_adj - 4.933).abs() < 1e-3);
        assert!((verbal_adj + quant_adj - (summary.raw_total - summary.penalty_pool)).abs() < 0.01);

        assert_eq!(summary.aggregates[2].adjusted_score, None);
        assert_eq!(summary.aggregates[2].unattempted_count, 20);
    }

    #[test]
    fn test_special_questions_credited_before_aggregation() {
        let mut definition = parse_profile_document(include_str!("../../profiles/cat.toml"), "cat")
            .unwrap()
            .remove(0);
        definition.marking.special_question_ids = vec!["900".to_string()];
        let profile = ExamProfile::from_definition(definition).unwrap();

        let mut voided = question(Outcome::Unattempted, QuestionType::MultipleChoice);
        voided.id = Some("900".to_string());
        let mut sections = vec![SectionRecord {
            name: "DILR".to_string(),
            questions: vec![voided, question(Outcome::Incorrect, QuestionType::MultipleChoice)],
            excluded: false,
        }];

        let engine = MarkingEngine::new(&profile.marking);
        assert_eq!(engine.apply_special_questions(&mut sections), 1);
        assert_eq!(engine.apply_special_questions(&mut sections), 0);

        let summary = engine.score(&sections);
        let agg = &summary.aggregates[0];
        assert_eq!(agg.correct_count, 1);
        assert_eq!(agg.voided_count, 1);
        assert_eq!(agg.raw_score, 2.0);
    }

    #[test]
    fn test_score_is_idempotent() {
        let profile = builtin("xat");
        let sections = vec![section(
            "Verbal",
            &[(Outcome::Correct, QuestionType::MultipleChoice); 3],
            false,
        )];
        let engine = MarkingEngine::new(&profile.marking);
        assert_eq!(engine.score(&sections), engine.score(&sections));
    }
}
