//! 题目判定服务
//!
//! 把提取出来的原始字段变成带判定结果的题目记录，每道题只判定一次

use phf::phf_set;

use crate::models::answer_sheet::{
    OptionId, Outcome, QuestionRecord, RawQuestion, RawSection, SectionRecord,
};

/// 表示"没有作答"的状态标签（小写、单空格）
static NOT_ANSWERED_STATUSES: phf::Set<&'static str> = phf_set! {
    "not answered",
    "not attempted",
    "not visited",
    "marked for review",
    "not attempted and marked for review",
};

/// 题目判定器
pub struct QuestionClassifier;

impl QuestionClassifier {
    /// 判定单道题
    pub fn classify(raw: &RawQuestion) -> QuestionRecord {
        let chosen_option = Self::resolve_chosen(raw);
        let outcome = Self::outcome(
            chosen_option.as_ref(),
            raw.correct_option.as_ref(),
            raw.status.as_deref(),
        );

        QuestionRecord {
            id: raw.id.clone(),
            question_type: raw.question_type,
            chosen_option,
            correct_option: raw.correct_option.clone(),
            status: raw.status.clone(),
            outcome,
            voided: false,
        }
    }

    /// 判定整个分区，题目顺序保持不变
    pub fn classify_section(raw: &RawSection, excluded: bool) -> SectionRecord {
        SectionRecord {
            name: raw.name.clone(),
            questions: raw.questions.iter().map(Self::classify).collect(),
            excluded,
        }
    }

    /// 考生选项：优先使用填空题的 "Given Answer"，其次是 "Chosen Option"
    pub fn resolve_chosen(raw: &RawQuestion) -> Option<OptionId> {
        raw.given_answer
            .as_deref()
            .and_then(OptionId::parse)
            .or_else(|| raw.chosen_option.as_deref().and_then(OptionId::parse))
    }

    pub fn is_not_answered_status(status: &str) -> bool {
        let normalized = status
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        NOT_ANSWERED_STATUSES.contains(normalized.as_str())
    }

    /// 三态判定
    ///
    /// 没有选项或状态为未作答 -> Unattempted；与正确答案一致 -> Correct；其余 -> Incorrect
    pub fn outcome(
        chosen: Option<&OptionId>,
        correct: Option<&OptionId>,
        status: Option<&str>,
    ) -> Outcome {
        let Some(chosen) = chosen else {
            return Outcome::Unattempted;
        };
        if status.is_some_and(Self::is_not_answered_status) {
            return Outcome::Unattempted;
        }
        match correct {
            Some(correct) if correct == chosen => Outcome::Correct,
            _ => Outcome::Incorrect,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::answer_sheet::QuestionType;

    fn raw(chosen: Option<&str>, correct: Option<&str>, status: Option<&str>) -> RawQuestion {
        RawQuestion {
            id: Some("1".to_string()),
            chosen_option: chosen.map(str::to_string),
            correct_option: correct.and_then(OptionId::parse),
            status: status.map(str::to_string),
            ..RawQuestion::default()
        }
    }

    #[test]
    fn test_zero_is_a_real_option_and_placeholder_is_not() {
        let zero = QuestionClassifier::classify(&raw(Some("0"), Some("0"), Some("Answered")));
        assert_eq!(zero.outcome, Outcome::Correct);
        assert_eq!(zero.chosen_option.as_ref().map(OptionId::as_str), Some("0"));

        let dash = QuestionClassifier::classify(&raw(Some("--"), Some("0"), Some("Answered")));
        assert_eq!(dash.outcome, Outcome::Unattempted);
        assert_eq!(dash.chosen_option, None);
    }

    #[test]
    fn test_numeric_normalization_on_both_sides() {
        let q = QuestionClassifier::classify(&raw(Some("03"), Some("3"), None));
        assert_eq!(q.outcome, Outcome::Correct);

        let q = QuestionClassifier::classify(&raw(Some("2"), Some("3"), None));
        assert_eq!(q.outcome, Outcome::Incorrect);
    }

    #[test]
    fn test_not_answered_status_wins_over_stale_option() {
        let q = QuestionClassifier::classify(&raw(
            Some("2"),
            Some("2"),
            Some("  Marked   For Review "),
        ));
        assert_eq!(q.outcome, Outcome::Unattempted);
        assert!(!QuestionClassifier::is_not_answered_status("Answered"));
        assert!(!QuestionClassifier::is_not_answered_status(
            "Answered and Marked For Review"
        ));
    }

    #[test]
    fn test_given_answer_preferred() {
        let mut q = raw(Some("--"), Some("42"), Some("Answered"));
        q.question_type = QuestionType::ShortAnswer;
        q.given_answer = Some(" 42 ".to_string());
        let record = QuestionClassifier::classify(&q);
        assert_eq!(record.outcome, Outcome::Correct);
        assert_eq!(record.question_type, QuestionType::ShortAnswer);

        q.given_answer = Some("--".to_string());
        q.chosen_option = Some("7".to_string());
        assert_eq!(QuestionClassifier::classify(&q).outcome, Outcome::Incorrect);
    }

    #[test]
    fn test_missing_correct_option_is_incorrect_when_attempted() {
        let q = QuestionClassifier::classify(&raw(Some("1"), None, Some("Answered")));
        assert_eq!(q.outcome, Outcome::Incorrect);
    }

    #[test]
    fn test_classify_section_keeps_order() {
        let section = RawSection {
            name: "QA".to_string(),
            questions: vec![raw(Some("1"), Some("1"), None), raw(None, Some("2"), None)],
        };
        let record = QuestionClassifier::classify_section(&section, false);
        let outcomes: Vec<Outcome> = record.questions.iter().map(|q| q.outcome).collect();
        assert_eq!(outcomes, vec![Outcome::Correct, Outcome::Unattempted]);
    }
}
