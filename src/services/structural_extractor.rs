//! 结构提取服务
//!
//! 核心职责：把答卷 HTML 切成考生信息 + 分区 + 题目块，只做"搬运"，不做判断

use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::markup::{
    cells, clean_text, find_by_class, label_key, rows, strip_label_suffix, strip_loose_prefix, Cell,
};
use crate::models::answer_sheet::{
    ExtractedSheet, OptionId, QuestionType, RawQuestion, RawSection, StudentProfile,
};
use crate::models::exam_profile::{ExamProfile, MarkupRules};

/// 结构提取器
///
/// - 按考试配置中的结构标记定位分区和题目块
/// - 单个字段缺失时留空，只有整个锚点缺失才报错
/// - 不持有任何状态，同一份输入永远得到同一份输出
pub struct StructuralExtractor<'a> {
    profile_id: &'a str,
    rules: &'a MarkupRules,
}

impl<'a> StructuralExtractor<'a> {
    pub fn new(profile: &'a ExamProfile) -> Self {
        Self {
            profile_id: &profile.id,
            rules: &profile.markup,
        }
    }

    /// 提取考生信息和所有分区
    ///
    /// # 参数
    /// - `markup`: 已经去掉注释和脚本的答卷 HTML
    ///
    /// # 返回
    /// 找不到任何分区块或题目块时返回 `MalformedDocumentError`
    pub fn extract(&self, markup: &str) -> AppResult<ExtractedSheet> {
        let student = self.extract_student(markup);

        let containers = find_by_class(markup, &self.rules.section_container);
        if containers.is_empty() {
            return Err(AppError::malformed(self.profile_id, &self.rules.section_container));
        }

        let sections: Vec<RawSection> = containers
            .iter()
            .enumerate()
            .map(|(idx, container)| self.extract_section(idx + 1, container.inner()))
            .collect();

        if sections.iter().all(|s| s.questions.is_empty()) {
            return Err(AppError::malformed(self.profile_id, &self.rules.question_container));
        }

        debug!(
            "结构提取完成: {} 个考生字段, {} 个分区, {} 道题",
            student.len(),
            sections.len(),
            sections.iter().map(|s| s.questions.len()).sum::<usize>()
        );

        Ok(ExtractedSheet { student, sections })
    }

    /// 考生信息表：每行第一个单元格是标签，第二个是值
    fn extract_student(&self, markup: &str) -> StudentProfile {
        let mut student = StudentProfile::new();
        let tables = find_by_class(markup, &self.rules.profile_table);
        if tables.is_empty() {
            warn!("⚠️ 未找到考生信息表 '{}'", self.rules.profile_table);
            return student;
        }

        for table in tables {
            for row in rows(table.outer()) {
                if row.len() < 2 {
                    continue;
                }
                let label = strip_label_suffix(&row[0].text);
                let value = row[1].text.trim();
                if label.is_empty() || value.is_empty() {
                    continue;
                }
                student.insert(label, value);
            }
        }

        student
    }

    fn extract_section(&self, index: usize, html: &str) -> RawSection {
        let label = find_by_class(html, &self.rules.section_label)
            .first()
            .map(|el| clean_text(el.inner()))
            .map(|text| strip_loose_prefix(&text, &self.rules.section_label_prefix).to_string())
            .filter(|name| !name.is_empty());

        let name = match label {
            Some(name) => name,
            None => {
                warn!("⚠️ 第 {} 个分区缺少分区名，使用默认名称", index);
                format!("Section {}", index)
            }
        };

        let questions = find_by_class(html, &self.rules.question_container)
            .iter()
            .map(|block| self.extract_question(block.outer()))
            .collect();

        RawSection { name, questions }
    }

    /// 题目块：按"标签单元格 -> 下一个单元格"的方式取字段
    pub fn extract_question(&self, html: &str) -> RawQuestion {
        let all_cells = cells(html);
        let sentinels = &self.rules.sentinels;

        let type_label = field_after(&all_cells, &sentinels.question_type);
        let question_type = match &type_label {
            Some(label) if self.rules.is_short_answer(label) => QuestionType::ShortAnswer,
            _ => QuestionType::MultipleChoice,
        };

        RawQuestion {
            id: field_after(&all_cells, &sentinels.question_id),
            status: field_after(&all_cells, &sentinels.status),
            chosen_option: field_after(&all_cells, &sentinels.chosen_option),
            given_answer: field_after(&all_cells, &sentinels.given_answer),
            correct_option: self.correct_option(&all_cells, question_type),
            type_label,
            question_type,
        }
    }

    /// 正确答案：第一个带正确答案标记的单元格，去掉前缀后按题型截断
    fn correct_option(&self, all_cells: &[Cell], question_type: QuestionType) -> Option<OptionId> {
        let cell = all_cells.iter().find(|c| c.has_class(&self.rules.right_answer))?;
        let text = match &self.rules.right_answer_prefix {
            Some(prefix) => strip_loose_prefix(&cell.text, prefix),
            None => cell.text.trim(),
        };

        let len = match question_type {
            QuestionType::MultipleChoice => self.rules.multiple_choice_answer_len,
            QuestionType::ShortAnswer => self.rules.short_answer_len,
        };
        let truncated: String = text.chars().take(len).collect();

        OptionId::parse(&truncated)
    }
}

/// 查找标签单元格，返回它后面一个单元格的文本（第一次出现为准）
fn field_after(all_cells: &[Cell], sentinel: &str) -> Option<String> {
    let pos = all_cells
        .iter()
        .position(|c| label_key(strip_label_suffix(&c.text)) == sentinel)?;
    all_cells
        .get(pos + 1)
        .map(|c| c.text.trim().to_string())
        .filter(|v| !v.is_empty())
}
