use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 题目类型
///
/// 类型标签缺失或不认识时按选择题处理。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestionType {
    /// 选择题
    #[default]
    MultipleChoice,
    /// 填空题（TITA）
    ShortAnswer,
}

/// 选项标识
///
/// 考生选项和正确答案在比较前都会转换成这个类型：
/// 能解析为整数的统一成十进制字符串（"02" -> "2"），其余保留去掉首尾空白后的原文。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionId(String);

impl OptionId {
    /// 门户用来表示"未作答"的占位符
    pub const PLACEHOLDER: &'static str = "--";

    /// 解析原始选项文本，空串和占位符 "--" 视为没有选项
    ///
    /// 注意 "0" 是合法选项，不能当作空。
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == Self::PLACEHOLDER {
            return None;
        }
        match trimmed.parse::<i64>() {
            Ok(n) => Some(Self(n.to_string())),
            Err(_) => Some(Self(trimmed.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 单题判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    Correct,
    Incorrect,
    Unattempted,
}

/// 考生信息（标签 -> 值）
///
/// 缺失的字段就是不存在，不做任何补全。使用有序 map 保证序列化结果稳定。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentProfile(BTreeMap<String, String>);

impl StudentProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入字段，同名标签保留第一次出现的值
    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<String>) {
        self.0.entry(label.into()).or_insert_with(|| value.into());
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.0.get(label).map(String::as_str)
    }

    /// 按宽松标签查找（忽略大小写和空白）
    pub fn find(&self, label: &str) -> Option<&str> {
        let wanted = crate::markup::label_key(label);
        self.0
            .iter()
            .find(|(k, _)| crate::markup::label_key(k) == wanted)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 从题目块中直接提取出来的字段
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawQuestion {
    pub id: Option<String>,
    /// "Question Type :" 后面的原始文本
    pub type_label: Option<String>,
    pub question_type: QuestionType,
    pub status: Option<String>,
    pub chosen_option: Option<String>,
    pub given_answer: Option<String>,
    /// 已截断并规范化的正确答案
    pub correct_option: Option<OptionId>,
}

/// 从分区块中提取出来的原始数据
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSection {
    pub name: String,
    pub questions: Vec<RawQuestion>,
}

/// 结构提取的结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedSheet {
    pub student: StudentProfile,
    pub sections: Vec<RawSection>,
}

/// 单题记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub question_type: QuestionType,
    pub chosen_option: Option<OptionId>,
    pub correct_option: Option<OptionId>,
    /// 门户上的原始状态文本
    pub status: Option<String>,
    pub outcome: Outcome,
    /// 官方作废题，一律按正确计分
    #[serde(default)]
    pub voided: bool,
}

/// 分区记录，题目顺序与文档一致
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionRecord {
    pub name: String,
    pub questions: Vec<QuestionRecord>,
    /// 只展示不计分的分区（如 XAT 的 GK）
    pub excluded: bool,
}

/// 分区统计
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionAggregate {
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub unattempted_count: u32,
    pub total_count: u32,
    pub voided_count: u32,
    pub raw_score: f64,
    /// 只有带罚分再分配的考试才有
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjusted_score: Option<f64>,
}

impl SectionAggregate {
    /// 正确 + 错误 + 未作答 == 总题数
    pub fn is_consistent(&self) -> bool {
        self.correct_count + self.incorrect_count + self.unattempted_count == self.total_count
    }
}

/// 带统计的分区
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSection {
    #[serde(flatten)]
    pub section: SectionRecord,
    #[serde(flatten)]
    pub aggregate: SectionAggregate,
}

/// 场次来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShiftSource {
    /// 从考生信息的考试时间中识别
    Declared,
    /// 考试时间缺失或无法识别，使用考试配置的默认场次
    Defaulted,
}

/// 百分位查询上下文
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileContext {
    pub shift: u8,
    pub source: ShiftSource,
}

/// 最终成绩
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub exam_profile: String,
    pub student_profile: StudentProfile,
    pub shift: u8,
    pub shift_source: ShiftSource,
    pub sections: Vec<ScoredSection>,
    /// 计分分区的原始总分（不含排除分区）
    pub raw_total: f64,
    /// 未作答超额产生的罚分池
    pub penalty_pool: f64,
    pub adjusted_total: f64,
    pub percentile_band: String,
}
