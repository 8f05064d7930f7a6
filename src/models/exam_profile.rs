//! 考试配置
//!
//! 每种考试（CAT、XAT……）在 TOML 中描述为一份 `ProfileDefinition`，
//! 包括页面结构标记、计分规则和各场次的百分位表。加载后经过校验编译成
//! `ExamProfile`，流程中的各个服务只读取编译后的规则。

use crate::error::{AppError, AppResult};
use crate::markup::{label_key, loose_prefix_pattern, strip_label_suffix};
use crate::models::answer_sheet::{ProfileContext, ShiftSource, StudentProfile};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeSet;

// ========== TOML 定义 ==========

/// 一份考试配置的原始定义
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileDefinition {
    pub id: String,
    pub name: String,
    /// 自动识别用的正则，任意一个命中即认为是这种考试
    #[serde(default)]
    pub detect: Vec<String>,
    pub markup: MarkupDefinition,
    #[serde(default)]
    pub sentinels: SentinelDefinition,
    pub marking: MarkingDefinition,
    pub percentile: PercentileDefinition,
}

/// 页面结构标记
#[derive(Debug, Clone, Deserialize)]
pub struct MarkupDefinition {
    pub profile_table: String,
    pub section_container: String,
    pub section_label: String,
    #[serde(default = "default_section_label_prefix")]
    pub section_label_prefix: String,
    pub question_container: String,
    pub right_answer: String,
    #[serde(default)]
    pub right_answer_prefix: Option<String>,
    #[serde(default = "default_multiple_choice_len")]
    pub multiple_choice_answer_len: usize,
    #[serde(default = "default_short_answer_len")]
    pub short_answer_len: usize,
    #[serde(default = "default_short_answer_types")]
    pub short_answer_types: Vec<String>,
}

fn default_section_label_prefix() -> String {
    "Section : ".to_string()
}

fn default_multiple_choice_len() -> usize {
    1
}

fn default_short_answer_len() -> usize {
    5
}

fn default_short_answer_types() -> Vec<String> {
    vec!["SA".to_string(), "TITA".to_string()]
}

/// 题目块中各字段的标签文本
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SentinelDefinition {
    pub question_type: String,
    pub question_id: String,
    pub status: String,
    pub chosen_option: String,
    pub given_answer: String,
}

impl Default for SentinelDefinition {
    fn default() -> Self {
        Self {
            question_type: "Question Type :".to_string(),
            question_id: "Question ID :".to_string(),
            status: "Status :".to_string(),
            chosen_option: "Chosen Option :".to_string(),
            given_answer: "Given Answer :".to_string(),
        }
    }
}

/// 计分规则
#[derive(Debug, Clone, Deserialize)]
pub struct MarkingDefinition {
    pub correct: f64,
    pub multiple_choice_penalty: f64,
    #[serde(default)]
    pub short_answer_penalty: f64,
    #[serde(default)]
    pub excluded_sections: Vec<String>,
    #[serde(default)]
    pub special_question_ids: Vec<String>,
    #[serde(default)]
    pub redistribution: Option<RedistributionDefinition>,
}

/// 未作答罚分再分配
#[derive(Debug, Clone, Deserialize)]
pub struct RedistributionDefinition {
    pub free_allowance: u32,
    pub penalty_per_question: f64,
}

/// 百分位配置
#[derive(Debug, Clone, Deserialize)]
pub struct PercentileDefinition {
    #[serde(default = "default_shift_field")]
    pub shift_field: String,
    pub default_shift: u8,
    pub lowest_band: String,
    pub shifts: Vec<ShiftTableDefinition>,
}

fn default_shift_field() -> String {
    "Test Time".to_string()
}

/// 单个场次的百分位表
#[derive(Debug, Clone, Deserialize)]
pub struct ShiftTableDefinition {
    pub shift: u8,
    #[serde(default)]
    pub test_time_prefixes: Vec<String>,
    pub bands: Vec<BandDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BandDefinition {
    pub min: f64,
    pub label: String,
}

// ========== 编译后的规则 ==========

/// 题目字段标签（已去掉冒号并转换为比较键）
#[derive(Debug, Clone)]
pub struct FieldSentinels {
    pub question_type: String,
    pub question_id: String,
    pub status: String,
    pub chosen_option: String,
    pub given_answer: String,
}

/// 结构提取规则
#[derive(Debug, Clone)]
pub struct MarkupRules {
    pub profile_table: String,
    pub section_container: String,
    pub section_label: String,
    pub section_label_prefix: Regex,
    pub question_container: String,
    pub right_answer: String,
    pub right_answer_prefix: Option<Regex>,
    pub multiple_choice_answer_len: usize,
    pub short_answer_len: usize,
    /// 填空题类型标签的比较键
    pub short_answer_types: Vec<String>,
    pub sentinels: FieldSentinels,
}

impl MarkupRules {
    /// 类型标签是否属于填空题
    pub fn is_short_answer(&self, type_label: &str) -> bool {
        let key = label_key(type_label);
        self.short_answer_types.iter().any(|t| *t == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Redistribution {
    pub free_allowance: u32,
    pub penalty_per_question: f64,
}

/// 计分规则，罚分都以非负数保存
#[derive(Debug, Clone)]
pub struct MarkingRules {
    pub correct: f64,
    pub multiple_choice_penalty: f64,
    pub short_answer_penalty: f64,
    excluded_sections: Vec<String>,
    special_question_ids: BTreeSet<String>,
    pub redistribution: Option<Redistribution>,
}

impl MarkingRules {
    /// 分区是否只展示不计分（按宽松标签比较）
    pub fn is_excluded(&self, section_name: &str) -> bool {
        let key = label_key(section_name);
        self.excluded_sections.iter().any(|s| *s == key)
    }

    /// 是否为官方作废题
    pub fn is_special(&self, question_id: &str) -> bool {
        self.special_question_ids.contains(question_id.trim())
    }

    pub fn special_question_count(&self) -> usize {
        self.special_question_ids.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PercentileBand {
    pub min_score: f64,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct ShiftTable {
    pub shift: u8,
    test_time_keys: Vec<String>,
    /// 按阈值从高到低排列
    pub bands: Vec<PercentileBand>,
}

/// 按场次查百分位表
pub trait PercentileTableLookup {
    /// 场次对应的百分位档位（从高到低），没有这张表时返回 None
    fn bands(&self, shift: u8) -> Option<&[PercentileBand]>;

    /// 低于所有阈值时使用的档位
    fn lowest_band(&self) -> &str;
}

/// 百分位表集合
#[derive(Debug, Clone)]
pub struct PercentileSchedule {
    pub shift_field: String,
    pub default_shift: u8,
    lowest_band: String,
    tables: Vec<ShiftTable>,
}

impl PercentileSchedule {
    /// 根据考生信息中的考试时间确定场次
    ///
    /// 考试时间缺失或者没有匹配的前缀时回落到默认场次。
    pub fn context_for(&self, student: &StudentProfile) -> ProfileContext {
        let declared = student.find(&self.shift_field).and_then(|time| {
            let key = label_key(time);
            self.tables
                .iter()
                .find(|t| t.test_time_keys.iter().any(|p| key.starts_with(p.as_str())))
                .map(|t| t.shift)
        });

        match declared {
            Some(shift) => ProfileContext {
                shift,
                source: ShiftSource::Declared,
            },
            None => ProfileContext {
                shift: self.default_shift,
                source: ShiftSource::Defaulted,
            },
        }
    }

    pub fn shifts(&self) -> impl Iterator<Item = u8> + '_ {
        self.tables.iter().map(|t| t.shift)
    }
}

impl PercentileTableLookup for PercentileSchedule {
    fn bands(&self, shift: u8) -> Option<&[PercentileBand]> {
        self.tables
            .iter()
            .find(|t| t.shift == shift)
            .map(|t| t.bands.as_slice())
    }

    fn lowest_band(&self) -> &str {
        &self.lowest_band
    }
}

/// 编译并校验过的考试配置
#[derive(Debug, Clone)]
pub struct ExamProfile {
    /// 小写标识，例如 "cat"
    pub id: String,
    pub name: String,
    detectors: Vec<Regex>,
    pub markup: MarkupRules,
    pub marking: MarkingRules,
    pub percentile: PercentileSchedule,
}

impl ExamProfile {
    /// 校验并编译一份考试配置
    ///
    /// # 参数
    /// - `definition`: TOML 中读到的原始定义
    ///
    /// # 返回
    /// 任何一项不合法都返回 `ConfigError::InvalidProfile`
    pub fn from_definition(definition: ProfileDefinition) -> AppResult<Self> {
        let id = definition.id.trim().to_lowercase();
        if id.is_empty() {
            return Err(AppError::invalid_profile(&definition.name, "id 不能为空"));
        }

        let invalid = |reason: String| AppError::invalid_profile(&id, reason);

        let detectors = definition
            .detect
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| invalid(format!("识别正则 '{}' 无效: {}", pattern, e)))
            })
            .collect::<AppResult<Vec<_>>>()?;

        let markup = compile_markup(&definition.markup, &definition.sentinels).map_err(invalid)?;
        let marking = compile_marking(&definition.marking).map_err(invalid)?;
        let percentile = compile_percentile(&definition.percentile).map_err(invalid)?;

        Ok(Self {
            id,
            name: definition.name.trim().to_string(),
            detectors,
            markup,
            marking,
            percentile,
        })
    }

    /// 文档是否属于这种考试
    pub fn matches(&self, markup: &str) -> bool {
        self.detectors.iter().any(|re| re.is_match(markup))
    }
}

fn require_marker(name: &str, value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("结构标记 {} 不能为空", name));
    }
    Ok(trimmed.to_string())
}

fn require_sentinel(name: &str, value: &str) -> Result<String, String> {
    let key = label_key(strip_label_suffix(value));
    if key.is_empty() {
        return Err(format!("字段标签 {} 不能为空", name));
    }
    Ok(key)
}

fn compile_markup(
    markup: &MarkupDefinition,
    sentinels: &SentinelDefinition,
) -> Result<MarkupRules, String> {
    if markup.multiple_choice_answer_len == 0 || markup.short_answer_len == 0 {
        return Err("答案截断长度必须大于 0".to_string());
    }

    let section_label_prefix = loose_prefix_pattern(&markup.section_label_prefix)
        .map_err(|e| format!("分区标签前缀无效: {}", e))?;
    let right_answer_prefix = markup
        .right_answer_prefix
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .map(loose_prefix_pattern)
        .transpose()
        .map_err(|e| format!("正确答案前缀无效: {}", e))?;

    Ok(MarkupRules {
        profile_table: require_marker("profile_table", &markup.profile_table)?,
        section_container: require_marker("section_container", &markup.section_container)?,
        section_label: require_marker("section_label", &markup.section_label)?,
        section_label_prefix,
        question_container: require_marker("question_container", &markup.question_container)?,
        right_answer: require_marker("right_answer", &markup.right_answer)?,
        right_answer_prefix,
        multiple_choice_answer_len: markup.multiple_choice_answer_len,
        short_answer_len: markup.short_answer_len,
        short_answer_types: markup
            .short_answer_types
            .iter()
            .map(|t| label_key(t))
            .filter(|t| !t.is_empty())
            .collect(),
        sentinels: FieldSentinels {
            question_type: require_sentinel("question_type", &sentinels.question_type)?,
            question_id: require_sentinel("question_id", &sentinels.question_id)?,
            status: require_sentinel("status", &sentinels.status)?,
            chosen_option: require_sentinel("chosen_option", &sentinels.chosen_option)?,
            given_answer: require_sentinel("given_answer", &sentinels.given_answer)?,
        },
    })
}

fn compile_marking(marking: &MarkingDefinition) -> Result<MarkingRules, String> {
    if !marking.correct.is_finite() || marking.correct <= 0.0 {
        return Err(format!("正确得分必须为正数，实际为 {}", marking.correct));
    }
    for (name, value) in [
        ("multiple_choice_penalty", marking.multiple_choice_penalty),
        ("short_answer_penalty", marking.short_answer_penalty),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(format!("{} 必须为非负数（按扣分幅度填写），实际为 {}", name, value));
        }
    }

    let redistribution = match &marking.redistribution {
        Some(r) => {
            if !r.penalty_per_question.is_finite() || r.penalty_per_question < 0.0 {
                return Err(format!(
                    "penalty_per_question 必须为非负数，实际为 {}",
                    r.penalty_per_question
                ));
            }
            Some(Redistribution {
                free_allowance: r.free_allowance,
                penalty_per_question: r.penalty_per_question,
            })
        }
        None => None,
    };

    Ok(MarkingRules {
        correct: marking.correct,
        multiple_choice_penalty: marking.multiple_choice_penalty,
        short_answer_penalty: marking.short_answer_penalty,
        excluded_sections: marking
            .excluded_sections
            .iter()
            .map(|s| label_key(s))
            .filter(|s| !s.is_empty())
            .collect(),
        special_question_ids: marking
            .special_question_ids
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        redistribution,
    })
}

fn compile_percentile(percentile: &PercentileDefinition) -> Result<PercentileSchedule, String> {
    if percentile.lowest_band.trim().is_empty() {
        return Err("lowest_band 不能为空".to_string());
    }
    if percentile.shifts.is_empty() {
        return Err("至少需要一张百分位表".to_string());
    }

    let mut tables: Vec<ShiftTable> = Vec::with_capacity(percentile.shifts.len());
    for table in &percentile.shifts {
        if tables.iter().any(|t| t.shift == table.shift) {
            return Err(format!("场次 {} 重复定义", table.shift));
        }
        if table.bands.is_empty() {
            return Err(format!("场次 {} 的百分位表为空", table.shift));
        }

        let mut bands = Vec::with_capacity(table.bands.len());
        for band in &table.bands {
            if !band.min.is_finite() {
                return Err(format!("场次 {} 存在无效阈值 {}", table.shift, band.min));
            }
            if band.label.trim().is_empty() {
                return Err(format!("场次 {} 存在空的档位名称", table.shift));
            }
            bands.push(PercentileBand {
                min_score: band.min,
                label: band.label.trim().to_string(),
            });
        }
        if bands.windows(2).any(|w| w[0].min_score <= w[1].min_score) {
            return Err(format!("场次 {} 的百分位表必须按阈值从高到低排列", table.shift));
        }

        tables.push(ShiftTable {
            shift: table.shift,
            test_time_keys: table
                .test_time_prefixes
                .iter()
                .map(|p| label_key(p))
                .filter(|p| !p.is_empty())
                .collect(),
            bands,
        });
    }

    if !tables.iter().any(|t| t.shift == percentile.default_shift) {
        return Err(format!("默认场次 {} 没有对应的百分位表", percentile.default_shift));
    }

    Ok(PercentileSchedule {
        shift_field: percentile.shift_field.trim().to_string(),
        default_shift: percentile.default_shift,
        lowest_band: percentile.lowest_band.trim().to_string(),
        tables,
    })
}
