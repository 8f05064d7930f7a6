//! 业务能力层（Services）
//!
//! 每个服务只描述"我能做什么"，全部是无 I/O 的纯转换：
//! - `StructuralExtractor` - HTML -> 考生信息 + 原始分区
//! - `QuestionClassifier` - 原始字段 -> 题目判定
//! - `MarkingEngine` - 题目判定 -> 分区统计 + 总分
//! - `PercentileResolver` - 总分 + 场次 -> 百分位档位

pub mod marking_engine;
pub mod percentile_resolver;
pub mod question_classifier;
pub mod structural_extractor;

pub use marking_engine::{MarkingEngine, MarkingSummary};
pub use percentile_resolver::PercentileResolver;
pub use question_classifier::QuestionClassifier;
pub use structural_extractor::StructuralExtractor;
