//! # Sheet Score
//!
//! 把考试门户发布的答卷页面（Response Sheet）还原成逐题记录，
//! 按考试规则计分，并给出百分位档位的估算
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（HTTP 客户端），只暴露获取能力
//! - `HttpDocumentFetcher` - 按 URL / 本地路径取回 HTML，限制超时和大小
//!
//! ### ② 模型层（Models）
//! - `models/answer_sheet` - 题目、分区、成绩等纯数据
//! - `models/exam_profile` - 考试配置（结构标记、计分规则、百分位表）
//! - `models/profile_registry` - 内置 + 外部考试配置的注册表
//!
//! ### ③ 业务能力层（Services）
//! - `StructuralExtractor` - 结构提取
//! - `QuestionClassifier` - 逐题判定
//! - `MarkingEngine` - 计分与罚分再分配
//! - `PercentileResolver` - 百分位查询
//!
//! ### ④ 流程层（Workflow）
//! - `DocumentCtx` - 上下文封装（答卷序号 + 来源）
//! - `ScoreFlow` - 流程编排（fetch → extract → classify → mark → resolve）
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量答卷处理器，管理资源和并发
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;
pub mod markup;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{DocumentFetcher, DocumentSource, HttpDocumentFetcher};
pub use models::{ExamProfile, ProfileRegistry, ScoreResult};
pub use orchestrator::{App, ProcessingStats};
pub use workflow::{DocumentCtx, ScoreFlow};
