//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个程序的"指挥中心"。
//!
//! ### `batch_processor` - 批量答卷处理器
//! - 管理应用生命周期（加载配置、构建考试配置注册表、创建获取器）
//! - 控制并发数量（Semaphore）
//! - 按参数顺序输出 JSON 结果
//! - 输出全局统计信息
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<DocumentSource>)
//!     ↓
//! workflow::ScoreFlow (处理单份答卷)
//!     ↓
//! services (能力层：extract / classify / mark / resolve)
//!     ↓
//! infrastructure (基础设施：DocumentFetcher)
//! ```
//!
//! 编排层只做调度和统计，不做任何计分判断。

pub mod batch_processor;

pub use batch_processor::{App, ProcessingStats};
