//! 批量答卷处理器 - 编排层
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：构建考试配置注册表（内置 + 外部文件）、创建 HTTP 获取器
//! 2. **并发控制**：使用 Semaphore 限制同时处理的答卷数量
//! 3. **顺序输出**：结果按命令行参数顺序打印为 JSON
//! 4. **全局统计**：汇总成功 / 失败数量
//!
//! 不重试、不缓存，失败只记录并计数。

use anyhow::Result;
use futures::future::join_all;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::infrastructure::{DocumentSource, HttpDocumentFetcher};
use crate::models::{ProfileRegistry, ScoreResult};
use crate::utils::logging;
use crate::workflow::{DocumentCtx, ScoreFlow};

/// 应用主结构
pub struct App {
    config: Config,
    flow: Arc<ScoreFlow>,
}

/// 处理统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingStats {
    pub success: usize,
    pub failed: usize,
    pub total: usize,
}

impl ProcessingStats {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

impl App {
    /// 初始化应用
    ///
    /// 考试配置不合法时在这里直接失败，不会带着错误配置去计分。
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::log_startup(&config);

        let registry = match &config.profiles_file {
            Some(path) => ProfileRegistry::with_profiles_file(Path::new(path)).await?,
            None => ProfileRegistry::builtin()?,
        };
        info!("📚 已加载考试配置: {}", registry.ids().join(", "));

        let fetcher = HttpDocumentFetcher::new(&config)?;
        let flow = ScoreFlow::new(Arc::new(fetcher), Arc::new(registry));

        Ok(Self {
            config,
            flow: Arc::new(flow),
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self, sources: Vec<DocumentSource>) -> Result<ProcessingStats> {
        if sources.is_empty() {
            warn!("⚠️ 没有需要处理的答卷，程序结束");
            return Ok(ProcessingStats::default());
        }

        info!(
            "✓ 共 {} 份答卷，最多同时处理 {} 份",
            sources.len(),
            self.config.max_concurrent_documents
        );

        let results = self.process_all(sources).await;

        let mut stats = ProcessingStats {
            total: results.len(),
            ..Default::default()
        };

        for result in results {
            match result {
                Some(score) => {
                    println!("{}", serde_json::to_string_pretty(&score)?);
                    stats.success += 1;
                }
                None => stats.failed += 1,
            }
        }

        logging::print_final_stats(stats.success, stats.failed, stats.total);

        Ok(stats)
    }

    /// 并发处理所有答卷，返回值与输入顺序一致
    async fn process_all(&self, sources: Vec<DocumentSource>) -> Vec<Option<ScoreResult>> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_documents.max(1)));
        let selector = self.config.exam_profile.clone();

        let handles = sources.into_iter().enumerate().map(|(idx, source)| {
            let ctx = DocumentCtx::new(idx + 1, source);
            let flow = Arc::clone(&self.flow);
            let semaphore = Arc::clone(&semaphore);
            let selector = selector.clone();

            tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    error!("{} ❌ 并发控制已关闭", ctx);
                    return None;
                };

                match flow.run(&ctx, selector.as_deref()).await {
                    Ok(result) => {
                        logging::log_document_scored(&ctx.to_string(), &result);
                        Some(result)
                    }
                    Err(e) => {
                        error!("{} ❌ 处理失败: {}", ctx, e);
                        None
                    }
                }
            })
        });

        join_all(handles)
            .await
            .into_iter()
            .enumerate()
            .map(|(idx, joined)| match joined {
                Ok(result) => result,
                Err(e) => {
                    error!("[答卷 #{}] 任务执行失败: {}", idx + 1, e);
                    None
                }
            })
            .collect()
    }
}
