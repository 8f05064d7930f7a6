use anyhow::Result;
use sheet_score::utils::logging;
use sheet_score::{App, Config, DocumentSource};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    let sources: Vec<DocumentSource> = std::env::args()
        .skip(1)
        .map(|arg| DocumentSource::from(arg.as_str()))
        .collect();

    if sources.is_empty() {
        eprintln!("用法: sheet_score <答卷 URL 或本地路径>...");
        eprintln!("环境变量: EXAM_PROFILE, PROFILES_FILE, MAX_CONCURRENT_DOCUMENTS, FETCH_TIMEOUT_SECS, MAX_DOCUMENT_BYTES, VERBOSE_LOGGING");
        std::process::exit(2);
    }

    // 初始化并运行应用
    let stats = App::initialize(config).await?.run(sources).await?;

    if !stats.all_succeeded() {
        std::process::exit(1);
    }

    Ok(())
}
