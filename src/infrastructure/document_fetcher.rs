//! 答卷获取 - 基础设施层
//!
//! 持有 HTTP 客户端，只暴露"按来源取回 HTML 原文"的能力

use async_trait::async_trait;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::Config;
use crate::error::{AppResult, FetchError, FetchReason};

/// 答卷来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    Url(String),
    Path(PathBuf),
}

impl DocumentSource {
    /// 用于日志和错误信息的来源描述
    pub fn label(&self) -> String {
        match self {
            DocumentSource::Url(url) => url.clone(),
            DocumentSource::Path(path) => path.display().to_string(),
        }
    }
}

impl From<&str> for DocumentSource {
    /// http/https 开头的按 URL 处理，其余按本地路径处理
    fn from(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            DocumentSource::Url(trimmed.to_string())
        } else {
            DocumentSource::Path(PathBuf::from(trimmed))
        }
    }
}

impl Display for DocumentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

/// 取回的答卷原文
#[derive(Debug, Clone)]
pub struct RawMarkup {
    pub source: DocumentSource,
    pub html: String,
    pub bytes: usize,
}

/// 答卷获取能力
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, source: &DocumentSource) -> Result<RawMarkup, FetchError>;
}

/// 基于 reqwest / tokio::fs 的答卷获取
///
/// 职责：
/// - 持有唯一的 HTTP 客户端
/// - 限制超时和文档大小
/// - 不解析文档内容
pub struct HttpDocumentFetcher {
    client: reqwest::Client,
    timeout: Duration,
    max_bytes: usize,
}

impl HttpDocumentFetcher {
    /// 根据配置创建获取器
    pub fn new(config: &Config) -> AppResult<Self> {
        let timeout = Duration::from_secs(config.fetch_timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| FetchError::new("HTTP 客户端", FetchReason::NetworkError).with_detail(e))?;

        Ok(Self {
            client,
            timeout,
            max_bytes: config.max_document_bytes,
        })
    }

    async fn fetch_url(&self, url: &str) -> Result<String, FetchError> {
        let classify = |e: reqwest::Error| {
            let reason = if e.is_timeout() {
                FetchReason::Timeout
            } else {
                FetchReason::NetworkError
            };
            FetchError::new(url, reason).with_detail(e)
        };

        let mut response = self.client.get(url).send().await.map_err(classify)?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::new(url, FetchReason::NotFound));
        }
        if !status.is_success() {
            return Err(FetchError::new(url, FetchReason::NetworkError)
                .with_detail(format!("HTTP {}", status)));
        }

        if let Some(declared) = response.content_length() {
            if declared > self.max_bytes as u64 {
                return Err(self.too_large(url, declared));
            }
        }

        // 服务端可能不声明长度，边读边检查
        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(classify)? {
            body.extend_from_slice(&chunk);
            if body.len() > self.max_bytes {
                return Err(self.too_large(url, body.len() as u64));
            }
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    async fn fetch_path(&self, path: &Path) -> Result<String, FetchError> {
        let label = path.display().to_string();
        let io_error = |e: std::io::Error| {
            let reason = if e.kind() == std::io::ErrorKind::NotFound {
                FetchReason::NotFound
            } else {
                FetchReason::Io
            };
            FetchError::new(label.as_str(), reason).with_detail(e)
        };

        // 设备文件、管道的 metadata 长度为 0，只作快速检查，真正的上限在读取时保证
        let read = async {
            let metadata = fs::metadata(path).await.map_err(io_error)?;
            if metadata.len() > self.max_bytes as u64 {
                return Err(self.too_large(&label, metadata.len()));
            }
            let file = fs::File::open(path).await.map_err(io_error)?;
            let bytes = self.read_bounded(file, &label).await?;
            Ok::<_, FetchError>(String::from_utf8_lossy(&bytes).into_owned())
        };

        match tokio::time::timeout(self.timeout, read).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::new(label.as_str(), FetchReason::Timeout)),
        }
    }

    /// 最多读取 `max_bytes + 1` 字节，多出来的那一个字节说明超限
    async fn read_bounded<R>(&self, reader: R, label: &str) -> Result<Vec<u8>, FetchError>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = Vec::new();
        reader
            .take(self.max_bytes as u64 + 1)
            .read_to_end(&mut buf)
            .await
            .map_err(|e| FetchError::new(label, FetchReason::Io).with_detail(e))?;

        if buf.len() > self.max_bytes {
            return Err(self.too_large(label, buf.len() as u64));
        }
        Ok(buf)
    }

    fn too_large(&self, label: &str, actual: u64) -> FetchError {
        FetchError::new(label, FetchReason::TooLarge { limit: self.max_bytes })
            .with_detail(format!("实际至少 {} 字节", actual))
    }
}

#[async_trait]
impl DocumentFetcher for HttpDocumentFetcher {
    async fn fetch(&self, source: &DocumentSource) -> Result<RawMarkup, FetchError> {
        let html = match source {
            DocumentSource::Url(url) => self.fetch_url(url).await?,
            DocumentSource::Path(path) => self.fetch_path(path).await?,
        };

        tracing::debug!("📥 已获取 {} ({} 字节)", source, html.len());

        Ok(RawMarkup {
            source: source.clone(),
            bytes: html.len(),
            html,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fetcher_with_limit(max_document_bytes: usize) -> HttpDocumentFetcher {
        let config = Config {
            max_document_bytes,
            ..Config::default()
        };
        HttpDocumentFetcher::new(&config).unwrap()
    }

    fn fetcher_with_timeout(max_document_bytes: usize, fetch_timeout_secs: u64) -> HttpDocumentFetcher {
        let config = Config {
            max_document_bytes,
            fetch_timeout_secs,
            ..Config::default()
        };
        HttpDocumentFetcher::new(&config).unwrap()
    }

    /// 本地起一个只应答一次的 HTTP 服务，返回它的 URL
    async fn serve_once(response: Vec<u8>, delay: Duration) -> String {
        use tokio::io::AsyncWriteExt;
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let mut request = [0u8; 1024];
            let _ = stream.read(&mut request).await;
            tokio::time::sleep(delay).await;
            let _ = stream.write_all(&response).await;
            let _ = stream.shutdown().await;
        });

        format!("http://{}/sheet.html", addr)
    }

    fn http_response(status_line: &str, headers: &str, body: &str) -> Vec<u8> {
        format!(
            "HTTP/1.1 {}\r\n{}Connection: close\r\n\r\n{}",
            status_line, headers, body
        )
        .into_bytes()
    }

    #[test]
    fn test_source_from_str() {
        assert_eq!(
            DocumentSource::from(" https://cdn.example.com/sheet.html "),
            DocumentSource::Url("https://cdn.example.com/sheet.html".to_string())
        );
        assert_eq!(
            DocumentSource::from("sheets/a.html"),
            DocumentSource::Path(PathBuf::from("sheets/a.html"))
        );
    }

    #[tokio::test]
    async fn test_fetch_local_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<html><body>ok</body></html>").unwrap();

        let source = DocumentSource::Path(file.path().to_path_buf());
        let raw = fetcher_with_limit(1024).fetch(&source).await.unwrap();
        assert_eq!(raw.html, "<html><body>ok</body></html>");
        assert_eq!(raw.bytes, raw.html.len());
    }

    #[tokio::test]
    async fn test_fetch_missing_file() {
        let source = DocumentSource::from("/definitely/not/a/sheet.html");
        let err = fetcher_with_limit(1024).fetch(&source).await.unwrap_err();
        assert_eq!(err.reason, FetchReason::NotFound);
    }

    #[tokio::test]
    async fn test_fetch_rejects_oversized_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", "x".repeat(64)).unwrap();

        let source = DocumentSource::Path(file.path().to_path_buf());
        let err = fetcher_with_limit(16).fetch(&source).await.unwrap_err();
        assert_eq!(err.reason, FetchReason::TooLarge { limit: 16 });
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_fetch_device_file_stops_at_limit() {
        // /dev/zero 的 metadata 长度为 0，只能靠读取上限拦住
        let source = DocumentSource::from("/dev/zero");
        let err = fetcher_with_timeout(16, 5).fetch(&source).await.unwrap_err();
        assert_eq!(err.reason, FetchReason::TooLarge { limit: 16 });
    }

    #[tokio::test]
    async fn test_read_bounded_rejects_stream_past_limit() {
        let fetcher = fetcher_with_limit(16);
        let long = vec![b'x'; 64];
        let err = fetcher.read_bounded(long.as_slice(), "stream").await.unwrap_err();
        assert_eq!(err.reason, FetchReason::TooLarge { limit: 16 });

        let exact = vec![b'x'; 16];
        let bytes = fetcher.read_bounded(exact.as_slice(), "stream").await.unwrap();
        assert_eq!(bytes.len(), 16);
    }

    #[tokio::test]
    async fn test_fetch_url_ok() {
        let url = serve_once(
            http_response("200 OK", "Content-Length: 5\r\n", "hello"),
            Duration::ZERO,
        )
        .await;
        let raw = fetcher_with_limit(1024)
            .fetch(&DocumentSource::from(url.as_str()))
            .await
            .unwrap();
        assert_eq!(raw.html, "hello");
        assert_eq!(raw.source, DocumentSource::Url(url));
    }

    #[tokio::test]
    async fn test_fetch_url_not_found() {
        let url = serve_once(
            http_response("404 Not Found", "Content-Length: 0\r\n", ""),
            Duration::ZERO,
        )
        .await;
        let err = fetcher_with_limit(1024)
            .fetch(&DocumentSource::from(url.as_str()))
            .await
            .unwrap_err();
        assert_eq!(err.reason, FetchReason::NotFound);
    }

    #[tokio::test]
    async fn test_fetch_url_server_error() {
        let url = serve_once(
            http_response("500 Internal Server Error", "Content-Length: 0\r\n", ""),
            Duration::ZERO,
        )
        .await;
        let err = fetcher_with_limit(1024)
            .fetch(&DocumentSource::from(url.as_str()))
            .await
            .unwrap_err();
        assert_eq!(err.reason, FetchReason::NetworkError);
    }

    #[tokio::test]
    async fn test_fetch_url_declared_length_too_large() {
        let body = "x".repeat(64);
        let url = serve_once(
            http_response("200 OK", "Content-Length: 64\r\n", &body),
            Duration::ZERO,
        )
        .await;
        let err = fetcher_with_limit(16)
            .fetch(&DocumentSource::from(url.as_str()))
            .await
            .unwrap_err();
        assert_eq!(err.reason, FetchReason::TooLarge { limit: 16 });
    }

    #[tokio::test]
    async fn test_fetch_url_streamed_body_too_large() {
        // 不声明长度，只能边读边检查
        let body = "x".repeat(64);
        let url = serve_once(http_response("200 OK", "", &body), Duration::ZERO).await;
        let err = fetcher_with_limit(16)
            .fetch(&DocumentSource::from(url.as_str()))
            .await
            .unwrap_err();
        assert_eq!(err.reason, FetchReason::TooLarge { limit: 16 });
    }

    #[tokio::test]
    async fn test_fetch_url_timeout() {
        let url = serve_once(
            http_response("200 OK", "Content-Length: 2\r\n", "ok"),
            Duration::from_secs(3),
        )
        .await;
        let err = fetcher_with_timeout(1024, 1)
            .fetch(&DocumentSource::from(url.as_str()))
            .await
            .unwrap_err();
        assert_eq!(err.reason, FetchReason::Timeout);
    }
}
