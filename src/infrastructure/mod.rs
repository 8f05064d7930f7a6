//! 基础设施层
//!
//! 只负责把答卷原文拿到手（HTTP 或本地文件），不认识题目和分数。

pub mod document_fetcher;

pub use document_fetcher::{DocumentFetcher, DocumentSource, HttpDocumentFetcher, RawMarkup};
