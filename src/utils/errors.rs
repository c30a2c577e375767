// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::export_repository::ExportError;
use crate::domain::repositories::url_repository::RepositoryError;
use crate::domain::services::product_extractor::ExtractionError;
use crate::engines::traits::SessionError;
use thiserror::Error;

/// 单个链接处理失败
///
/// 记录失败的地址和步骤，已完成的步骤不会回滚。
#[derive(Error, Debug)]
pub enum UrlError {
    /// 打开、导航、滚动或关闭会话失败
    #[error("{address}: browser session failed: {source}")]
    Session {
        address: String,
        #[source]
        source: SessionError,
    },
    /// 商品字段提取失败
    #[error("{address}: extraction failed: {source}")]
    Extraction {
        address: String,
        #[source]
        source: ExtractionError,
    },
    /// 商品写入失败
    #[error("{address}: failed to persist product: {source}")]
    Persist {
        address: String,
        #[source]
        source: RepositoryError,
    },
    /// 标记已抓取失败，商品已写入
    #[error("{address}: failed to mark as scraped: {source}")]
    MarkScraped {
        address: String,
        #[source]
        source: RepositoryError,
    },
    /// 导出失败，商品已写入且链接已标记
    #[error("{address}: failed to export product: {source}")]
    Export {
        address: String,
        #[source]
        source: ExportError,
    },
}

impl UrlError {
    /// 失败的链接地址
    pub fn address(&self) -> &str {
        match self {
            UrlError::Session { address, .. }
            | UrlError::Extraction { address, .. }
            | UrlError::Persist { address, .. }
            | UrlError::MarkScraped { address, .. }
            | UrlError::Export { address, .. } => address,
        }
    }

    /// 失败的步骤名
    pub fn step(&self) -> &'static str {
        match self {
            UrlError::Session { .. } => "session",
            UrlError::Extraction { .. } => "extraction",
            UrlError::Persist { .. } => "persist",
            UrlError::MarkScraped { .. } => "mark_scraped",
            UrlError::Export { .. } => "export",
        }
    }
}

/// 抓取阶段错误
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// 读取待抓取链接失败
    #[error("Failed to list pending URLs: {0}")]
    Pending(#[from] RepositoryError),
    /// 至少一个链接处理失败
    #[error("{failed} of {total} URL(s) failed, first error: {first}")]
    Failed {
        failed: usize,
        total: usize,
        first: Box<UrlError>,
    },
}
