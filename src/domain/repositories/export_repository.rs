// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::product::Product;
use async_trait::async_trait;
use thiserror::Error;

/// 导出列顺序
pub const EXPORT_HEADER: [&str; 6] = [
    "Name",
    "Description",
    "StoreName",
    "Price",
    "Rating",
    "ImageLink",
];

/// 导出错误类型
#[derive(Error, Debug)]
pub enum ExportError {
    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// CSV 编码错误
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// 写入任务已停止
    #[error("Export writer is closed")]
    WriterClosed,
}

/// 导出接收端特质
///
/// 只追加的表格导出。首次写入空目标时先输出表头。
#[async_trait]
pub trait ExportSink: Send + Sync {
    /// 追加商品行
    async fn append_products(&self, products: &[Product]) -> Result<(), ExportError>;
}
