// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::product::Product;
use crate::domain::repositories::export_repository::{ExportError, ExportSink};
use crate::infrastructure::export::csv_export::CsvExporter;
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

const REQUEST_BUFFER: usize = 64;

struct AppendRequest {
    products: Vec<Product>,
    reply: oneshot::Sender<Result<(), ExportError>>,
}

/// 导出写入任务的句柄
///
/// 导出文件只由一个专用的阻塞线程写入，调用方通过通道提交追加请求并等待结果。
/// 所有句柄被丢弃后写入线程退出。
#[derive(Clone)]
pub struct ExportWriter {
    sender: mpsc::Sender<AppendRequest>,
}

impl ExportWriter {
    /// 启动写入任务
    pub fn spawn(exporter: CsvExporter) -> Self {
        let (sender, mut receiver) = mpsc::channel::<AppendRequest>(REQUEST_BUFFER);

        tokio::task::spawn_blocking(move || {
            debug!("Export writer started for {}", exporter.path().display());
            while let Some(request) = receiver.blocking_recv() {
                let result = exporter.append(&request.products);
                if let Err(e) = &result {
                    error!("Failed to export {} product(s): {}", request.products.len(), e);
                }
                // The caller may have gone away
                let _ = request.reply.send(result);
            }
            debug!("Export writer stopped");
        });

        Self { sender }
    }
}

#[async_trait]
impl ExportSink for ExportWriter {
    async fn append_products(&self, products: &[Product]) -> Result<(), ExportError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(AppendRequest {
                products: products.to_vec(),
                reply,
            })
            .await
            .map_err(|_| ExportError::WriterClosed)?;

        response.await.map_err(|_| ExportError::WriterClosed)?
    }
}
