// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::ScraperSettings;
use crate::domain::repositories::export_repository::ExportSink;
use crate::domain::repositories::product_repository::ProductRepository;
use crate::domain::repositories::url_repository::UrlRepository;
use crate::domain::services::product_extractor::ProductExtractor;
use crate::engines::traits::BrowserDriver;
use crate::infrastructure::metrics::URLS_FAILED_TOTAL;
use crate::utils::errors::{ScrapeError, UrlError};
use crate::workers::scrape_worker::{ScrapeWorker, UrlOutcome};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// 一次抓取的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrapeSummary {
    /// 开始时未抓取的链接数
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// 因取消而未处理的链接数
    pub cancelled: usize,
}

impl fmt::Display for ScrapeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} total, {} succeeded, {} failed, {} cancelled",
            self.total, self.succeeded, self.failed, self.cancelled
        )
    }
}

/// 抓取工作池
///
/// 单个生产者把所有未抓取的链接送入有界队列，固定数量的工作者共享接收端，
/// 各自逐个处理直到队列耗尽。结果按完成顺序汇总。
pub struct ScrapeWorkerPool {
    driver: Arc<dyn BrowserDriver>,
    extractor: Arc<ProductExtractor>,
    url_repo: Arc<dyn UrlRepository>,
    product_repo: Arc<dyn ProductRepository>,
    sink: Arc<dyn ExportSink>,
    workers: usize,
    queue_capacity: usize,
    page_timeout: Duration,
}

impl ScrapeWorkerPool {
    /// 创建新的工作池
    ///
    /// # 参数
    ///
    /// * `settings` - 工作者数量、队列容量和页面超时
    pub fn new(
        driver: Arc<dyn BrowserDriver>,
        extractor: Arc<ProductExtractor>,
        url_repo: Arc<dyn UrlRepository>,
        product_repo: Arc<dyn ProductRepository>,
        sink: Arc<dyn ExportSink>,
        settings: &ScraperSettings,
    ) -> Self {
        Self {
            driver,
            extractor,
            url_repo,
            product_repo,
            sink,
            workers: settings.workers.max(1),
            queue_capacity: settings.effective_queue_capacity(),
            page_timeout: Duration::from_secs(settings.page_timeout_secs),
        }
    }

    /// 抓取所有未抓取的链接
    ///
    /// 所有链接都尝试过后才返回。任一链接失败时返回 `ScrapeError::Failed`，
    /// 携带第一个失败和失败数量；其他链接的结果不受影响。
    ///
    /// # 参数
    ///
    /// * `cancel` - 取消令牌，停止入队和取新链接，正在处理的链接会完成
    pub async fn scrape_all_pending(
        &self,
        cancel: &CancellationToken,
    ) -> Result<ScrapeSummary, ScrapeError> {
        let pending = self.url_repo.list_unscraped().await?;
        let total = pending.len();
        if total == 0 {
            info!("No pending URLs to scrape");
            return Ok(ScrapeSummary::default());
        }

        info!(
            "Scraping {} pending URL(s) with {} worker(s) using {} driver",
            total,
            self.workers,
            self.driver.name()
        );

        let (sender, receiver) = mpsc::channel(self.queue_capacity);
        let queue = Arc::new(Mutex::new(receiver));
        let (outcome_sender, mut outcome_receiver) = mpsc::unbounded_channel::<UrlOutcome>();

        let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(self.workers);
        for id in 0..self.workers {
            let worker = ScrapeWorker::new(
                id,
                self.driver.clone(),
                self.extractor.clone(),
                self.url_repo.clone(),
                self.product_repo.clone(),
                self.sink.clone(),
                self.page_timeout,
            );
            let queue = queue.clone();
            let outcomes = outcome_sender.clone();
            let cancel = cancel.clone();
            handles.push(tokio::spawn(async move {
                worker.run(queue, outcomes, cancel).await;
            }));
        }
        drop(outcome_sender);
        drop(queue);

        let producer_cancel = cancel.clone();
        let producer = tokio::spawn(async move {
            for url in pending {
                tokio::select! {
                    biased;
                    _ = producer_cancel.cancelled() => break,
                    sent = sender.send(url) => {
                        if sent.is_err() {
                            break;
                        }
                    }
                }
            }
            // Dropping the sender closes the queue
        });

        let mut summary = ScrapeSummary {
            total,
            ..Default::default()
        };
        let mut first_error: Option<UrlError> = None;
        while let Some(outcome) = outcome_receiver.recv().await {
            match outcome {
                Ok(_) => summary.succeeded += 1,
                Err(e) => {
                    metrics::counter!(URLS_FAILED_TOTAL).increment(1);
                    error!(address = e.address(), step = e.step(), "URL failed: {}", e);
                    summary.failed += 1;
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Err(e) = producer.await {
            error!("Queue producer task failed: {}", e);
        }
        for handle in handles {
            if let Err(e) = handle.await {
                error!("Scrape worker task failed: {}", e);
            }
        }

        summary.cancelled = total.saturating_sub(summary.succeeded + summary.failed);
        if summary.cancelled > 0 {
            warn!("{} URL(s) left unscraped after cancellation", summary.cancelled);
        }
        info!("Scrape finished: {}", summary);

        match first_error {
            Some(first) => Err(ScrapeError::Failed {
                failed: summary.failed,
                total,
                first: Box::new(first),
            }),
            None => Ok(summary),
        }
    }
}

#[cfg(test)]
#[path = "manager_test.rs"]
mod tests;
