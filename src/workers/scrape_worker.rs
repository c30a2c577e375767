// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::product::Product;
use crate::domain::models::url::Url;
use crate::domain::repositories::export_repository::ExportSink;
use crate::domain::repositories::product_repository::ProductRepository;
use crate::domain::repositories::url_repository::UrlRepository;
use crate::domain::services::product_extractor::ProductExtractor;
use crate::engines::traits::{BrowserDriver, BrowserSession, SessionError, WaitPolicy};
use crate::infrastructure::metrics::PRODUCTS_SCRAPED_TOTAL;
use crate::utils::errors::UrlError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// 共享的待处理队列
pub type SharedQueue = Arc<Mutex<mpsc::Receiver<Url>>>;

/// 单个链接的处理结果
pub type UrlOutcome = Result<Product, UrlError>;

/// 抓取工作者
///
/// 从共享队列逐个取出链接，为每个链接打开独立的浏览器会话，
/// 依次完成提取、入库、标记和导出。单个链接失败只影响该链接。
#[derive(Clone)]
pub struct ScrapeWorker {
    id: usize,
    driver: Arc<dyn BrowserDriver>,
    extractor: Arc<ProductExtractor>,
    url_repo: Arc<dyn UrlRepository>,
    product_repo: Arc<dyn ProductRepository>,
    sink: Arc<dyn ExportSink>,
    page_timeout: Duration,
}

impl ScrapeWorker {
    /// 创建新的抓取工作者实例
    pub fn new(
        id: usize,
        driver: Arc<dyn BrowserDriver>,
        extractor: Arc<ProductExtractor>,
        url_repo: Arc<dyn UrlRepository>,
        product_repo: Arc<dyn ProductRepository>,
        sink: Arc<dyn ExportSink>,
        page_timeout: Duration,
    ) -> Self {
        Self {
            id,
            driver,
            extractor,
            url_repo,
            product_repo,
            sink,
            page_timeout,
        }
    }

    /// 运行工作者直到队列关闭或收到取消信号
    ///
    /// # 参数
    ///
    /// * `queue` - 所有工作者共享的接收端
    /// * `outcomes` - 按完成顺序上报每个链接的结果
    /// * `cancel` - 取消令牌，正在处理的链接会先完成
    pub async fn run(
        &self,
        queue: SharedQueue,
        outcomes: mpsc::UnboundedSender<UrlOutcome>,
        cancel: CancellationToken,
    ) {
        debug!("Scrape worker {} started", self.id);

        loop {
            let next = {
                let mut receiver = queue.lock().await;
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    url = receiver.recv() => url,
                }
            };
            let Some(url) = next else {
                break;
            };

            let outcome = self.process(url).await;
            if outcomes.send(outcome).is_err() {
                warn!("Outcome collector dropped, worker {} stopping", self.id);
                break;
            }
        }

        debug!("Scrape worker {} stopped", self.id);
    }

    /// 处理单个链接，会话在任何情况下都会被关闭
    #[instrument(skip(self, url), fields(worker = self.id, url_id = %url.id, address = %url.address))]
    pub async fn process(&self, url: Url) -> UrlOutcome {
        let session = self
            .driver
            .open_session()
            .await
            .map_err(|source| UrlError::Session {
                address: url.address.clone(),
                source,
            })?;

        let result = self.scrape(session.as_ref(), &url).await;
        let closed = session.close().await;

        match (result, closed) {
            (Ok(product), Ok(())) => {
                metrics::counter!(PRODUCTS_SCRAPED_TOTAL).increment(1);
                info!(product = %product.name, "Product scraped");
                Ok(product)
            }
            (Ok(_), Err(source)) => Err(UrlError::Session {
                address: url.address,
                source,
            }),
            (Err(e), Err(close_err)) => {
                warn!("Failed to close session after error: {}", close_err);
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
        }
    }

    async fn scrape(&self, session: &dyn BrowserSession, url: &Url) -> UrlOutcome {
        let session_err = |source: SessionError| UrlError::Session {
            address: url.address.clone(),
            source,
        };

        tokio::time::timeout(
            self.page_timeout,
            session.navigate(&url.address, WaitPolicy::Load),
        )
        .await
        .map_err(|_| SessionError::Timeout(self.page_timeout))
        .and_then(|navigated| navigated)
        .map_err(session_err)?;
        session.scroll_to_bottom().await.map_err(session_err)?;
        session.wait_for_idle().await.map_err(session_err)?;

        let new_product =
            self.extractor
                .extract(session)
                .await
                .map_err(|source| UrlError::Extraction {
                    address: url.address.clone(),
                    source,
                })?;

        let product = self
            .product_repo
            .insert(new_product)
            .await
            .map_err(|source| UrlError::Persist {
                address: url.address.clone(),
                source,
            })?;

        self.url_repo
            .mark_scraped(url.id)
            .await
            .map_err(|source| UrlError::MarkScraped {
                address: url.address.clone(),
                source,
            })?;

        self.sink
            .append_products(std::slice::from_ref(&product))
            .await
            .map_err(|source| UrlError::Export {
                address: url.address.clone(),
                source,
            })?;

        Ok(product)
    }
}
