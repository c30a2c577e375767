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

use crate::config::settings::PAGE_PLACEHOLDER;
use crate::domain::models::url::Url;
use crate::domain::repositories::url_repository::{RepositoryError, UrlRepository};
use crate::engines::traits::{BrowserDriver, BrowserSession, SessionError, WaitPolicy};
use crate::infrastructure::metrics::URLS_DISCOVERED_TOTAL;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// 链接发现错误类型
#[derive(Error, Debug)]
pub enum HarvestError {
    /// 目标数量必须大于零
    #[error("Target count must be greater than zero")]
    InvalidTarget,
    /// 浏览器会话错误
    #[error("Browser session error: {0}")]
    Session(#[from] SessionError),
    /// 仓库错误
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
    /// 列表页已耗尽但未达到目标数量
    #[error("Listing exhausted after {pages} page(s): found {found} of {target} link(s)")]
    ListingExhausted {
        pages: u32,
        found: usize,
        target: usize,
    },
    /// 运行被取消
    #[error("Link discovery cancelled")]
    Cancelled,
}

/// 链接发现服务
///
/// 逐页翻阅列表页，收集商品详情链接直到达到目标数量，
/// 然后一次性批量写入仓库。中途失败或取消时不写入任何数据。
pub struct LinkHarvester {
    driver: Arc<dyn BrowserDriver>,
    url_repo: Arc<dyn UrlRepository>,
    listing_template: String,
    link_selector: String,
    max_pages: u32,
}

impl LinkHarvester {
    /// 创建新的链接发现服务实例
    ///
    /// # 参数
    ///
    /// * `driver` - 浏览器驱动
    /// * `url_repo` - 链接仓库
    /// * `listing_template` - 列表页地址模板，包含 `{page}` 占位符
    /// * `link_selector` - 商品链接选择器
    /// * `max_pages` - 最多翻阅的页数
    pub fn new(
        driver: Arc<dyn BrowserDriver>,
        url_repo: Arc<dyn UrlRepository>,
        listing_template: impl Into<String>,
        link_selector: impl Into<String>,
        max_pages: u32,
    ) -> Self {
        Self {
            driver,
            url_repo,
            listing_template: listing_template.into(),
            link_selector: link_selector.into(),
            max_pages,
        }
    }

    /// 生成第 `page` 页的列表地址
    pub fn listing_url(&self, page: u32) -> String {
        self.listing_template
            .replace(PAGE_PLACEHOLDER, &page.to_string())
    }

    /// 发现链接并持久化
    ///
    /// # 参数
    ///
    /// * `target_count` - 需要发现的链接数量
    /// * `cancel` - 取消令牌，每翻一页前检查
    ///
    /// # 返回值
    ///
    /// * `Ok(Vec<Url>)` - 新写入的链接，数量等于 `target_count`
    /// * `Err(HarvestError)` - 发现失败，未写入任何数据
    #[instrument(skip(self, cancel), fields(driver = self.driver.name()))]
    pub async fn discover_links(
        &self,
        target_count: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<Url>, HarvestError> {
        if target_count == 0 {
            return Err(HarvestError::InvalidTarget);
        }

        let session = self.driver.open_session().await?;
        let collected = self.collect(session.as_ref(), target_count, cancel).await;
        if let Err(e) = session.close().await {
            warn!("Failed to close discovery session: {}", e);
        }
        let addresses = collected?;

        let urls = self.url_repo.insert_many(addresses).await?;
        metrics::counter!(URLS_DISCOVERED_TOTAL).increment(urls.len() as u64);
        info!("Discovered {} new product link(s)", urls.len());
        Ok(urls)
    }

    async fn collect(
        &self,
        session: &dyn BrowserSession,
        target_count: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, HarvestError> {
        let mut seen = HashSet::new();
        let mut accumulated = Vec::with_capacity(target_count);

        for page in 1..=self.max_pages {
            if cancel.is_cancelled() {
                info!("Discovery cancelled before page {}", page);
                return Err(HarvestError::Cancelled);
            }

            let listing = self.listing_url(page);
            debug!(page, %listing, "Loading listing page");
            session.navigate(&listing, WaitPolicy::Load).await?;
            session.scroll_to_bottom().await?;
            session.wait_for_idle().await?;

            let count = session.locator_count(&self.link_selector).await?;
            if count == 0 {
                return Err(HarvestError::ListingExhausted {
                    pages: page,
                    found: accumulated.len(),
                    target: target_count,
                });
            }

            let base = url::Url::parse(&listing).ok();
            let mut candidates = Vec::new();
            for index in 0..count {
                let href = match session
                    .nth_attribute(&self.link_selector, index, "href")
                    .await
                {
                    Ok(href) => href,
                    Err(e) => {
                        debug!("Skipping anchor {} on page {}: {}", index, page, e);
                        continue;
                    }
                };
                let Some(address) = resolve_link(base.as_ref(), &href) else {
                    debug!("Skipping unresolvable link {:?}", href);
                    continue;
                };
                if seen.insert(address.clone()) {
                    candidates.push(address);
                }
            }
            if candidates.is_empty() {
                continue;
            }

            let known = self.url_repo.existing_addresses(&candidates).await?;
            for address in candidates {
                if known.contains(&address) {
                    continue;
                }
                accumulated.push(address);
                if accumulated.len() == target_count {
                    debug!("Target reached on page {}", page);
                    return Ok(accumulated);
                }
            }
        }

        Err(HarvestError::ListingExhausted {
            pages: self.max_pages,
            found: accumulated.len(),
            target: target_count,
        })
    }
}

/// 将链接解析为绝对地址，只保留 http/https
pub fn resolve_link(base: Option<&url::Url>, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let resolved = match base {
        Some(base) => base.join(href).ok()?,
        None => url::Url::parse(href).ok()?,
    };
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[path = "link_harvester_test.rs"]
mod tests;
