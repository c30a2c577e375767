// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::BrowserSettings;
use crate::engines::traits::{BrowserDriver, BrowserSession, SessionError, WaitPolicy};
use async_trait::async_trait;
use chromiumoxide::element::Element;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::future::Future;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// Chromium 浏览器驱动
///
/// 基于chromiumoxide实现。浏览器进程只启动一次，每个会话是一个新的标签页。
pub struct ChromiumDriver {
    settings: BrowserSettings,
    page_timeout: Duration,
    settle_delay: Duration,
    browser: OnceCell<Browser>,
}

impl ChromiumDriver {
    /// 创建新的驱动实例，浏览器在首次打开会话时启动
    ///
    /// # 参数
    ///
    /// * `settings` - 浏览器配置
    /// * `page_timeout` - 单次导航或等待的超时时间
    /// * `settle_delay` - 滚动后等待懒加载的时间
    pub fn new(settings: BrowserSettings, page_timeout: Duration, settle_delay: Duration) -> Self {
        Self {
            settings,
            page_timeout,
            settle_delay,
            browser: OnceCell::new(),
        }
    }

    async fn browser(&self) -> Result<&Browser, SessionError> {
        self.browser
            .get_or_try_init(|| async {
                let (browser, mut handler) = if let Some(url) = &self.settings.remote_debugging_url
                {
                    info!("Connecting to remote Chrome instance at: {}", url);
                    Browser::connect(url).await.map_err(|e| {
                        SessionError::Open(format!("Failed to connect to remote Chrome: {}", e))
                    })?
                } else {
                    let mut builder = BrowserConfig::builder()
                        .no_sandbox()
                        .request_timeout(Duration::from_secs(self.settings.request_timeout_secs))
                        .arg("--disable-gpu")
                        .arg("--disable-dev-shm-usage");
                    if !self.settings.headless {
                        builder = builder.with_head();
                    }
                    let config = builder.build().map_err(SessionError::Open)?;
                    Browser::launch(config)
                        .await
                        .map_err(|e| SessionError::Open(e.to_string()))?
                };

                // Spawn a handler to process browser events
                tokio::spawn(async move {
                    while let Some(event) = handler.next().await {
                        if event.is_err() {
                            break;
                        }
                    }
                });

                info!("Browser ready");
                Ok(browser)
            })
            .await
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn open_session(&self) -> Result<Box<dyn BrowserSession>, SessionError> {
        let browser = self.browser().await?;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| SessionError::Open(e.to_string()))?;

        Ok(Box::new(ChromiumSession {
            page,
            timeout: self.page_timeout,
            settle_delay: self.settle_delay,
        }))
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}

/// 单个标签页会话
pub struct ChromiumSession {
    page: Page,
    timeout: Duration,
    settle_delay: Duration,
}

impl ChromiumSession {
    async fn bounded<T, F>(&self, fut: F) -> Result<T, SessionError>
    where
        F: Future<Output = Result<T, SessionError>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| SessionError::Timeout(self.timeout))?
    }

    async fn elements(&self, selector: &str) -> Result<Vec<Element>, SessionError> {
        self.page
            .find_elements(selector)
            .await
            .map_err(|e| SessionError::Query {
                selector: selector.to_string(),
                reason: e.to_string(),
            })
    }

    async fn first(&self, selector: &str) -> Result<Element, SessionError> {
        self.elements(selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SessionError::NotFound {
                selector: selector.to_string(),
            })
    }

    async fn read_attribute(
        element: &Element,
        selector: &str,
        attr: &str,
    ) -> Result<String, SessionError> {
        element
            .attribute(attr)
            .await
            .map_err(|e| SessionError::Query {
                selector: selector.to_string(),
                reason: e.to_string(),
            })?
            .ok_or_else(|| SessionError::NotFound {
                selector: format!("{}@{}", selector, attr),
            })
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&self, url: &str, wait: WaitPolicy) -> Result<(), SessionError> {
        debug!(url, ?wait, "Navigating");
        // goto waits for the load event
        self.bounded(async {
            self.page
                .goto(url)
                .await
                .map_err(|e| SessionError::Navigate {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;
            Ok(())
        })
        .await?;

        if wait == WaitPolicy::NetworkIdle {
            self.wait_for_idle().await?;
        }
        Ok(())
    }

    async fn scroll_to_bottom(&self) -> Result<(), SessionError> {
        self.bounded(async {
            self.page
                .evaluate(SCROLL_TO_BOTTOM)
                .await
                .map_err(|e| SessionError::Scroll(e.to_string()))?;
            Ok(())
        })
        .await
    }

    async fn wait_for_idle(&self) -> Result<(), SessionError> {
        self.bounded(async {
            self.page
                .wait_for_navigation()
                .await
                .map_err(|e| SessionError::Scroll(e.to_string()))?;
            Ok(())
        })
        .await?;

        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
        Ok(())
    }

    async fn locator_text(&self, selector: &str) -> Result<String, SessionError> {
        self.bounded(async {
            let element = self.first(selector).await?;
            let text = element.inner_text().await.map_err(|e| SessionError::Query {
                selector: selector.to_string(),
                reason: e.to_string(),
            })?;
            Ok(text.unwrap_or_default())
        })
        .await
    }

    async fn locator_attribute(&self, selector: &str, attr: &str) -> Result<String, SessionError> {
        self.bounded(async {
            let element = self.first(selector).await?;
            Self::read_attribute(&element, selector, attr).await
        })
        .await
    }

    async fn locator_count(&self, selector: &str) -> Result<usize, SessionError> {
        self.bounded(async { Ok(self.elements(selector).await?.len()) })
            .await
    }

    async fn nth_attribute(
        &self,
        selector: &str,
        index: usize,
        attr: &str,
    ) -> Result<String, SessionError> {
        self.bounded(async {
            let element = self
                .elements(selector)
                .await?
                .into_iter()
                .nth(index)
                .ok_or_else(|| SessionError::NotFound {
                    selector: format!("{}[{}]", selector, index),
                })?;
            Self::read_attribute(&element, selector, attr).await
        })
        .await
    }

    async fn close(self: Box<Self>) -> Result<(), SessionError> {
        let timeout = self.timeout;
        match tokio::time::timeout(timeout, self.page.close()).await {
            Ok(result) => result.map_err(|e| SessionError::Close(e.to_string())),
            Err(_) => {
                warn!("Closing tab timed out");
                Err(SessionError::Timeout(timeout))
            }
        }
    }
}
