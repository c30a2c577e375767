// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::{BrowserDriver, BrowserSession, SessionError, WaitPolicy};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 预设页面中的一个元素
#[derive(Debug, Clone, Default)]
pub struct ScriptedElement {
    pub text: Option<String>,
    pub attributes: HashMap<String, String>,
}

/// 预设页面
///
/// 选择器到匹配元素列表的映射
#[derive(Debug, Clone, Default)]
pub struct ScriptedPage {
    elements: HashMap<String, Vec<ScriptedElement>>,
}

impl ScriptedPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一个带文本的元素
    pub fn text(mut self, selector: &str, text: &str) -> Self {
        self.elements
            .entry(selector.to_string())
            .or_default()
            .push(ScriptedElement {
                text: Some(text.to_string()),
                attributes: HashMap::new(),
            });
        self
    }

    /// 添加一个带属性的元素
    pub fn attr(mut self, selector: &str, name: &str, value: &str) -> Self {
        let mut attributes = HashMap::new();
        attributes.insert(name.to_string(), value.to_string());
        self.elements
            .entry(selector.to_string())
            .or_default()
            .push(ScriptedElement {
                text: None,
                attributes,
            });
        self
    }

    /// 添加一组链接元素（`href` 属性）
    pub fn links<I, S>(mut self, selector: &str, hrefs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for href in hrefs {
            self = self.attr(selector, "href", href.as_ref());
        }
        self
    }

    fn matches(&self, selector: &str) -> &[ScriptedElement] {
        self.elements
            .get(selector)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[derive(Default)]
struct ScriptState {
    pages: HashMap<String, ScriptedPage>,
    broken: HashSet<String>,
    visited: Vec<String>,
}

#[derive(Default)]
struct Shared {
    state: Mutex<ScriptState>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    open_now: AtomicUsize,
    peak_open: AtomicUsize,
    delay: Mutex<Option<Duration>>,
}

/// 预设脚本驱动的浏览器
///
/// 不启动真实浏览器，按地址返回预设页面。供单元测试和集成测试使用，
/// 同时记录会话的打开/关闭次数和访问过的地址。
#[derive(Clone, Default)]
pub struct ScriptedDriver {
    shared: Arc<Shared>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个页面
    pub fn with_page(self, url: &str, page: ScriptedPage) -> Self {
        self.lock_state().pages.insert(url.to_string(), page);
        self
    }

    /// 让指定地址导航失败
    pub fn with_broken_page(self, url: &str) -> Self {
        self.lock_state().broken.insert(url.to_string());
        self
    }

    /// 每次导航前等待，用于观察并发
    pub fn with_navigation_delay(self, delay: Duration) -> Self {
        *self
            .shared
            .delay
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(delay);
        self
    }

    pub fn opened_sessions(&self) -> usize {
        self.shared.opened.load(Ordering::SeqCst)
    }

    pub fn closed_sessions(&self) -> usize {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// 同时打开的会话数峰值
    pub fn peak_open_sessions(&self) -> usize {
        self.shared.peak_open.load(Ordering::SeqCst)
    }

    /// 按顺序返回所有导航过的地址
    pub fn visited(&self) -> Vec<String> {
        self.lock_state().visited.clone()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ScriptState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl BrowserDriver for ScriptedDriver {
    async fn open_session(&self) -> Result<Box<dyn BrowserSession>, SessionError> {
        self.shared.opened.fetch_add(1, Ordering::SeqCst);
        let now = self.shared.open_now.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.peak_open.fetch_max(now, Ordering::SeqCst);

        Ok(Box::new(ScriptedSession {
            driver: self.clone(),
            current: Mutex::new(None),
        }))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// 预设脚本驱动的会话
pub struct ScriptedSession {
    driver: ScriptedDriver,
    current: Mutex<Option<ScriptedPage>>,
}

impl ScriptedSession {
    fn with_page<T>(
        &self,
        selector: &str,
        f: impl FnOnce(&[ScriptedElement]) -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        let current = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match current.as_ref() {
            Some(page) => f(page.matches(selector)),
            None => Err(SessionError::Query {
                selector: selector.to_string(),
                reason: "no page loaded".to_string(),
            }),
        }
    }

    fn attribute_of(
        element: &ScriptedElement,
        selector: &str,
        attr: &str,
    ) -> Result<String, SessionError> {
        element
            .attributes
            .get(attr)
            .cloned()
            .ok_or_else(|| SessionError::NotFound {
                selector: format!("{}@{}", selector, attr),
            })
    }
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    async fn navigate(&self, url: &str, _wait: WaitPolicy) -> Result<(), SessionError> {
        let delay = *self
            .driver
            .shared
            .delay
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let page = {
            let mut state = self.driver.lock_state();
            state.visited.push(url.to_string());
            if state.broken.contains(url) {
                return Err(SessionError::Navigate {
                    url: url.to_string(),
                    reason: "scripted failure".to_string(),
                });
            }
            // Unknown addresses load as blank pages
            state.pages.get(url).cloned().unwrap_or_default()
        };

        *self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(page);
        Ok(())
    }

    async fn scroll_to_bottom(&self) -> Result<(), SessionError> {
        Ok(())
    }

    async fn wait_for_idle(&self) -> Result<(), SessionError> {
        Ok(())
    }

    async fn locator_text(&self, selector: &str) -> Result<String, SessionError> {
        self.with_page(selector, |found| {
            found
                .first()
                .map(|element| element.text.clone().unwrap_or_default())
                .ok_or_else(|| SessionError::NotFound {
                    selector: selector.to_string(),
                })
        })
    }

    async fn locator_attribute(&self, selector: &str, attr: &str) -> Result<String, SessionError> {
        self.with_page(selector, |found| {
            let element = found.first().ok_or_else(|| SessionError::NotFound {
                selector: selector.to_string(),
            })?;
            Self::attribute_of(element, selector, attr)
        })
    }

    async fn locator_count(&self, selector: &str) -> Result<usize, SessionError> {
        self.with_page(selector, |found| Ok(found.len()))
    }

    async fn nth_attribute(
        &self,
        selector: &str,
        index: usize,
        attr: &str,
    ) -> Result<String, SessionError> {
        self.with_page(selector, |found| {
            let element = found.get(index).ok_or_else(|| SessionError::NotFound {
                selector: format!("{}[{}]", selector, index),
            })?;
            Self::attribute_of(element, selector, attr)
        })
    }

    async fn close(self: Box<Self>) -> Result<(), SessionError> {
        self.driver.shared.closed.fetch_add(1, Ordering::SeqCst);
        self.driver.shared.open_now.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}
