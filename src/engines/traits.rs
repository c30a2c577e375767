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

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// 浏览器会话错误类型
#[derive(Error, Debug)]
pub enum SessionError {
    /// 打开标签页失败
    #[error("Failed to open session: {0}")]
    Open(String),
    /// 导航失败
    #[error("Navigation to {url} failed: {reason}")]
    Navigate { url: String, reason: String },
    /// 滚动或等待页面稳定失败
    #[error("Scroll failed: {0}")]
    Scroll(String),
    /// 定位器未匹配到任何元素
    #[error("Locator not found: {selector}")]
    NotFound { selector: String },
    /// DOM 查询失败
    #[error("Query for {selector} failed: {reason}")]
    Query { selector: String, reason: String },
    /// 关闭标签页失败
    #[error("Failed to close session: {0}")]
    Close(String),
    /// 超时
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

impl SessionError {
    /// 是否为定位器缺失
    pub fn is_not_found(&self) -> bool {
        matches!(self, SessionError::NotFound { .. })
    }
}

/// 导航等待策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitPolicy {
    /// 等待 load 事件
    #[default]
    Load,
    /// 等待 load 事件后再等待网络空闲
    NetworkIdle,
}

/// 浏览器会话特质
///
/// 对应一个独立的标签页，同一时间只加载一个页面
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// 导航到指定地址
    async fn navigate(&self, url: &str, wait: WaitPolicy) -> Result<(), SessionError>;

    /// 滚动到页面底部以触发懒加载
    async fn scroll_to_bottom(&self) -> Result<(), SessionError>;

    /// 等待页面加载状态稳定
    async fn wait_for_idle(&self) -> Result<(), SessionError>;

    /// 读取第一个匹配元素的文本
    async fn locator_text(&self, selector: &str) -> Result<String, SessionError>;

    /// 读取第一个匹配元素的属性
    async fn locator_attribute(&self, selector: &str, attr: &str) -> Result<String, SessionError>;

    /// 统计匹配元素数量
    async fn locator_count(&self, selector: &str) -> Result<usize, SessionError>;

    /// 读取第 `index` 个匹配元素的属性
    async fn nth_attribute(
        &self,
        selector: &str,
        index: usize,
        attr: &str,
    ) -> Result<String, SessionError>;

    /// 关闭标签页
    async fn close(self: Box<Self>) -> Result<(), SessionError>;
}

/// 浏览器驱动特质
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// 打开新的标签页会话
    async fn open_session(&self) -> Result<Box<dyn BrowserSession>, SessionError>;

    /// 驱动名称
    fn name(&self) -> &'static str;
}
