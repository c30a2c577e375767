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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 列表页模板中的页码占位符
pub const PAGE_PLACEHOLDER: &str = "{page}";

/// 应用程序配置设置
///
/// 包含数据库、浏览器、链接采集、抓取、选择器、导出和指标等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 数据库配置
    pub database: DatabaseSettings,
    /// 浏览器配置
    pub browser: BrowserSettings,
    /// 链接采集配置
    pub harvest: HarvestSettings,
    /// 详情页抓取配置
    pub scraper: ScraperSettings,
    /// 页面选择器配置
    pub selectors: SelectorSettings,
    /// CSV 导出配置
    pub export: ExportSettings,
    /// 指标配置
    pub metrics: MetricsSettings,
}

/// 数据库配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
}

/// 浏览器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserSettings {
    /// 是否以无头模式启动
    pub headless: bool,
    /// 远程 Chrome 调试地址，设置后不再本地启动浏览器
    pub remote_debugging_url: Option<String>,
    /// CDP 请求超时时间（秒）
    pub request_timeout_secs: u64,
}

/// 链接采集配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct HarvestSettings {
    /// 列表页URL模板，必须包含 `{page}`
    pub listing_template: String,
    /// 默认目标链接数
    pub target_count: usize,
    /// 最多访问的列表页数
    pub max_pages: u32,
}

/// 抓取工作池配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperSettings {
    /// 并发工作者数量
    pub workers: usize,
    /// 工作队列容量，缺省为工作者数量的两倍
    pub queue_capacity: Option<usize>,
    /// 单页导航超时时间（秒）
    pub page_timeout_secs: u64,
    /// 滚动到底部后的等待时间（毫秒）
    pub scroll_settle_ms: u64,
}

impl ScraperSettings {
    pub fn effective_queue_capacity(&self) -> usize {
        self.queue_capacity
            .unwrap_or(self.workers.saturating_mul(2))
            .max(1)
    }
}

/// 页面选择器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorSettings {
    pub product_link: String,
    pub title: String,
    pub description: String,
    pub store_name: String,
    pub price: String,
    pub rating: String,
    pub image: String,
}

impl Default for SelectorSettings {
    fn default() -> Self {
        Self {
            product_link: "a[data-testid='lnkProductContainer']".to_string(),
            title: "[data-testid='lblPDPDetailProductName']".to_string(),
            description: "[data-testid='lblPDPDescriptionProduk']".to_string(),
            store_name: "a[data-testid='llbPDPFooterShopName'] h2".to_string(),
            price: "[data-testid='lblPDPDetailProductPrice']".to_string(),
            rating: "[data-testid='lblPDPDetailProductRatingNumber']".to_string(),
            image: "[data-testid='PDPMainImage']".to_string(),
        }
    }
}

/// CSV 导出配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ExportSettings {
    /// 导出文件路径
    pub path: String,
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启动 Prometheus 导出器
    pub enabled: bool,
    /// 导出器监听地址
    pub listen_addr: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次加载内置默认值、`config/default`、`config/{APP_ENVIRONMENT}`
    /// 以及 `PRODCRAWL__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载并校验的配置
    /// * `Err(ConfigError)` - 配置加载或校验失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let selectors = SelectorSettings::default();
        let builder = Config::builder()
            // Default DB settings
            .set_default("database.url", "sqlite://prodcrawl.db?mode=rwc")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            // Default browser settings
            .set_default("browser.headless", true)?
            .set_default("browser.request_timeout_secs", 30)?
            // Default harvest settings
            .set_default(
                "harvest.listing_template",
                "https://www.tokopedia.com/p/handphone-tablet/handphone?ob=23&page={page}",
            )?
            .set_default("harvest.target_count", 100)?
            .set_default("harvest.max_pages", 50)?
            // Default scraper settings
            .set_default("scraper.workers", 4)?
            .set_default("scraper.page_timeout_secs", 30)?
            .set_default("scraper.scroll_settle_ms", 500)?
            // Default selectors
            .set_default("selectors.product_link", selectors.product_link)?
            .set_default("selectors.title", selectors.title)?
            .set_default("selectors.description", selectors.description)?
            .set_default("selectors.store_name", selectors.store_name)?
            .set_default("selectors.price", selectors.price)?
            .set_default("selectors.rating", selectors.rating)?
            .set_default("selectors.image", selectors.image)?
            // Default export settings
            .set_default("export.path", "data.csv")?
            // Default metrics settings
            .set_default("metrics.enabled", false)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("PRODCRAWL").separator("__"));

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// 校验配置的取值范围
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scraper.workers == 0 {
            return Err(ConfigError::Message(
                "scraper.workers must be at least 1".to_string(),
            ));
        }
        if !self.harvest.listing_template.contains(PAGE_PLACEHOLDER) {
            return Err(ConfigError::Message(format!(
                "harvest.listing_template must contain {}",
                PAGE_PLACEHOLDER
            )));
        }
        if self.harvest.max_pages == 0 {
            return Err(ConfigError::Message(
                "harvest.max_pages must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
