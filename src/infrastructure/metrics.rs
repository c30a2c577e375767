// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MetricsSettings;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{AddrParseError, SocketAddr};
use tracing::{info, warn};

/// 新发现的链接数
pub const URLS_DISCOVERED_TOTAL: &str = "prodcrawl_urls_discovered_total";
/// 成功抓取的商品数
pub const PRODUCTS_SCRAPED_TOTAL: &str = "prodcrawl_products_scraped_total";
/// 处理失败的链接数
pub const URLS_FAILED_TOTAL: &str = "prodcrawl_urls_failed_total";

/// 安装 Prometheus 导出器
///
/// 未启用时什么也不做。监听地址被占用等安装错误只记录警告，不影响抓取。
pub fn init_metrics(settings: &MetricsSettings) -> Result<(), AddrParseError> {
    if !settings.enabled {
        return Ok(());
    }

    let addr: SocketAddr = settings.listen_addr.parse()?;

    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!(
            "Failed to install Prometheus recorder: {}. This might happen if the port is already in use.",
            e
        );
        return Ok(());
    }

    info!("Metrics exporter listening on {}", addr);
    Ok(())
}
